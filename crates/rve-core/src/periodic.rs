//! Retained nodes and periodic constraint equations.

use rve_model::{
    Axis, ConstraintEquation, ConstraintTerm, Dof, MeshExtents, NodePair, RetainedNodeSet,
};
use tracing::{debug, info};

use crate::config::HomogenizationConfig;
use crate::error::Result;
use crate::solver::{ConstraintSink, MeshQuery};

/// Locate N0..N3 as the nodes closest to the retained locations of the
/// extents
pub fn identify_retained_nodes<M: MeshQuery + ?Sized>(
    mesh: &M,
    extents: &MeshExtents,
) -> Result<RetainedNodeSet> {
    let locations = extents.retained_locations();
    let mut ids = [0i32; 4];
    for (id, location) in ids.iter_mut().zip(locations) {
        *id = mesh.node_at(location)?;
    }
    let retained = RetainedNodeSet::new(ids)?;
    debug!(retained = ?retained.as_array(), "identified retained nodes");
    Ok(retained)
}

/// Periodicity equations for every node pair.
///
/// For the pairs of axis `i` and each DOF `d`:
/// `u(pos, d) - u(neg, d) - u(N_{i+1}, d) + u(N0, d) = 0`, the last term only
/// when `anchor_reference_node` is set. Pairs containing N0 are skipped.
/// Equations come out in axis, pair, DOF order.
pub fn periodic_equations(
    pairs: &[Vec<NodePair>; 3],
    retained: &RetainedNodeSet,
    config: &HomogenizationConfig,
) -> Vec<ConstraintEquation> {
    let reference = retained.reference();
    let mut equations = Vec::new();

    for axis in Axis::ALL {
        let anchor = retained.along(axis);
        for pair in pairs[axis.index()].iter().filter(|p| !p.contains(reference)) {
            for dof in Dof::ALL {
                let mut terms = vec![
                    ConstraintTerm::new(pair.positive, dof, 1.0),
                    ConstraintTerm::new(pair.negative, dof, -1.0),
                    ConstraintTerm::new(anchor, dof, -1.0),
                ];
                if config.anchor_reference_node {
                    terms.push(ConstraintTerm::new(reference, dof, 1.0));
                }
                equations.push(ConstraintEquation::new(terms));
            }
        }
    }
    equations
}

/// Build the periodic equations and hand them to the sink; returns how many
/// were applied
pub fn apply_periodic_conditions<S: ConstraintSink + ?Sized>(
    sink: &mut S,
    pairs: &[Vec<NodePair>; 3],
    retained: &RetainedNodeSet,
    config: &HomogenizationConfig,
) -> Result<usize> {
    let equations = periodic_equations(pairs, retained, config);
    for equation in &equations {
        sink.add_constraint(equation)?;
    }
    info!(equations = equations.len(), "applied periodic constraint equations");
    Ok(equations.len())
}
