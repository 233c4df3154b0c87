//! Matching of nodes on opposite faces of the RVE.
//!
//! Nodes on the maximum and minimum face of an axis are paired by their two
//! transverse coordinates. Coordinates are cleaned first (rounded to a fixed
//! number of significant figures, near-zero values snapped to zero) so that
//! mesh-generation jitter does not break the match.

use std::cmp::Ordering;

use rve_model::{Axis, MeshExtents, NodePair};
use tracing::{debug, error, info, warn};

use crate::config::HomogenizationConfig;
use crate::error::{CoreError, Result};
use crate::solver::{FaceNode, MeshQuery};

/// Round to `sig_figs` significant figures, ties to even.
///
/// Zero and non-finite values are returned unchanged.
pub fn round_to_sig_figs(value: f64, sig_figs: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let exponent = f64::from(sig_figs) - 1.0 - value.abs().log10().floor();
    let scale = 10f64.powf(exponent);
    (value * scale).round_ties_even() / scale
}

/// Pairs nodes across opposite faces
#[derive(Debug, Clone, Copy, Default)]
pub struct FacePairResolver {
    config: HomogenizationConfig,
}

impl FacePairResolver {
    pub fn new(config: HomogenizationConfig) -> Self {
        Self { config }
    }

    /// Round, then snap values with magnitude at or below the zero epsilon
    pub fn clean(&self, value: f64) -> f64 {
        let rounded = round_to_sig_figs(value, self.config.sig_figs);
        if rounded.abs() > self.config.zero_epsilon {
            rounded
        } else {
            0.0
        }
    }

    fn transverse(&self, axis: Axis, node: &FaceNode) -> [f64; 2] {
        axis.transverse().map(|t| self.clean(node.coord[t.index()]))
    }

    /// Cleaned transverse coordinates and ids, sorted lexicographically by
    /// (first transverse, second transverse, id)
    fn sorted_face(&self, axis: Axis, nodes: &[FaceNode]) -> Vec<([f64; 2], i32)> {
        let mut face: Vec<([f64; 2], i32)> = nodes
            .iter()
            .map(|node| (self.transverse(axis, node), node.id))
            .collect();
        face.sort_by(|a, b| {
            a.0[0]
                .total_cmp(&b.0[0])
                .then_with(|| a.0[1].total_cmp(&b.0[1]))
                .then_with(|| a.1.cmp(&b.1))
        });
        face
    }

    /// Pair the nodes of the positive (maximum) and negative (minimum) faces
    /// of `axis`.
    ///
    /// `tolerance` is the selection tolerance the faces were collected with;
    /// it is only reported in diagnostics. Pairs are returned in sorted
    /// coordinate order, so the result does not depend on input order.
    pub fn resolve(
        &self,
        axis: Axis,
        positive: &[FaceNode],
        negative: &[FaceNode],
        tolerance: f64,
    ) -> Result<Vec<NodePair>> {
        debug!(
            %axis,
            positive = positive.len(),
            negative = negative.len(),
            tolerance,
            "resolving face pairs"
        );

        if positive.len() != negative.len() {
            let detail = format!(
                "different number of nodes selected on opposite faces (tolerance {tolerance:e}): {} on +{axis}, {} on -{axis}",
                positive.len(),
                negative.len()
            );
            error!(%axis, "{detail}");
            return Err(CoreError::GeometryMismatch { axis, detail });
        }

        let pos = self.sorted_face(axis, positive);
        let neg = self.sorted_face(axis, negative);

        if let Some(detail) = describe_mismatch(axis, &pos, &neg) {
            error!(%axis, "{detail}");
            return Err(CoreError::GeometryMismatch { axis, detail });
        }

        if pos.is_empty() {
            warn!(%axis, "no nodes selected on either face");
        }

        Ok(pos
            .iter()
            .zip(&neg)
            .map(|(p, n)| NodePair::new(p.1, n.1))
            .collect())
    }
}

/// `None` when both sorted faces carry identical coordinates; otherwise a
/// description of the largest discrepancy
fn describe_mismatch(axis: Axis, pos: &[([f64; 2], i32)], neg: &[([f64; 2], i32)]) -> Option<String> {
    let mut mismatched = 0usize;
    let mut worst: Option<(f64, usize)> = None;
    for (index, (p, n)) in pos.iter().zip(neg).enumerate() {
        if p.0 == n.0 {
            continue;
        }
        mismatched += 1;
        let discrepancy = (p.0[0] - n.0[0]).abs().max((p.0[1] - n.0[1]).abs());
        let discrepancy = if discrepancy.is_nan() { f64::INFINITY } else { discrepancy };
        if worst.is_none_or(|(d, _)| discrepancy.partial_cmp(&d) == Some(Ordering::Greater)) {
            worst = Some((discrepancy, index));
        }
    }

    let (max, index) = worst?;
    let [t0, t1] = axis.transverse();
    let (p, n) = (&pos[index], &neg[index]);
    Some(format!(
        "{mismatched} of {} sorted node pairs disagree; max discrepancy {max:e} between node {} ({t0}={}, {t1}={}) on +{axis} and node {} ({t0}={}, {t1}={}) on -{axis}",
        pos.len(),
        p.1,
        p.0[0],
        p.0[1],
        n.1,
        n.0[0],
        n.0[1],
    ))
}

/// Pair every opposite-face node set of the mesh, one collection per axis.
///
/// The tolerance of each axis is its edge length times the configured
/// multiplier.
pub fn find_node_pairs<M: MeshQuery + ?Sized>(
    mesh: &M,
    extents: &MeshExtents,
    config: &HomogenizationConfig,
) -> Result<[Vec<NodePair>; 3]> {
    let resolver = FacePairResolver::new(*config);
    let tolerances = extents.tolerances(config.tolerance_multiplier);
    let mut pair_sets: [Vec<NodePair>; 3] = Default::default();

    for axis in Axis::ALL {
        let tolerance = tolerances[axis.index()];
        let positive = mesh.select_face_nodes(axis, extents.max(axis), tolerance)?;
        let negative = mesh.select_face_nodes(axis, extents.min(axis), tolerance)?;
        pair_sets[axis.index()] = resolver.resolve(axis, &positive, &negative, tolerance)?;
    }

    info!(
        x = pair_sets[0].len(),
        y = pair_sets[1].len(),
        z = pair_sets[2].len(),
        "resolved opposite-face node pairs"
    );
    Ok(pair_sets)
}
