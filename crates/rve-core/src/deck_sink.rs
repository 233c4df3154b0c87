//! Constraint sink that writes CalculiX input cards instead of talking to a
//! live solver.
//!
//! CalculiX treats the first term of an `*EQUATION` as its dependent DOF and
//! accepts each DOF as dependent at most once. Nodes on the edges and corners
//! of the positive faces appear in the pairs of several axes, so incoming
//! equations are reduced against the dependents already chosen: redundant
//! ones are dropped and the rest lead with a DOF that is still free.

use std::collections::BTreeMap;

use rve_io::{RETAINED_NSET, render_equations, render_nset, render_static_step};
use rve_model::{
    ConstraintEquation, ConstraintSet, ConstraintTerm, DisplacementBc, Dof, DofId, Loading,
    RetainedNodeSet,
};
use tracing::{debug, info, trace};

use crate::config::HomogenizationConfig;
use crate::error::{CoreError, Result};
use crate::face_pairs::find_node_pairs;
use crate::loading::{LoadingTensorBuilder, apply_tensor};
use crate::periodic::{apply_periodic_conditions, identify_retained_nodes};
use crate::solver::{ConstraintSink, MeshQuery};

/// Coefficients below this are treated as cancelled during reduction
const CANCELLATION_TOLERANCE: f64 = 1e-9;

/// Accumulates `*EQUATION` cards and one static step per load case
#[derive(Debug, Clone, Default)]
pub struct InpDeckSink {
    constraints: ConstraintSet,
    retained: Option<RetainedNodeSet>,
    steps: Vec<(String, Vec<DisplacementBc>)>,
    /// Dependent DOF -> its value in terms of DOFs free when it was chosen
    dependents: BTreeMap<DofId, Vec<(DofId, f64)>>,
    redundant: usize,
}

impl InpDeckSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the retained nodes so the deck can define their node set
    pub fn set_retained(&mut self, retained: RetainedNodeSet) {
        self.retained = Some(retained);
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Equations dropped because earlier ones already implied them
    pub fn redundant_count(&self) -> usize {
        self.redundant
    }

    fn is_retained(&self, node: i32) -> bool {
        self.retained.is_some_and(|retained| retained.contains(node))
    }

    /// Express `terms` over DOFs that are not dependent, summing repeated
    /// DOFs and dropping cancelled ones
    fn reduce(&self, terms: &[ConstraintTerm]) -> BTreeMap<DofId, f64> {
        let mut reduced = BTreeMap::new();
        let mut pending: Vec<(DofId, f64)> =
            terms.iter().map(|t| (t.dof_id(), t.coefficient)).collect();
        while let Some((id, coefficient)) = pending.pop() {
            match self.dependents.get(&id) {
                Some(expression) => pending.extend(
                    expression.iter().map(|&(other, factor)| (other, coefficient * factor)),
                ),
                None => *reduced.entry(id).or_insert(0.0) += coefficient,
            }
        }
        reduced.retain(|_, coefficient: &mut f64| coefficient.abs() > CANCELLATION_TOLERANCE);
        reduced
    }

    /// Close the active load case as a step titled `title`
    pub fn finish_step(&mut self, title: impl Into<String>) {
        let bcs = self.constraints.displacement_bcs.clone();
        self.steps.push((title.into(), bcs));
    }

    /// Deck text: retained node set, equations, then the steps in order
    pub fn render(&self) -> String {
        let mut out = String::from("** Periodic boundary conditions for RVE homogenization\n");
        if let Some(retained) = &self.retained {
            out.push_str(&render_nset(RETAINED_NSET, &retained.as_array()));
        }
        out.push_str(&format!("** {} constraint equations\n", self.constraints.equations.len()));
        out.push_str(&render_equations(&self.constraints.equations));
        for (title, bcs) in &self.steps {
            out.push_str(&render_static_step(title, bcs));
        }
        out
    }
}

impl ConstraintSink for InpDeckSink {
    fn add_constraint(&mut self, equation: &ConstraintEquation) -> Result<()> {
        let reduced = self.reduce(&equation.terms);
        if reduced.is_empty() {
            self.redundant += 1;
            trace!(terms = equation.terms.len(), "dropped redundant equation");
            return Ok(());
        }

        // Keep the equation as given when one of its own terms can lead.
        let leading = equation
            .terms
            .iter()
            .position(|t| reduced.contains_key(&t.dof_id()) && !self.is_retained(t.node));
        let (dependent, written) = match leading {
            Some(position) => {
                let mut terms = equation.terms.clone();
                terms[..=position].rotate_right(1);
                (terms[0].dof_id(), ConstraintEquation::new(terms))
            }
            None => {
                let Some(&dependent) = reduced.keys().find(|id| !self.is_retained(id.node)) else {
                    return Err(CoreError::Mesh(format!(
                        "periodic equation only ties retained nodes: {:?}",
                        reduced.keys().map(|id| id.node).collect::<Vec<_>>()
                    )));
                };
                let mut terms = Vec::with_capacity(reduced.len());
                for (&id, &coefficient) in std::iter::once((&dependent, &reduced[&dependent]))
                    .chain(reduced.iter().filter(|(id, _)| **id != dependent))
                {
                    let dof = Dof::from_index(id.dof).ok_or_else(|| {
                        CoreError::Mesh(format!("DOF index {} out of range", id.dof))
                    })?;
                    terms.push(ConstraintTerm::new(id.node, dof, coefficient));
                }
                (dependent, ConstraintEquation::new(terms))
            }
        };

        let pivot = reduced[&dependent];
        let expression = reduced
            .iter()
            .filter(|(id, _)| **id != dependent)
            .map(|(&id, &coefficient)| (id, -coefficient / pivot))
            .collect();
        self.dependents.insert(dependent, expression);
        self.constraints.add_equation(written);
        Ok(())
    }

    fn apply_displacement(&mut self, bc: DisplacementBc) -> Result<()> {
        self.constraints.add_displacement_bc(bc);
        Ok(())
    }

    fn clear_displacements(&mut self) -> Result<()> {
        self.constraints.clear_displacements();
        Ok(())
    }
}

/// Generate the periodic constraints and every load-case step of `loading`
/// for `mesh`
pub fn generate_deck<M: MeshQuery + ?Sized>(
    mesh: &M,
    loading: &Loading,
    config: &HomogenizationConfig,
) -> Result<InpDeckSink> {
    let extents = mesh.extents()?;
    let retained = identify_retained_nodes(mesh, &extents)?;
    let pairs = find_node_pairs(mesh, &extents, config)?;

    let mut sink = InpDeckSink::new();
    sink.set_retained(retained);
    apply_periodic_conditions(&mut sink, &pairs, &retained, config)?;

    let edge_lengths = extents.edge_lengths();
    let tensors = LoadingTensorBuilder::build(&loading.spec, edge_lengths);
    for (index, tensor) in tensors.iter().enumerate() {
        apply_tensor(&mut sink, tensor, &retained, edge_lengths)?;
        let title = match loading.labels.as_ref().and_then(|labels| labels.get(index)) {
            Some(label) => format!("Load case {}: {label}", index + 1),
            None => format!("Load case {}", index + 1),
        };
        debug!(load_case = index + 1, bcs = sink.constraints.displacement_bcs.len(), "wrote step");
        sink.finish_step(title);
    }

    info!(
        statistics = %sink.constraints.statistics().format(),
        redundant = sink.redundant_count(),
        steps = sink.step_count(),
        "generated periodic deck"
    );
    Ok(sink)
}
