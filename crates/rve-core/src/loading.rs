//! Conversion of loading specifications into deformation tensors, and of
//! tensors into prescribed displacements.

use rve_model::{
    DeformationTensor, DirectionCode, DirectionSpec, DisplacementBc, Dof, LoadingSpec,
    RetainedNodeSet, TensorSpec,
};
use tracing::debug;

use crate::error::Result;
use crate::solver::ConstraintSink;

/// Builds one deformation tensor per load case
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingTensorBuilder;

impl LoadingTensorBuilder {
    /// Tensors for every load case, in input order.
    ///
    /// `edge_lengths` converts direction-spec displacement magnitudes into
    /// gradient coefficients; tensor specs ignore it.
    pub fn build(spec: &LoadingSpec, edge_lengths: [f64; 3]) -> Vec<DeformationTensor> {
        let tensors = match spec {
            LoadingSpec::Direction(spec) => Self::from_directions(spec, edge_lengths),
            LoadingSpec::Tensor(spec) => Self::from_tensors(spec),
        };
        debug!(kind = spec.kind(), load_cases = tensors.len(), "built loading tensors");
        tensors
    }

    pub fn from_directions(spec: &DirectionSpec, edge_lengths: [f64; 3]) -> Vec<DeformationTensor> {
        spec.directions
            .iter()
            .map(|code| {
                Self::direction_tensor(code, spec.normal_magnitude, spec.shear_magnitude, edge_lengths)
            })
            .collect()
    }

    pub fn from_tensors(spec: &TensorSpec) -> Vec<DeformationTensor> {
        spec.tensors
            .iter()
            .map(|tensor| tensor.scaled(spec.magnitude_multiplier))
            .collect()
    }

    /// Tensor of a single direction code.
    ///
    /// The selected entry is `sign * magnitude / edge_lengths[row]`; every other
    /// entry is zero, except that a normal direction frees the two lateral
    /// normal components.
    pub fn direction_tensor(
        code: &DirectionCode,
        normal_magnitude: f64,
        shear_magnitude: f64,
        edge_lengths: [f64; 3],
    ) -> DeformationTensor {
        let (i, j) = (code.row, code.col);
        let magnitude = if code.is_normal() {
            normal_magnitude
        } else {
            shear_magnitude
        } / edge_lengths[i];

        let mut tensor = DeformationTensor::zeros();
        tensor.set(i, j, Some(code.sign() * magnitude));
        if code.is_normal() {
            tensor.set((i + 1) % 3, (i + 1) % 3, None);
            tensor.set((i + 2) % 3, (i + 2) % 3, None);
        }
        tensor
    }
}

/// Prescribed displacements realising a tensor on the retained nodes.
///
/// N0 is fixed in all three DOFs. Each non-null `tensor[row][col]` moves
/// retained node `row + 1` along `col` by `tensor[row][col] * edge_lengths[row]`.
pub fn displacement_conditions(
    tensor: &DeformationTensor,
    retained: &RetainedNodeSet,
    edge_lengths: [f64; 3],
) -> Vec<DisplacementBc> {
    let mut bcs = DisplacementBc::fixed(retained.reference()).to_vec();
    for (row, entries) in tensor.rows().iter().enumerate() {
        let node = retained.as_array()[row + 1];
        for (dof, entry) in Dof::ALL.into_iter().zip(entries) {
            if let Some(value) = entry {
                bcs.push(DisplacementBc::new(node, dof, value * edge_lengths[row]));
            }
        }
    }
    bcs
}

/// Clear the previous load case and apply this tensor's displacements
pub fn apply_tensor<S: ConstraintSink + ?Sized>(
    sink: &mut S,
    tensor: &DeformationTensor,
    retained: &RetainedNodeSet,
    edge_lengths: [f64; 3],
) -> Result<()> {
    sink.clear_displacements()?;
    for bc in displacement_conditions(tensor, retained, edge_lengths) {
        sink.apply_displacement(bc)?;
    }
    Ok(())
}
