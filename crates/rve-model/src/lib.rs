//! Typed data model for RVE homogenization test cases.
//!
//! This crate provides:
//! - **Geometry**: axes, DOFs, nodes, domain extents, retained nodes, node pairs
//! - **Loading**: direction codes, deformation tensors, validated loading blocks
//! - **Properties**: effective property sets and report labels
//! - **Constraints**: constraint equations and prescribed displacements
//! - **Test cases**: JSON-backed input with parameter checks
//! - **Reports**: the table of requested properties per load case

pub mod constraints;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod nodal;
pub mod properties;
pub mod report;
pub mod test_case;

pub use constraints::{
    ConstraintEquation, ConstraintSet, ConstraintStatistics, ConstraintTerm, DisplacementBc, DofId,
};
pub use error::{ModelError, Result};
pub use geometry::{Axis, Dof, MeshExtents, Node, NodePair, RetainedNodeSet};
pub use loading::{
    DeformationTensor, DirectionCode, DirectionSpec, Loading, LoadingSpec, RawLoading, TensorSpec,
};
pub use nodal::{CapturedLoadCase, NodalResult};
pub use properties::{
    ALL_SENTINEL, AVAILABLE_PROPERTIES, IMPOSSIBLE_PROPERTIES, OFF_DIAGONAL_PAIRS, PropertyKind,
    PropertyLabel, PropertySet, off_diagonal_index,
};
pub use report::{Cell, ColumnKey, LABEL_ROW, ReportTable};
pub use test_case::{Material, MaterialType, MeshSpec, RunnerOptions, TestCase};
