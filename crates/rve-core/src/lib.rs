//! Periodic boundary conditions and homogenization of representative volume
//! elements.
//!
//! The crate is solver-agnostic: a [`SolverCollaborator`] owns the mesh and
//! performs each solve, while this crate pairs the RVE faces, generates the
//! constraint equations and prescribed displacements, derives effective
//! elastic properties from the retained nodes, and compiles the report.

pub mod config;
pub mod deck_sink;
pub mod error;
pub mod face_pairs;
pub mod homogenize;
pub mod loading;
pub mod mesh;
pub mod periodic;
pub mod results;
pub mod runner;
pub mod solver;

pub use config::HomogenizationConfig;
pub use deck_sink::{InpDeckSink, generate_deck};
pub use error::{CoreError, Result};
pub use face_pairs::{FacePairResolver, find_node_pairs, round_to_sig_figs};
pub use homogenize::{
    DebugRecord, HomogenizedCase, Homogenizer, MacroTensors, compute_macro_tensors,
    compute_properties,
};
pub use loading::{LoadingTensorBuilder, apply_tensor, displacement_conditions};
pub use mesh::NodeCloud;
pub use periodic::{apply_periodic_conditions, identify_retained_nodes, periodic_equations};
pub use results::ResultsCompiler;
pub use runner::{CompiledResults, TestRunner};
pub use solver::{ConstraintSink, FaceNode, MeshQuery, SolveOutput, SolverCollaborator};
