//! Solver collaborator trait definitions.
//!
//! These traits abstract over the finite-element engine that owns the mesh,
//! enforces constraints and solves each load case. The homogenization core
//! only talks to the engine through them.

use rve_model::{Axis, ConstraintEquation, DisplacementBc, MeshExtents, NodalResult, RetainedNodeSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A node selected on a face: its id and full coordinate vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceNode {
    pub id: i32,
    pub coord: [f64; 3],
}

impl FaceNode {
    pub fn new(id: i32, coord: [f64; 3]) -> Self {
        Self { id, coord }
    }
}

/// Results of one solved load case at the retained nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOutput {
    /// Ordered [N0, N1, N2, N3]
    pub nodes: [NodalResult; 4],
    /// Volume of the meshed domain
    pub volume: f64,
}

/// Geometric queries against the engine's mesh.
pub trait MeshQuery {
    /// Axis-aligned bounds of the whole mesh
    fn extents(&self) -> Result<MeshExtents>;

    /// Nodes whose coordinate along `axis` lies within `tolerance` of
    /// `coordinate`
    fn select_face_nodes(&self, axis: Axis, coordinate: f64, tolerance: f64) -> Result<Vec<FaceNode>>;

    /// Id of the node at, or closest to, `point`
    fn node_at(&self, point: [f64; 3]) -> Result<i32>;
}

/// Receiver of constraint equations and prescribed displacements.
pub trait ConstraintSink {
    /// Register a constraint equation (kept across load cases); a sink may
    /// drop equations implied by the ones it already holds
    fn add_constraint(&mut self, equation: &ConstraintEquation) -> Result<()>;

    /// Prescribe a displacement for the active load case
    fn apply_displacement(&mut self, bc: DisplacementBc) -> Result<()>;

    /// Drop every prescribed displacement before the next load case
    fn clear_displacements(&mut self) -> Result<()>;
}

/// Complete engine: mesh access, constraints, and solving.
pub trait SolverCollaborator: MeshQuery + ConstraintSink {
    /// Solve the active load case and report the retained nodes' coordinates,
    /// displacements and reaction forces
    fn solve_and_extract(&mut self, retained: &RetainedNodeSet) -> Result<SolveOutput>;

    /// Human-readable name of this engine
    fn name(&self) -> &str {
        "solver"
    }
}
