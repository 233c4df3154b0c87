//! Constraint equations and prescribed displacements.
//!
//! This module handles:
//! - Linear multi-point constraints (*EQUATION)
//! - Prescribed nodal displacements (*BOUNDARY)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Dof;

/// Degree of freedom index (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DofId {
    /// Node ID
    pub node: i32,
    /// DOF index (0 = X, 1 = Y, 2 = Z)
    pub dof: usize,
}

impl DofId {
    /// Create a new DOF identifier
    pub fn new(node: i32, dof: usize) -> Self {
        Self { node, dof }
    }
}

/// One `coefficient * u(node, dof)` term of a constraint equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintTerm {
    pub node: i32,
    pub dof: Dof,
    pub coefficient: f64,
}

impl ConstraintTerm {
    pub fn new(node: i32, dof: Dof, coefficient: f64) -> Self {
        Self {
            node,
            dof,
            coefficient,
        }
    }

    pub fn dof_id(&self) -> DofId {
        DofId::new(self.node, self.dof.index())
    }
}

/// Homogeneous linear constraint: the sum of all terms equals zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEquation {
    pub terms: Vec<ConstraintTerm>,
}

impl ConstraintEquation {
    pub fn new(terms: Vec<ConstraintTerm>) -> Self {
        Self { terms }
    }

    /// Evaluate the left-hand side for a given displacement field
    pub fn residual(&self, displacement: impl Fn(DofId) -> f64) -> f64 {
        self.terms
            .iter()
            .map(|term| term.coefficient * displacement(term.dof_id()))
            .sum()
    }
}

/// A prescribed displacement on one nodal DOF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplacementBc {
    /// Node ID
    pub node: i32,
    pub dof: Dof,
    /// Prescribed displacement value (0.0 for fixed)
    pub value: f64,
}

impl DisplacementBc {
    /// Create a new displacement boundary condition
    pub fn new(node: i32, dof: Dof, value: f64) -> Self {
        Self { node, dof, value }
    }

    /// Fix all three translational DOFs of a node
    pub fn fixed(node: i32) -> [Self; 3] {
        Dof::ALL.map(|dof| Self::new(node, dof, 0.0))
    }

    pub fn dof_id(&self) -> DofId {
        DofId::new(self.node, self.dof.index())
    }
}

/// Constraint equations shared by every load case plus the prescribed
/// displacements of the active load case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// All constraint equations
    pub equations: Vec<ConstraintEquation>,
    /// All displacement boundary conditions
    pub displacement_bcs: Vec<DisplacementBc>,
}

impl ConstraintSet {
    /// Create an empty constraint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint equation
    pub fn add_equation(&mut self, equation: ConstraintEquation) {
        self.equations.push(equation);
    }

    /// Add a displacement boundary condition
    pub fn add_displacement_bc(&mut self, bc: DisplacementBc) {
        self.displacement_bcs.push(bc);
    }

    /// Remove every prescribed displacement, keeping the equations
    pub fn clear_displacements(&mut self) {
        self.displacement_bcs.clear();
    }

    /// Get all prescribed DOFs as a map (DOF -> value); later entries win
    pub fn prescribed_dofs(&self) -> HashMap<DofId, f64> {
        self.displacement_bcs
            .iter()
            .map(|bc| (bc.dof_id(), bc.value))
            .collect()
    }

    /// Get statistics
    pub fn statistics(&self) -> ConstraintStatistics {
        ConstraintStatistics {
            num_equations: self.equations.len(),
            num_terms: self.equations.iter().map(|eq| eq.terms.len()).sum(),
            num_displacement_bcs: self.displacement_bcs.len(),
            num_prescribed_dofs: self.prescribed_dofs().len(),
        }
    }
}

/// Constraint statistics
#[derive(Debug, Clone)]
pub struct ConstraintStatistics {
    /// Number of constraint equations
    pub num_equations: usize,
    /// Total number of terms across all equations
    pub num_terms: usize,
    /// Number of displacement BC entries
    pub num_displacement_bcs: usize,
    /// Number of distinct prescribed DOFs
    pub num_prescribed_dofs: usize,
}

impl ConstraintStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Constraints: {} equations ({} terms), {} displacement entries ({} DOFs)",
            self.num_equations, self.num_terms, self.num_displacement_bcs, self.num_prescribed_dofs
        )
    }
}
