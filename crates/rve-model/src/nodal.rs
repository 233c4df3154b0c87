//! Post-solve nodal data of the retained nodes.

use serde::{Deserialize, Serialize};

/// Coordinate, displacement and reaction force of one retained node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodalResult {
    pub coord: [f64; 3],
    #[serde(alias = "disp")]
    pub displacement: [f64; 3],
    #[serde(alias = "force")]
    pub reaction_force: [f64; 3],
}

impl NodalResult {
    pub fn new(coord: [f64; 3], displacement: [f64; 3], reaction_force: [f64; 3]) -> Self {
        Self {
            coord,
            displacement,
            reaction_force,
        }
    }
}

/// Retained-node results of one solved load case, ordered [N0, N1, N2, N3]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedLoadCase {
    /// Load case number (1-based)
    pub load_case: usize,
    pub nodes: [NodalResult; 4],
    /// Volume of the meshed domain
    pub volume: f64,
}
