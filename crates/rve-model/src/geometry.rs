//! Geometric entities of a rectangular-prism RVE.
//!
//! This module provides:
//! - Axis and translational DOF enumerations
//! - Mesh nodes and the domain's axis-aligned extents
//! - The four retained nodes anchoring the periodic constraints
//! - Node pairs on opposite faces

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Principal axis of the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// 0-based index of the axis
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The two remaining axes once this one is removed, in ascending order
    pub fn transverse(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Translational degree of freedom of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dof {
    Ux,
    Uy,
    Uz,
}

impl Dof {
    pub const ALL: [Dof; 3] = [Dof::Ux, Dof::Uy, Dof::Uz];

    /// 0-based index (0 = X, 1 = Y, 2 = Z)
    pub fn index(self) -> usize {
        match self {
            Dof::Ux => 0,
            Dof::Uy => 1,
            Dof::Uz => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// DOF number as used on CalculiX/Abaqus cards (1-based)
    pub fn ccx_number(self) -> usize {
        self.index() + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Dof::Ux => "UX",
            Dof::Uy => "UY",
            Dof::Uz => "UZ",
        }
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A node in the RVE mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node ID as numbered by the mesh source
    pub id: i32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Node {
    pub fn new(id: i32, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// Get coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Coordinate along one axis
    pub fn coord(&self, axis: Axis) -> f64 {
        self.coords()[axis.index()]
    }
}

/// Axis-ordered `[min, max]` bounds of the rectangular-prism domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshExtents {
    bounds: [[f64; 2]; 3],
}

impl MeshExtents {
    /// Create extents, rejecting inverted or non-finite bounds
    pub fn new(bounds: [[f64; 2]; 3]) -> Result<Self> {
        for (axis, [min, max]) in Axis::ALL.iter().zip(bounds.iter()) {
            if !min.is_finite() || !max.is_finite() {
                return Err(ModelError::InvalidGeometry(format!(
                    "non-finite extents along {axis}: [{min}, {max}]"
                )));
            }
            if min > max {
                return Err(ModelError::InvalidGeometry(format!(
                    "inverted extents along {axis}: [{min}, {max}]"
                )));
            }
        }
        Ok(Self { bounds })
    }

    pub fn bounds(&self) -> [[f64; 2]; 3] {
        self.bounds
    }

    pub fn min(&self, axis: Axis) -> f64 {
        self.bounds[axis.index()][0]
    }

    pub fn max(&self, axis: Axis) -> f64 {
        self.bounds[axis.index()][1]
    }

    pub fn edge_length(&self, axis: Axis) -> f64 {
        self.max(axis) - self.min(axis)
    }

    /// Side lengths of the domain along X, Y, Z
    pub fn edge_lengths(&self) -> [f64; 3] {
        Axis::ALL.map(|axis| self.edge_length(axis))
    }

    /// Per-axis face selection tolerances, proportional to the edge length
    pub fn tolerances(&self, multiplier: f64) -> [f64; 3] {
        self.edge_lengths().map(|length| length * multiplier)
    }

    /// Volume of the bounding prism
    pub fn volume(&self) -> f64 {
        self.edge_lengths().iter().product()
    }

    /// Target locations of the retained nodes, ordered [N0, N1, N2, N3].
    ///
    /// N0 is the minimum corner; N1/N2/N3 sit one edge length away from N0
    /// along X/Y/Z respectively.
    pub fn retained_locations(&self) -> [[f64; 3]; 4] {
        let origin = Axis::ALL.map(|axis| self.min(axis));
        let mut locations = [origin; 4];
        for axis in Axis::ALL {
            locations[axis.index() + 1][axis.index()] = self.max(axis);
        }
        locations
    }
}

/// The four retained nodes, ordered [N0, N1, N2, N3]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct RetainedNodeSet([i32; 4]);

impl RetainedNodeSet {
    pub fn new(nodes: [i32; 4]) -> Result<Self> {
        for (i, node) in nodes.iter().enumerate() {
            if nodes[..i].contains(node) {
                return Err(ModelError::InvalidGeometry(format!(
                    "retained node {node} appears more than once in {nodes:?}"
                )));
            }
        }
        Ok(Self(nodes))
    }

    /// N0, the reference corner
    pub fn reference(&self) -> i32 {
        self.0[0]
    }

    /// The retained node one edge length from N0 along `axis`
    pub fn along(&self, axis: Axis) -> i32 {
        self.0[axis.index() + 1]
    }

    pub fn as_array(&self) -> [i32; 4] {
        self.0
    }

    pub fn contains(&self, node: i32) -> bool {
        self.0.contains(&node)
    }
}

impl TryFrom<[i32; 4]> for RetainedNodeSet {
    type Error = ModelError;

    fn try_from(nodes: [i32; 4]) -> Result<Self> {
        Self::new(nodes)
    }
}

impl From<RetainedNodeSet> for [i32; 4] {
    fn from(set: RetainedNodeSet) -> Self {
        set.0
    }
}

/// Two nodes occupying corresponding positions on opposite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePair {
    /// Node on the maximum-coordinate face
    pub positive: i32,
    /// Node on the minimum-coordinate face
    pub negative: i32,
}

impl NodePair {
    pub fn new(positive: i32, negative: i32) -> Self {
        Self { positive, negative }
    }

    pub fn contains(&self, node: i32) -> bool {
        self.positive == node || self.negative == node
    }
}
