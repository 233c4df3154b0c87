//! Node cloud of an RVE mesh.
//!
//! The homogenization core never needs element connectivity: face pairing,
//! retained-node lookup and the domain extents only read node coordinates.

use std::collections::HashMap;

use rve_io::Deck;
use rve_model::{Axis, MeshExtents, Node};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::solver::{FaceNode, MeshQuery};

/// Nodes of a mesh in input order, with an id index
#[derive(Debug, Clone, Default)]
pub struct NodeCloud {
    nodes: Vec<Node>,
    index: HashMap<i32, usize>,
}

impl NodeCloud {
    /// Build a cloud; duplicate node ids are rejected
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut duplicates = Vec::new();
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id, position).is_some() {
                duplicates.push(node.id);
            }
        }
        if !duplicates.is_empty() {
            return Err(CoreError::Mesh(format!("duplicate node ids: {duplicates:?}")));
        }
        Ok(Self { nodes, index })
    }

    /// Build from the `*NODE` cards of a deck.
    ///
    /// Every malformed row is reported together rather than stopping at the
    /// first one.
    pub fn from_deck(deck: &Deck) -> Result<Self> {
        let (nodes, errors) = deck.node_records();
        if !errors.is_empty() {
            let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(CoreError::Mesh(format!(
                "{} malformed node rows:\n{}",
                errors.len(),
                lines.join("\n")
            )));
        }
        let cloud = Self::from_nodes(nodes)?;
        debug!(nodes = cloud.len(), "built node cloud from deck");
        Ok(cloud)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a node by ID
    pub fn get(&self, id: i32) -> Option<&Node> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    /// Bounds of the node coordinates
    pub fn extents(&self) -> Result<MeshExtents> {
        if self.nodes.is_empty() {
            return Err(CoreError::Mesh("mesh has no nodes".to_string()));
        }
        let mut bounds = [[f64::INFINITY, f64::NEG_INFINITY]; 3];
        for node in &self.nodes {
            for (bound, value) in bounds.iter_mut().zip(node.coords()) {
                bound[0] = bound[0].min(value);
                bound[1] = bound[1].max(value);
            }
        }
        Ok(MeshExtents::new(bounds)?)
    }

    /// Nodes with `|coord[axis] - coordinate| <= tolerance`
    pub fn select_face(&self, axis: Axis, coordinate: f64, tolerance: f64) -> Vec<FaceNode> {
        self.nodes
            .iter()
            .filter(|node| (node.coord(axis) - coordinate).abs() <= tolerance)
            .map(|node| FaceNode::new(node.id, node.coords()))
            .collect()
    }

    /// Nearest node to `point`; ties go to the lowest id
    pub fn closest_node(&self, point: [f64; 3]) -> Option<i32> {
        self.nodes
            .iter()
            .map(|node| {
                let distance: f64 = node
                    .coords()
                    .iter()
                    .zip(point)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (distance, node.id)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}

impl MeshQuery for NodeCloud {
    fn extents(&self) -> Result<MeshExtents> {
        NodeCloud::extents(self)
    }

    fn select_face_nodes(&self, axis: Axis, coordinate: f64, tolerance: f64) -> Result<Vec<FaceNode>> {
        Ok(self.select_face(axis, coordinate, tolerance))
    }

    fn node_at(&self, point: [f64; 3]) -> Result<i32> {
        self.closest_node(point)
            .ok_or_else(|| CoreError::Mesh("mesh has no nodes".to_string()))
    }
}
