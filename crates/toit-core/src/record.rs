//! Persisted node record shape
//!
//! A mind map is stored as a flat list of [`NodeRecord`]s. Branches are not
//! stored separately: they are rebuilt from each record's `connections`.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::graph::SceneGraph;
use crate::node::{NodeId, SceneNode};

/// Position as stored on disk / sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for RecordPosition {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<RecordPosition> for Vec3 {
    fn from(p: RecordPosition) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Snapshot of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub position: RecordPosition,
    #[serde(default)]
    pub connections: Vec<NodeId>,
}

impl From<&SceneNode> for NodeRecord {
    fn from(node: &SceneNode) -> Self {
        Self {
            id: node.id(),
            title: node.title.clone(),
            description: node.description.clone(),
            position: node.position().into(),
            connections: node.connections().iter().copied().collect(),
        }
    }
}

impl SceneGraph {
    /// Snapshot every node, in insertion order.
    ///
    /// The result owns its data, so it can be handed to a store without
    /// holding references into the live graph.
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.nodes().map(NodeRecord::from).collect()
    }

    /// Build a graph from records.
    pub fn from_records(records: &[NodeRecord]) -> Self {
        let mut graph = Self::new();
        graph.load_records(records);
        graph
    }

    /// Replace the contents of this graph with `records`.
    ///
    /// One node is created per record (later duplicates of an id are ignored)
    /// and one branch per connected unordered pair. Connections that point at
    /// unknown ids or at the node itself are dropped with a warning.
    pub fn load_records(&mut self, records: &[NodeRecord]) {
        self.clear();

        for record in records {
            let node = SceneNode::with_id(record.id, record.title.clone(), record.position.into())
                .with_description(record.description.clone());
            if !self.add_node(node) {
                tracing::warn!("Duplicate node record {}, keeping the first", record.id);
            }
        }

        let mut linked: HashSet<(NodeId, NodeId)> = HashSet::new();
        for record in records {
            for &other in &record.connections {
                if other == record.id || !self.contains(other) {
                    tracing::warn!("Dropping dangling connection {} -> {}", record.id, other);
                    continue;
                }
                let pair = if record.id < other {
                    (record.id, other)
                } else {
                    (other, record.id)
                };
                if linked.insert(pair)
                    && let Err(e) = self.connect(pair.0, pair.1)
                {
                    tracing::warn!("Failed to restore branch {} -> {}: {}", pair.0, pair.1, e);
                }
            }
        }

        tracing::info!(
            "Loaded {} nodes and {} branches from records",
            self.len(),
            self.branches().len()
        );
    }
}
