//! Scene graph: node arena, branches and selection
//!
//! The graph is the single owner of every [`SceneNode`]. Parent/child links and
//! branch endpoints are [`NodeId`] handles into it, so removing a node can never
//! leave a dangling strong reference behind.

mod hierarchy;
mod layout;

pub use layout::{DEFAULT_LAYOUT_RADIUS, LAYOUT_SLOTS, layout_position};

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::branch::Branch;
use crate::error::{SceneError, SceneResult};
use crate::node::{GeometryHandle, NodeId, SceneNode};

/// How [`SceneGraph::connect`] treats a pair that is already connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BranchPolicy {
    /// Append another branch for the same pair (logged as a warning)
    #[default]
    AllowDuplicates,
    /// Keep a single branch per unordered pair
    Dedupe,
}

/// Owns the nodes of a mind map and the branches between them.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    /// Insertion order, for deterministic iteration
    order: Vec<NodeId>,
    branches: Vec<Branch>,
    selected: Option<NodeId>,
    branch_policy: BranchPolicy,
    layout_radius: f32,
}

impl SceneGraph {
    /// Creates an empty graph with default policy and layout radius.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            branches: Vec::new(),
            selected: None,
            branch_policy: BranchPolicy::default(),
            layout_radius: DEFAULT_LAYOUT_RADIUS,
        }
    }

    pub fn with_branch_policy(mut self, policy: BranchPolicy) -> Self {
        self.branch_policy = policy;
        self
    }

    pub fn with_layout_radius(mut self, radius: f32) -> Self {
        self.layout_radius = radius;
        self
    }

    pub fn branch_policy(&self) -> BranchPolicy {
        self.branch_policy
    }

    pub fn set_branch_policy(&mut self, policy: BranchPolicy) {
        self.branch_policy = policy;
    }

    pub fn layout_radius(&self) -> f32 {
        self.layout_radius
    }

    pub fn set_layout_radius(&mut self, radius: f32) {
        self.layout_radius = radius;
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Looks up a node, failing with [`SceneError::NotFound`] if absent.
    pub fn node(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes.get(&id).ok_or(SceneError::NotFound(id))
    }

    /// Looks up a node without treating absence as an error.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(&id).ok_or(SceneError::NotFound(id))
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Inserts a node. A node whose id is already present is ignored.
    ///
    /// Returns `true` if the node was inserted. Hierarchy links and connections
    /// carried by the incoming node are dropped; use
    /// [`attach_child`](Self::attach_child) and [`connect`](Self::connect).
    pub fn add_node(&mut self, mut node: SceneNode) -> bool {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            tracing::debug!("Node {} already in scene, ignoring insert", id);
            return false;
        }

        node.parent = None;
        node.children.clear();
        node.connections.clear();
        if node.is_selected() {
            node.deselect();
        }
        node.set_world_matrix(None);

        self.nodes.insert(id, node);
        self.order.push(id);
        tracing::debug!("Added node {} to scene. Total nodes: {}", id, self.order.len());
        true
    }

    /// Creates a node at [`next_layout_position`](Self::next_layout_position).
    pub fn create_node(&mut self, title: impl Into<String>) -> NodeId {
        let node = SceneNode::new(self.next_layout_position()).with_title(title);
        let id = node.id();
        self.add_node(node);
        id
    }

    /// Removes a node and every branch touching it.
    ///
    /// Children of the removed node become roots. Removing an absent id is a
    /// no-op returning `None`.
    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        if !self.nodes.contains_key(&id) {
            return None;
        }

        if let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent)
            && let Some(parent) = self.nodes.get_mut(&parent)
        {
            parent.children.retain(|c| *c != id);
        }

        let mut node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);

        for child in std::mem::take(&mut node.children) {
            if let Some(child_node) = self.nodes.get_mut(&child) {
                child_node.parent = None;
            }
            self.propagate_from(child);
        }
        node.parent = None;

        let before = self.branches.len();
        self.branches.retain(|b| !b.is_connected_to(id));
        let pruned = before - self.branches.len();

        for other in &node.connections {
            if let Some(other) = self.nodes.get_mut(other) {
                other.connections.remove(&id);
                other.mark_dirty();
            }
        }

        if self.selected == Some(id) {
            self.selected = None;
        }
        node.deselect();

        tracing::debug!(
            "Removed node {} ({} branches pruned). Remaining nodes: {}",
            id,
            pruned,
            self.order.len()
        );
        Some(node)
    }

    /// Removes every node and branch.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.branches.clear();
        self.selected = None;
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        node.title = title.into();
        node.mark_dirty();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        id: NodeId,
        description: impl Into<String>,
    ) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        node.description = description.into();
        node.mark_dirty();
        Ok(())
    }

    pub fn set_geometry(
        &mut self,
        id: NodeId,
        geometry: Option<GeometryHandle>,
    ) -> SceneResult<()> {
        self.node_mut(id)?.set_geometry(geometry);
        Ok(())
    }

    /// Clears the sync flag on every node (after a successful save).
    pub fn mark_all_synced(&mut self) {
        for node in self.nodes.values_mut() {
            node.mark_synced();
        }
    }

    // ---- branches ----

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Branches that have `id` as an endpoint.
    pub fn branches_of(&self, id: NodeId) -> impl Iterator<Item = &Branch> {
        self.branches.iter().filter(move |b| b.is_connected_to(id))
    }

    /// Links `a` and `b` with a branch and records the connection on both nodes.
    ///
    /// Self-connection is rejected. With [`BranchPolicy::AllowDuplicates`] an
    /// already connected pair gets another branch; with [`BranchPolicy::Dedupe`]
    /// the existing branch is returned.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> SceneResult<Branch> {
        if a == b {
            return Err(SceneError::invalid(format!("cannot connect node {a} to itself")));
        }
        self.node(a)?;
        self.node(b)?;

        if let Some(existing) = self.branches.iter().find(|br| br.joins(a, b)).copied() {
            match self.branch_policy {
                BranchPolicy::Dedupe => return Ok(existing),
                BranchPolicy::AllowDuplicates => {
                    tracing::warn!("Adding duplicate branch between {} and {}", a, b);
                }
            }
        }

        let branch = Branch::new(a, b);
        self.branches.push(branch);
        for (this, other) in [(a, b), (b, a)] {
            let node = self.node_mut(this)?;
            node.connections.insert(other);
            node.mark_dirty();
        }

        tracing::debug!("Added branch {} -> {}. Total branches: {}", a, b, self.branches.len());
        Ok(branch)
    }

    /// Removes every branch between `a` and `b` and the matching connections.
    ///
    /// Returns the number of branches removed.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> usize {
        let before = self.branches.len();
        self.branches.retain(|br| !br.joins(a, b));
        let removed = before - self.branches.len();

        for (this, other) in [(a, b), (b, a)] {
            if let Some(node) = self.nodes.get_mut(&this)
                && node.connections.remove(&other)
            {
                node.mark_dirty();
            }
        }
        removed
    }

    /// World positions of both endpoints of every branch, for rebuilding
    /// connecting geometry.
    pub fn branch_endpoints(&self) -> Vec<(Branch, Vec3, Vec3)> {
        self.branches
            .iter()
            .filter_map(|b| {
                let start = self.nodes.get(&b.start)?.world_position();
                let end = self.nodes.get(&b.end)?.world_position();
                Some((*b, start, end))
            })
            .collect()
    }

    // ---- selection ----

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Selects `id`, deselecting the previously selected node.
    ///
    /// Returns `false` when `id` was already the selection.
    pub fn select(&mut self, id: NodeId) -> SceneResult<bool> {
        self.node(id)?;
        if self.selected == Some(id) {
            return Ok(false);
        }

        if let Some(prev) = self.selected.take()
            && let Some(prev) = self.nodes.get_mut(&prev)
        {
            prev.deselect();
        }
        self.node_mut(id)?.select();
        self.selected = Some(id);
        Ok(true)
    }

    /// Clears the current selection. Returns `false` if nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        match self.selected.take() {
            Some(prev) => {
                if let Some(node) = self.nodes.get_mut(&prev) {
                    node.deselect();
                }
                true
            }
            None => false,
        }
    }

    /// Position for the next automatically placed node.
    pub fn next_layout_position(&self) -> Vec3 {
        layout_position(self.len(), self.layout_radius)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: usize) -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let ids = (0..n).map(|i| graph.create_node(format!("node {i}"))).collect();
        (graph, ids)
    }

    #[test]
    fn test_add_node_set_semantics() {
        let mut graph = SceneGraph::new();
        let node = SceneNode::new(Vec3::ZERO);
        let id = node.id();

        assert!(graph.add_node(node.clone()));
        assert!(!graph.add_node(node));
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(id));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut graph, _) = graph_with(2);
        assert!(graph.remove_node(NodeId::new()).is_none());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let graph = SceneGraph::new();
        let id = NodeId::new();
        assert_eq!(graph.node(id).unwrap_err(), SceneError::NotFound(id));
    }

    #[test]
    fn test_connect_rejects_self() {
        let (mut graph, ids) = graph_with(1);
        assert!(matches!(
            graph.connect(ids[0], ids[0]),
            Err(SceneError::InvalidArgument(_))
        ));
        assert!(graph.branches().is_empty());
    }

    #[test]
    fn test_connect_missing_node() {
        let (mut graph, ids) = graph_with(1);
        let ghost = NodeId::new();
        assert_eq!(graph.connect(ids[0], ghost).unwrap_err(), SceneError::NotFound(ghost));
    }

    #[test]
    fn test_connect_records_connections() {
        let (mut graph, ids) = graph_with(2);
        graph.connect(ids[0], ids[1]).unwrap();

        assert!(graph.node(ids[0]).unwrap().is_connected_with(ids[1]));
        assert!(graph.node(ids[1]).unwrap().is_connected_with(ids[0]));
        assert_eq!(graph.branches().len(), 1);
    }

    #[test]
    fn test_duplicate_branch_policy() {
        let (mut graph, ids) = graph_with(2);
        graph.connect(ids[0], ids[1]).unwrap();
        graph.connect(ids[1], ids[0]).unwrap();
        assert_eq!(graph.branches().len(), 2);

        let (mut graph, ids) = graph_with(2);
        graph.set_branch_policy(BranchPolicy::Dedupe);
        graph.connect(ids[0], ids[1]).unwrap();
        graph.connect(ids[1], ids[0]).unwrap();
        assert_eq!(graph.branches().len(), 1);
    }

    #[test]
    fn test_remove_node_prunes_only_its_branches() {
        let (mut graph, ids) = graph_with(5);
        // hub participates in 3 branches, plus 2 unrelated ones
        graph.connect(ids[0], ids[1]).unwrap();
        graph.connect(ids[2], ids[0]).unwrap();
        graph.connect(ids[0], ids[3]).unwrap();
        graph.connect(ids[1], ids[2]).unwrap();
        graph.connect(ids[3], ids[4]).unwrap();
        let untouched: Vec<Branch> = graph
            .branches()
            .iter()
            .filter(|b| !b.is_connected_to(ids[0]))
            .copied()
            .collect();

        graph.remove_node(ids[0]).unwrap();

        assert_eq!(graph.branches(), untouched.as_slice());
        for other in &ids[1..] {
            assert!(!graph.node(*other).unwrap().is_connected_with(ids[0]));
        }
    }

    #[test]
    fn test_disconnect() {
        let (mut graph, ids) = graph_with(3);
        graph.connect(ids[0], ids[1]).unwrap();
        graph.connect(ids[0], ids[1]).unwrap();
        graph.connect(ids[1], ids[2]).unwrap();

        assert_eq!(graph.disconnect(ids[1], ids[0]), 2);
        assert_eq!(graph.branches().len(), 1);
        assert!(!graph.node(ids[0]).unwrap().is_connected_with(ids[1]));
        assert!(graph.node(ids[1]).unwrap().is_connected_with(ids[2]));
    }

    #[test]
    fn test_selection_is_exclusive() {
        let (mut graph, ids) = graph_with(2);
        assert!(graph.select(ids[0]).unwrap());
        assert!(!graph.select(ids[0]).unwrap());
        assert!(graph.select(ids[1]).unwrap());

        assert!(!graph.node(ids[0]).unwrap().is_selected());
        assert!(graph.node(ids[1]).unwrap().is_selected());
        assert_eq!(graph.selected(), Some(ids[1]));

        assert!(graph.clear_selection());
        assert!(!graph.clear_selection());
        assert!(!graph.node(ids[1]).unwrap().is_selected());
    }

    #[test]
    fn test_removing_selected_clears_selection() {
        let (mut graph, ids) = graph_with(2);
        graph.select(ids[1]).unwrap();
        graph.remove_node(ids[1]);
        assert_eq!(graph.selected(), None);
    }

    #[test]
    fn test_create_node_uses_layout() {
        let (graph, ids) = graph_with(3);
        assert_eq!(graph.node(ids[0]).unwrap().position(), Vec3::ZERO);
        assert_eq!(
            graph.node(ids[2]).unwrap().position(),
            layout_position(2, DEFAULT_LAYOUT_RADIUS)
        );
    }

    #[test]
    fn test_branch_endpoints_follow_world_positions() {
        let (mut graph, ids) = graph_with(2);
        graph.connect(ids[0], ids[1]).unwrap();
        graph.set_position(ids[1], Vec3::new(0.0, 3.0, 0.0)).unwrap();

        let endpoints = graph.branch_endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].2, Vec3::new(0.0, 3.0, 0.0));
    }
}
