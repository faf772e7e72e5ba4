//! Scene node definition

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math;

/// Default node color (RGBA)
pub const DEFAULT_NODE_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0];

/// Color applied while a node is selected (RGBA)
pub const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 0.6, 0.0, 1.0];

/// Stable identifier of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to drawable geometry owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GeometryHandle(u64);

impl GeometryHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Creates a handle from a raw value.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

/// An entity in the hierarchical transform graph.
///
/// The local transform components live here, together with the cached local
/// and world matrices. Hierarchy links are [`NodeId`] handles into the owning
/// [`SceneGraph`](crate::SceneGraph), which is also the only place that can
/// change them, so the cached world matrix is never stale once a graph
/// operation returns.
#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    pub title: String,
    pub description: String,

    position: Vec3,
    /// Euler angles in radians
    rotation: Vec3,
    scale: Vec3,

    local_matrix: Mat4,
    world_matrix: Mat4,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) connections: BTreeSet<NodeId>,

    selected: bool,
    color: [f32; 4],
    base_color: [f32; 4],
    geometry: Option<GeometryHandle>,

    /// Set whenever persisted fields change; cleared by the store after a save
    needs_sync: bool,
}

impl SceneNode {
    /// Create a node with a fresh id at `position`.
    pub fn new(position: Vec3) -> Self {
        Self::with_id(NodeId::new(), "", position)
    }

    /// Create a node with an explicit id and title.
    pub fn with_id(id: NodeId, title: impl Into<String>, position: Vec3) -> Self {
        let local_matrix = math::compose_trs(position, Vec3::ZERO, Vec3::ONE);
        Self {
            id,
            title: title.into(),
            description: String::new(),
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            local_matrix,
            world_matrix: local_matrix,
            parent: None,
            children: Vec::new(),
            connections: BTreeSet::new(),
            selected: false,
            color: DEFAULT_NODE_COLOR,
            base_color: DEFAULT_NODE_COLOR,
            geometry: None,
            needs_sync: true,
        }
    }

    /// Builder: set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the base color.
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.base_color = color;
        if !self.selected {
            self.color = color;
        }
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.local_matrix
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// Origin of the node in world space.
    pub fn world_position(&self) -> Vec3 {
        math::translation_of(&self.world_matrix)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Ids of nodes linked to this one by a branch.
    pub fn connections(&self) -> &BTreeSet<NodeId> {
        &self.connections
    }

    pub fn is_connected_with(&self, other: NodeId) -> bool {
        self.connections.contains(&other)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Current display color (highlight while selected).
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn base_color(&self) -> [f32; 4] {
        self.base_color
    }

    pub fn geometry(&self) -> Option<GeometryHandle> {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: Option<GeometryHandle>) {
        self.geometry = geometry;
    }

    pub fn needs_sync(&self) -> bool {
        self.needs_sync
    }

    pub fn mark_synced(&mut self) {
        self.needs_sync = false;
    }

    /// Highlight this node. Returns `false` if it was already selected.
    pub fn select(&mut self) -> bool {
        if self.selected {
            return false;
        }
        self.selected = true;
        self.color = HIGHLIGHT_COLOR;
        true
    }

    /// Remove the highlight. Returns `false` if the node was not selected.
    pub fn deselect(&mut self) -> bool {
        if !self.selected {
            return false;
        }
        self.selected = false;
        self.color = self.base_color;
        true
    }

    /// Replace the local transform components and recompute the local matrix.
    ///
    /// The world matrix is left for the caller to refresh.
    pub(crate) fn set_components(&mut self, position: Vec3, rotation: Vec3, scale: Vec3) {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.local_matrix = math::compose_trs(position, rotation, scale);
        self.needs_sync = true;
    }

    pub(crate) fn set_world_matrix(&mut self, parent_world: Option<Mat4>) {
        self.world_matrix = match parent_world {
            Some(parent) => parent * self.local_matrix,
            None => self.local_matrix,
        };
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.needs_sync = true;
    }
}

impl PartialEq for SceneNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SceneNode {}

impl Hash for SceneNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_world_equals_local() {
        let node = SceneNode::new(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.world_matrix(), node.local_matrix());
        assert_eq!(node.world_position(), Vec3::new(1.0, 2.0, 3.0));
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert!(node.needs_sync());
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut node = SceneNode::new(Vec3::ZERO);
        assert!(node.select());
        let color = node.color();
        assert!(!node.select());
        assert!(node.is_selected());
        assert_eq!(node.color(), color);
        assert_eq!(node.color(), HIGHLIGHT_COLOR);

        assert!(node.deselect());
        assert!(!node.deselect());
        assert!(!node.is_selected());
        assert_eq!(node.color(), DEFAULT_NODE_COLOR);
    }

    #[test]
    fn test_deselect_restores_custom_color() {
        let custom = [0.1, 0.5, 0.9, 1.0];
        let mut node = SceneNode::new(Vec3::ZERO).with_color(custom);
        node.select();
        node.deselect();
        assert_eq!(node.color(), custom);
    }

    #[test]
    fn test_equality_by_id() {
        let id = NodeId::new();
        let a = SceneNode::with_id(id, "a", Vec3::ZERO);
        let b = SceneNode::with_id(id, "b", Vec3::ONE);
        assert_eq!(a, b);
        assert_ne!(a, SceneNode::new(Vec3::ZERO));
    }

    #[test]
    fn test_node_id_serializes_as_uuid_string() {
        let id = NodeId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
