//! Per-frame draw data handed to a renderer.
//!
//! Nothing here talks to a GPU. A frame is a flat snapshot of what to draw:
//! one entry per node and one per branch, plus camera matrices and
//! `bytemuck`-castable uniform blocks.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use toit_core::math;
use toit_core::{Branch, GeometryHandle, NodeId, SceneGraph, SceneNode, SceneResult};

use crate::camera::Camera;

/// Anything the renderer can draw at a world transform.
pub trait Renderable {
    fn world_matrix(&self) -> Mat4;

    /// RGBA color, already reflecting selection highlight.
    fn color(&self) -> [f32; 4];

    fn geometry(&self) -> Option<GeometryHandle>;

    fn is_selected(&self) -> bool {
        false
    }
}

impl Renderable for SceneNode {
    fn world_matrix(&self) -> Mat4 {
        SceneNode::world_matrix(self)
    }

    fn color(&self) -> [f32; 4] {
        SceneNode::color(self)
    }

    fn geometry(&self) -> Option<GeometryHandle> {
        SceneNode::geometry(self)
    }

    fn is_selected(&self) -> bool {
        SceneNode::is_selected(self)
    }
}

/// Per-object uniform block (144 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix, for normals
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        // Singular models (zero scale) get an identity normal matrix
        let normal_matrix = math::inverse(model)
            .map(|inv| inv.transpose())
            .unwrap_or(Mat4::IDENTITY);
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color,
        }
    }
}

/// Camera uniform block (80 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = eye position, w = 1
    pub eye_position: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, eye: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye_position: eye.extend(1.0).to_array(),
        }
    }
}

/// What to draw for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrawData {
    pub id: NodeId,
    pub world_matrix: Mat4,
    pub color: [f32; 4],
    pub selected: bool,
    pub geometry: Option<GeometryHandle>,
}

impl NodeDrawData {
    pub fn from_renderable(id: NodeId, object: &impl Renderable) -> Self {
        Self {
            id,
            world_matrix: object.world_matrix(),
            color: object.color(),
            selected: object.is_selected(),
            geometry: object.geometry(),
        }
    }

    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform::new(self.world_matrix, self.color)
    }
}

/// What to draw for one branch: a segment between two world positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchDrawData {
    pub branch: Branch,
    pub start: Vec3,
    pub end: Vec3,
}

impl BranchDrawData {
    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
    pub nodes: Vec<NodeDrawData>,
    pub branches: Vec<BranchDrawData>,
}

impl FrameData {
    /// Snapshot `graph` as seen from `camera`. Nodes keep insertion order.
    pub fn build(graph: &SceneGraph, camera: &Camera) -> SceneResult<Self> {
        let view = camera.view_matrix()?;
        let projection = camera.projection_matrix()?;

        let nodes = graph
            .nodes()
            .map(|node| NodeDrawData::from_renderable(node.id(), node))
            .collect();
        let branches = graph
            .branch_endpoints()
            .into_iter()
            .map(|(branch, start, end)| BranchDrawData { branch, start, end })
            .collect();

        Ok(Self {
            view,
            projection,
            eye: camera.position(),
            nodes,
            branches,
        })
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        CameraUniform::new(self.view_projection(), self.eye)
    }

    pub fn selected_node(&self) -> Option<&NodeDrawData> {
        self.nodes.iter().find(|n| n.selected)
    }
}
