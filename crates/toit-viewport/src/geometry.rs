//! CPU-side geometry for nodes and branches.
//!
//! Meshes are generated here and kept in a [`GeometryLibrary`]; nodes refer
//! to them through [`GeometryHandle`]s. Uploading to the GPU is left to the
//! renderer, which can cast vertex and index slices with `bytemuck`.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use toit_core::math::EPSILON;
use toit_core::{DEFAULT_NODE_COLOR, GeometryHandle, SceneError, SceneResult};

/// Radius of the sphere drawn for a node
pub const NODE_RADIUS: f32 = 0.2;

/// Latitude/longitude segments of the node sphere
pub const NODE_SEGMENTS: u32 = 16;

/// Radius of the tube drawn for a branch
pub const BRANCH_RADIUS: f32 = 0.05;

/// Segments around a branch tube
pub const BRANCH_RADIAL_SEGMENTS: u32 = 8;

/// Vertex layout shared by node and branch meshes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color,
        }
    }
}

/// Axis-aligned bounds of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounds of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = Vec3::from(self.vertices.first()?.position);
        let (min, max) = self.vertices.iter().fold((first, first), |(min, max), v| {
            let p = Vec3::from(v.position);
            (min.min(p), max.max(p))
        });
        Some(Bounds { min, max })
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// UV sphere centered on the origin.
pub fn sphere_mesh(radius: f32, segments: u32, color: [f32; 4]) -> SceneResult<MeshData> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SceneError::InvalidArgument(format!(
            "sphere radius must be positive, got {radius}"
        )));
    }
    if segments < 3 {
        return Err(SceneError::InvalidArgument(format!(
            "sphere needs at least 3 segments, got {segments}"
        )));
    }

    let ring = segments + 1;
    let mut vertices = Vec::with_capacity((ring * ring) as usize);
    for lat in 0..=segments {
        let theta = lat as f32 * PI / segments as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for lon in 0..=segments {
            let phi = lon as f32 * TAU / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            vertices.push(MeshVertex::new(normal * radius, normal, color));
        }
    }

    let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
    for lat in 0..segments {
        for lon in 0..segments {
            let first = lat * ring + lon;
            let second = first + ring;
            indices.extend_from_slice(&[first, second, first + 1, second, second + 1, first + 1]);
        }
    }

    Ok(MeshData::new(vertices, indices))
}

/// Open cylinder from `start` to `end`.
pub fn branch_tube(
    start: Vec3,
    end: Vec3,
    radius: f32,
    radial_segments: u32,
    color: [f32; 4],
) -> SceneResult<MeshData> {
    let axis = end - start;
    if !axis.is_finite() || axis.length() <= EPSILON {
        return Err(SceneError::InvalidArgument(
            "branch endpoints coincide".into(),
        ));
    }
    if !(radius.is_finite() && radius > 0.0) || radial_segments < 3 {
        return Err(SceneError::InvalidArgument(format!(
            "invalid tube radius {radius} / segments {radial_segments}"
        )));
    }

    let (u, v) = axis.normalize().any_orthonormal_pair();
    let ring = radial_segments + 1;
    let mut vertices = Vec::with_capacity((ring * 2) as usize);
    for center in [start, end] {
        for i in 0..=radial_segments {
            let angle = i as f32 * TAU / radial_segments as f32;
            let (sin, cos) = angle.sin_cos();
            let normal = u * cos + v * sin;
            vertices.push(MeshVertex::new(center + normal * radius, normal, color));
        }
    }

    let mut indices = Vec::with_capacity((radial_segments * 6) as usize);
    for i in 0..radial_segments {
        let a = i;
        let b = i + ring;
        indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
    }

    Ok(MeshData::new(vertices, indices))
}

/// Default node sphere.
pub fn node_mesh() -> SceneResult<MeshData> {
    sphere_mesh(NODE_RADIUS, NODE_SEGMENTS, DEFAULT_NODE_COLOR)
}

/// Handle-keyed store of generated meshes.
#[derive(Debug, Default)]
pub struct GeometryLibrary {
    meshes: HashMap<GeometryHandle, MeshData>,
    next_handle: u64,
}

impl GeometryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `mesh` and return its handle.
    pub fn insert(&mut self, mesh: MeshData) -> GeometryHandle {
        self.next_handle += 1;
        let handle = GeometryHandle::from_raw(self.next_handle);
        self.meshes.insert(handle, mesh);
        handle
    }

    pub fn get(&self, handle: GeometryHandle) -> Option<&MeshData> {
        self.meshes.get(&handle)
    }

    pub fn remove(&mut self, handle: GeometryHandle) -> Option<MeshData> {
        self.meshes.remove(&handle)
    }

    pub fn contains(&self, handle: GeometryHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
