//! Mind map view controller
//!
//! [`MindMapView`] ties a [`SceneGraph`], a [`Camera`] and a [`NodeStore`]
//! together and turns raw gestures into graph and camera updates. An
//! application shell forwards taps, drags and pinches here and draws whatever
//! [`frame`](MindMapView::frame) returns.

use glam::{Vec2, Vec3};
use thiserror::Error;
use toit_core::math;
use toit_core::{Branch, NodeId, NodeStore, SceneError, SceneGraph, SceneNode, StoreError};

use crate::camera::Camera;
use crate::config::ViewportConfig;
use crate::frame::FrameData;
use crate::picking::{self, HitRadius, PickHit};

/// Errors surfaced by [`MindMapView`]
#[derive(Debug, Clone, Error)]
pub enum ViewError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Interactive mind map: graph, camera, two-slot selection and persistence.
///
/// Selection keeps the current pick and the one before it, so two taps pick
/// the endpoints for [`connect_selected`](Self::connect_selected).
pub struct MindMapView<S: NodeStore> {
    graph: SceneGraph,
    camera: Camera,
    config: ViewportConfig,
    store: S,
    viewport: Vec2,
    hit_radius: HitRadius,
    last_selected: Option<NodeId>,
    /// Set when nodes or branches are removed (removals leave no node to flag)
    structure_changed: bool,
}

impl<S: NodeStore> MindMapView<S> {
    /// Create an empty view sized `viewport` pixels.
    pub fn new(config: ViewportConfig, store: S, viewport: Vec2) -> ViewResult<Self> {
        let aspect = aspect_ratio(viewport)?;
        let camera = Camera::from_config(&config.camera, aspect)?;
        let graph = SceneGraph::new()
            .with_branch_policy(config.graph.branch_policy)
            .with_layout_radius(config.graph.layout_radius);

        Ok(Self {
            graph,
            camera,
            hit_radius: config.picking.hit_radius(),
            config,
            store,
            viewport,
            last_selected: None,
            structure_changed: false,
        })
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.graph.selected()
    }

    pub fn last_selected(&self) -> Option<NodeId> {
        self.last_selected
    }

    /// Apply new settings. The camera keeps its position and target.
    pub fn apply_config(&mut self, config: ViewportConfig) -> ViewResult<()> {
        self.camera.apply_config(&config.camera)?;
        self.graph.set_branch_policy(config.graph.branch_policy);
        self.graph.set_layout_radius(config.graph.layout_radius);
        self.hit_radius = config.picking.hit_radius();
        self.config = config;
        Ok(())
    }

    /// Viewport resized to `width` x `height` pixels.
    pub fn resize(&mut self, width: f32, height: f32) -> ViewResult<()> {
        let viewport = Vec2::new(width, height);
        self.camera.update_projection(aspect_ratio(viewport)?)?;
        self.viewport = viewport;
        Ok(())
    }

    // ---- graph editing ----

    /// Add a node at the next layout slot.
    pub fn add_node(&mut self, title: impl Into<String>) -> NodeId {
        let id = self.graph.create_node(title);
        tracing::info!("Created node {}", id);
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        let removed = self.graph.remove_node(id)?;
        if self.last_selected == Some(id) {
            self.last_selected = None;
        }
        self.structure_changed = true;
        Some(removed)
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> ViewResult<()> {
        Ok(self.graph.set_title(id, title)?)
    }

    pub fn set_description(
        &mut self,
        id: NodeId,
        description: impl Into<String>,
    ) -> ViewResult<()> {
        Ok(self.graph.set_description(id, description)?)
    }

    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> usize {
        let removed = self.graph.disconnect(a, b);
        if removed > 0 {
            self.structure_changed = true;
        }
        removed
    }

    // ---- gestures ----

    /// Pick the node under a viewport pixel without changing selection.
    pub fn pick(&self, point: Vec2) -> ViewResult<Option<PickHit>> {
        let ray = self.camera.screen_to_ray(point, self.viewport)?;
        let radius = self.hit_radius;
        Ok(picking::pick_node(&ray, self.graph.nodes(), |d| radius.radius_at(d)))
    }

    /// Handle a tap at a viewport pixel and return the new selection.
    ///
    /// - tapping the selected node deselects it and remembers it as the
    ///   previous pick
    /// - tapping another node selects it; the old selection, if any, becomes
    ///   the previous pick
    /// - tapping empty space clears both
    pub fn tap(&mut self, point: Vec2) -> ViewResult<Option<NodeId>> {
        let Some(hit) = self.pick(point)? else {
            self.graph.clear_selection();
            self.last_selected = None;
            return Ok(None);
        };

        match self.graph.selected() {
            Some(current) if current == hit.node => {
                self.last_selected = Some(current);
                self.graph.clear_selection();
            }
            Some(current) => {
                self.last_selected = Some(current);
                self.graph.select(hit.node)?;
            }
            None => {
                self.graph.select(hit.node)?;
            }
        }
        Ok(self.graph.selected())
    }

    /// Connect the previous pick to the current selection, then clear both.
    ///
    /// Returns `Ok(None)` when either slot is empty.
    pub fn connect_selected(&mut self) -> ViewResult<Option<Branch>> {
        let (Some(from), Some(to)) = (self.last_selected, self.graph.selected()) else {
            return Ok(None);
        };

        let branch = self.graph.connect(from, to)?;
        self.graph.clear_selection();
        self.last_selected = None;
        Ok(Some(branch))
    }

    /// Drag the selected node so it stays under `point`.
    ///
    /// The node moves in the plane through its current world position facing
    /// the camera. Returns the new world position, or `None` if nothing is
    /// selected or the ray misses the plane.
    pub fn drag_selected(&mut self, point: Vec2) -> ViewResult<Option<Vec3>> {
        let Some(id) = self.graph.selected() else {
            return Ok(None);
        };

        let node = self.graph.node(id)?;
        let anchor = node.world_position();
        let parent_world = match node.parent() {
            Some(parent) => Some(self.graph.node(parent)?.world_matrix()),
            None => None,
        };

        let ray = self.camera.screen_to_ray(point, self.viewport)?;
        let Some(world) = picking::drag_point(&ray, anchor, self.camera.forward()) else {
            return Ok(None);
        };

        let local = match parent_world {
            Some(parent_world) => math::inverse(parent_world)?.transform_point3(world),
            None => world,
        };
        self.graph.set_position(id, local)?;
        Ok(Some(world))
    }

    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let sensitivity = self.config.controls.orbit_sensitivity;
        self.camera.orbit(delta_x, delta_y, sensitivity);
    }

    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let sensitivity = self.config.controls.pan_sensitivity;
        self.camera.pan(delta_x, delta_y, sensitivity);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.camera.zoom(factor, self.config.controls.zoom_sensitivity);
    }

    pub fn roll(&mut self, angle: f32) {
        self.camera.roll(angle, self.config.controls.roll_sensitivity);
    }

    // ---- output ----

    pub fn frame(&self) -> ViewResult<FrameData> {
        Ok(FrameData::build(&self.graph, &self.camera)?)
    }

    // ---- persistence ----

    /// True when something changed since the last save or load.
    pub fn is_dirty(&self) -> bool {
        self.structure_changed || self.graph.nodes().any(|n| n.needs_sync())
    }

    /// Write a snapshot of every node to the store.
    pub fn save(&mut self) -> ViewResult<()> {
        let records = self.graph.to_records();
        self.store.save(&records)?;
        self.graph.mark_all_synced();
        self.structure_changed = false;
        tracing::info!("Saved {} nodes", records.len());
        Ok(())
    }

    /// Save only if there are unsaved changes. Returns whether a save happened.
    pub fn save_if_dirty(&mut self) -> ViewResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Replace the graph with the store's snapshot.
    pub fn load(&mut self) -> ViewResult<()> {
        let records = self.store.load()?;
        self.graph.load_records(&records);
        self.graph.mark_all_synced();
        self.last_selected = None;
        self.structure_changed = false;
        Ok(())
    }
}

fn aspect_ratio(viewport: Vec2) -> Result<f32, SceneError> {
    if !(viewport.x > 0.0 && viewport.y > 0.0 && viewport.is_finite()) {
        return Err(SceneError::InvalidArgument(format!(
            "viewport size must be positive, got {viewport}"
        )));
    }
    Ok(viewport.x / viewport.y)
}
