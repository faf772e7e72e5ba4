//! Toit mind map viewport
//!
//! Everything between the scene graph and a renderer:
//! - [`camera`]: orbit/pan/zoom/roll camera with view and projection matrices
//! - [`picking`]: screen-to-ray unprojection and node picking
//! - [`frame`]: per-frame draw data and uniform blocks
//! - [`geometry`]: node sphere and branch tube meshes
//! - [`config`]: persisted viewport settings
//! - [`view`]: gesture-driven controller tying it all together

pub mod camera;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod picking;
pub mod view;

pub use camera::Camera;
pub use config::{ConfigError, ConfigManager, SharedConfig, ViewportConfig, create_shared_config};
pub use frame::{BranchDrawData, FrameData, NodeDrawData, Renderable};
pub use geometry::{GeometryLibrary, MeshData, MeshVertex};
pub use picking::{HitRadius, PickHit, Ray, pick_node, screen_to_ray};
pub use view::{MindMapView, ViewError, ViewResult};
