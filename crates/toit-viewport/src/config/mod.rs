//! Viewport configuration
//!
//! Camera lens, gesture sensitivities, picking and graph placement settings.
//! Stored as RON next to the other per-user config files.

mod manager;

pub use manager::{ConfigError, ConfigManager, SharedConfig, create_shared_config};

use serde::{Deserialize, Serialize};
use toit_core::{BranchPolicy, DEFAULT_LAYOUT_RADIUS};

use crate::picking::{DEFAULT_BASE_HIT_RADIUS, DEFAULT_HIT_RADIUS_GROWTH, HitRadius};

/// Camera settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Closest the eye may zoom to the target
    pub min_distance: f32,
    /// Farthest the eye may zoom from the target
    pub max_distance: f32,
    pub initial_position: [f32; 3],
    pub initial_target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 100.0,
            min_distance: 1.0,
            max_distance: 20.0,
            initial_position: [0.0, 2.0, 5.0],
            initial_target: [0.0, 0.0, 0.0],
        }
    }
}

/// Gesture sensitivities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Radians per pixel of drag
    pub orbit_sensitivity: f32,
    /// Fraction of the target distance per pixel of drag
    pub pan_sensitivity: f32,
    /// World units per unit of pinch factor
    pub zoom_sensitivity: f32,
    /// Multiplier on the rotation gesture angle
    pub roll_sensitivity: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.01,
            pan_sensitivity: 0.01,
            zoom_sensitivity: 2.0,
            roll_sensitivity: 0.5,
        }
    }
}

/// Picking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickingConfig {
    pub base_hit_radius: f32,
    pub hit_radius_growth: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            base_hit_radius: DEFAULT_BASE_HIT_RADIUS,
            hit_radius_growth: DEFAULT_HIT_RADIUS_GROWTH,
        }
    }
}

impl PickingConfig {
    pub fn hit_radius(&self) -> HitRadius {
        HitRadius::new(self.base_hit_radius, self.hit_radius_growth)
    }
}

/// Scene graph settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub branch_policy: BranchPolicy,
    /// Radius of the circle new nodes are placed on
    pub layout_radius: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            branch_policy: BranchPolicy::default(),
            layout_radius: DEFAULT_LAYOUT_RADIUS,
        }
    }
}

/// Complete viewport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewportConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub picking: PickingConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

impl ViewportConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}
