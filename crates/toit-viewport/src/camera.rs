//! Orbit camera
//!
//! The camera looks from `position` at `target`. Gesture input is fed in as
//! screen-space deltas in pixels (x right, y down) and turned into orbit, pan,
//! zoom and roll motions.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

use glam::{Mat4, Quat, Vec2, Vec3};
use toit_core::math::{self, EPSILON};
use toit_core::{SceneError, SceneResult};

use crate::config::CameraConfig;
use crate::picking::{self, Ray};

/// World up axis used for yaw and as the fallback up vector
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Maximum elevation of the eye above/below the target (99% of a right angle)
pub const MAX_ELEVATION: f32 = FRAC_PI_2 * 0.99;

/// A perspective camera orbiting a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in radians
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    min_distance: f32,
    max_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::new(0.0, 5.0, -2.0).normalize(),
            fov_y: FRAC_PI_3,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            min_distance: 1.0,
            max_distance: 20.0,
        }
    }
}

impl Camera {
    /// Create a camera at `position` looking at `target` with default lens settings.
    ///
    /// The up vector starts as world up projected off the view direction, so
    /// a new camera is never rolled.
    pub fn new(position: Vec3, target: Vec3) -> SceneResult<Self> {
        let mut camera = Self {
            up: WORLD_UP,
            ..Self::default()
        };
        camera.look_at(position, target)?;
        Ok(camera)
    }

    /// Create a camera from configuration.
    pub fn from_config(config: &CameraConfig, aspect: f32) -> SceneResult<Self> {
        let mut camera = Self::new(
            Vec3::from(config.initial_position),
            Vec3::from(config.initial_target),
        )?;
        camera.apply_config(config)?;
        camera.update_projection(aspect)?;
        Ok(camera)
    }

    /// Apply lens and distance settings. Position and target are kept.
    ///
    /// Nothing is changed unless the whole section is valid.
    pub fn apply_config(&mut self, config: &CameraConfig) -> SceneResult<()> {
        let fov_y = config.fov_degrees.to_radians();
        math::validate_frustum(fov_y, self.aspect, config.near_plane, config.far_plane)?;
        validate_distance_limits(config.min_distance, config.max_distance)?;

        self.fov_y = fov_y;
        self.near = config.near_plane;
        self.far = config.far_plane;
        self.min_distance = config.min_distance;
        self.max_distance = config.max_distance;
        Ok(())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Distance from the eye to the target.
    pub fn distance(&self) -> f32 {
        (self.target - self.position).length()
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Unit right vector (`cross(up, forward)`, left-handed).
    pub fn right(&self) -> Vec3 {
        self.up.cross(self.forward()).normalize()
    }

    pub fn view_matrix(&self) -> SceneResult<Mat4> {
        math::look_at(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> SceneResult<Mat4> {
        math::perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> SceneResult<Mat4> {
        Ok(self.projection_matrix()? * self.view_matrix()?)
    }

    /// Move the eye and target together. The up vector is re-orthogonalized
    /// against the new view direction.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) -> SceneResult<()> {
        let forward = math::normalize(target - position)
            .map_err(|_| SceneError::InvalidArgument("camera position equals target".into()))?;
        let up = orthogonal_up(self.up, forward);
        math::look_at(position, target, up)?;

        self.position = position;
        self.target = target;
        self.up = up;
        Ok(())
    }

    /// Set field of view (radians) and clip planes.
    pub fn set_perspective(&mut self, fov_y: f32, near: f32, far: f32) -> SceneResult<()> {
        math::validate_frustum(fov_y, self.aspect, near, far)?;
        self.fov_y = fov_y;
        self.near = near;
        self.far = far;
        Ok(())
    }

    /// Set the allowed eye-to-target distance range used by [`zoom`](Self::zoom).
    pub fn set_distance_limits(&mut self, min: f32, max: f32) -> SceneResult<()> {
        validate_distance_limits(min, max)?;
        self.min_distance = min;
        self.max_distance = max;
        Ok(())
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn update_projection(&mut self, aspect: f32) -> SceneResult<()> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(SceneError::InvalidArgument(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        self.aspect = aspect;
        tracing::debug!("Camera projection updated with aspect ratio: {}", aspect);
        Ok(())
    }

    /// Rotate the eye around the target.
    ///
    /// Horizontal drag yaws around world up, vertical drag changes the
    /// elevation (dragging down raises the eye). Elevation is clamped to
    /// [`MAX_ELEVATION`] so the view direction never reaches the poles.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32, sensitivity: f32) {
        if !finite_input(&[delta_x, delta_y, sensitivity]) {
            return;
        }

        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= EPSILON {
            return;
        }

        let yaw = offset.x.atan2(offset.z);
        let elevation = (offset.y / radius).clamp(-1.0, 1.0).asin();
        let new_yaw = yaw - delta_x * sensitivity;
        let new_elevation =
            (elevation + delta_y * sensitivity).clamp(-MAX_ELEVATION, MAX_ELEVATION);

        let yaw_rotation = Quat::from_rotation_y(new_yaw - yaw);
        let swung = yaw_rotation * offset;
        let new_offset = spherical_offset(radius, new_yaw, new_elevation);
        // Both offsets share the same yaw, so this arc is a pure pitch
        let pitch_rotation = Quat::from_rotation_arc(swung / radius, new_offset / radius);
        let rotation = pitch_rotation * yaw_rotation;

        self.position = self.target + new_offset;
        self.up = orthogonal_up(rotation * self.up, self.forward());
    }

    /// Slide eye and target together in the view plane.
    ///
    /// Movement is scaled by the distance to the target so the scene follows
    /// the finger at the same rate at any zoom level.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, sensitivity: f32) {
        if !finite_input(&[delta_x, delta_y, sensitivity]) {
            return;
        }

        let forward = self.forward();
        let right = self.right();
        let up = forward.cross(right);
        let scale = self.distance() * sensitivity;

        let movement = right * (-delta_x * scale) + up * (delta_y * scale);
        self.position += movement;
        self.target += movement;
    }

    /// Move toward (positive `factor`) or away from the target.
    ///
    /// The resulting distance is clamped to `[min_distance, max_distance]`, so
    /// the eye never passes through the target.
    pub fn zoom(&mut self, factor: f32, sensitivity: f32) {
        if !finite_input(&[factor, sensitivity]) {
            return;
        }

        let forward = self.forward();
        let distance = (self.distance() - factor * sensitivity)
            .clamp(self.min_distance, self.max_distance);
        self.position = self.target - forward * distance;
    }

    /// Rotate the up vector around the view direction.
    pub fn roll(&mut self, angle: f32, sensitivity: f32) {
        if !finite_input(&[angle, sensitivity]) {
            return;
        }

        let forward = self.forward();
        let rotation = Quat::from_axis_angle(forward, angle * sensitivity);
        self.up = orthogonal_up(rotation * self.up, forward);
    }

    /// World-space ray through a viewport pixel.
    pub fn screen_to_ray(&self, point: Vec2, viewport: Vec2) -> SceneResult<Ray> {
        picking::screen_to_ray(point, viewport, self.view_matrix()?, self.projection_matrix()?)
    }
}

fn validate_distance_limits(min: f32, max: f32) -> SceneResult<()> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max >= min) {
        return Err(SceneError::InvalidArgument(format!(
            "invalid zoom range [{min}, {max}]"
        )));
    }
    Ok(())
}

fn finite_input(values: &[f32]) -> bool {
    let ok = values.iter().all(|v| v.is_finite());
    if !ok {
        tracing::warn!("Ignoring non-finite camera input: {:?}", values);
    }
    ok
}

fn spherical_offset(radius: f32, yaw: f32, elevation: f32) -> Vec3 {
    let (sin_e, cos_e) = elevation.sin_cos();
    let (sin_y, cos_y) = yaw.sin_cos();
    Vec3::new(cos_e * sin_y, sin_e, cos_e * cos_y) * radius
}

/// Component of `up` perpendicular to `forward`, falling back to world up
/// (then +Z) when `up` has collapsed onto the view direction.
fn orthogonal_up(up: Vec3, forward: Vec3) -> Vec3 {
    const MIN_LEN: f32 = 1e-3;

    for candidate in [up, WORLD_UP, Vec3::Z] {
        let projected = candidate - forward * candidate.dot(forward);
        if projected.length() > MIN_LEN {
            return projected.normalize();
        }
    }
    // forward is finite and unit, so it cannot be parallel to both Y and Z
    Vec3::X
}
