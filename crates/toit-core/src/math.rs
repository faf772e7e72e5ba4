//! Transform math on top of glam.
//!
//! Conventions used everywhere in the workspace:
//!
//! - Matrices are column-major [`Mat4`], vectors are column vectors (`M * v`).
//! - Euler rotations are composed as `Rz * Ry * Rx`, so X is applied first.
//! - View space is **left-handed**: the camera looks down +Z,
//!   `right = cross(up, forward)`.
//! - Clip-space depth is `[0, 1]`: the near plane maps to 0, the far plane to 1.
//!
//! Constructors that can be fed degenerate input return [`SceneError`] instead
//! of silently producing NaN.

use glam::{Mat4, Vec3, Vec4};

use crate::error::{SceneError, SceneResult};

/// Tolerance for zero-length and parallel-vector checks
pub const EPSILON: f32 = 1e-6;

/// A matrix is treated as singular when `|det|` is at or below this fraction
/// of the product of its column lengths (the largest `|det|` those columns
/// could have). Independent of overall scale.
const SINGULAR_RATIO: f32 = 1e-7;

/// Translation matrix for `v`.
pub fn translation_matrix(v: Vec3) -> Mat4 {
    Mat4::from_translation(v)
}

/// Rotation matrix from Euler angles in radians, composed as `Rz * Ry * Rx`.
pub fn rotation_matrix(euler: Vec3) -> Mat4 {
    Mat4::from_rotation_z(euler.z) * Mat4::from_rotation_y(euler.y) * Mat4::from_rotation_x(euler.x)
}

/// Non-uniform scale matrix.
pub fn scale_matrix(v: Vec3) -> Mat4 {
    Mat4::from_scale(v)
}

/// `T(position) * R(rotation) * S(scale)`
pub fn compose_trs(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    translation_matrix(position) * rotation_matrix(rotation) * scale_matrix(scale)
}

/// Matrix product `a * b`.
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

/// Inverse of `m`, or [`SceneError::DegenerateTransform`] if it is singular.
pub fn inverse(m: Mat4) -> SceneResult<Mat4> {
    let det = m.determinant();
    let bound = m.x_axis.length() * m.y_axis.length() * m.z_axis.length() * m.w_axis.length();
    if !det.is_finite() || det == 0.0 || det.abs() <= SINGULAR_RATIO * bound {
        return Err(SceneError::DegenerateTransform(format!(
            "matrix is not invertible (determinant {det})"
        )));
    }

    let inv = m.inverse();
    if !inv.is_finite() {
        return Err(SceneError::DegenerateTransform("matrix inverse is not finite".into()));
    }
    Ok(inv)
}

/// Unit vector in the direction of `v`.
pub fn normalize(v: Vec3) -> SceneResult<Vec3> {
    if !v.is_finite() {
        return Err(SceneError::invalid(format!("non-finite vector {v}")));
    }
    let len = v.length();
    if len <= EPSILON {
        return Err(SceneError::invalid("cannot normalize a zero-length vector"));
    }
    Ok(v / len)
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    a.cross(b)
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(b)
}

pub fn length(v: Vec3) -> f32 {
    v.length()
}

/// Translation part of an affine transform.
pub fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// World-to-camera matrix.
///
/// `forward = normalize(target - eye)`, `right = normalize(cross(up, forward))`
/// and the returned frame uses the re-orthogonalized `cross(forward, right)` as up.
/// Fails if `eye == target`, `up` is zero, or `up` is parallel to the view direction.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> SceneResult<Mat4> {
    if !eye.is_finite() || !target.is_finite() {
        return Err(SceneError::invalid("look_at: non-finite eye or target"));
    }
    let forward = normalize(target - eye)
        .map_err(|_| SceneError::invalid("look_at: eye and target coincide"))?;
    let up = normalize(up).map_err(|_| SceneError::invalid("look_at: zero up vector"))?;

    let right = up.cross(forward);
    if right.length() <= EPSILON {
        return Err(SceneError::invalid(
            "look_at: up vector is parallel to the view direction",
        ));
    }
    let right = right.normalize();
    let up = forward.cross(right);

    Ok(Mat4::from_cols(
        Vec4::new(right.x, up.x, forward.x, 0.0),
        Vec4::new(right.y, up.y, forward.y, 0.0),
        Vec4::new(right.z, up.z, forward.z, 0.0),
        Vec4::new(-right.dot(eye), -up.dot(eye), -forward.dot(eye), 1.0),
    ))
}

/// Left-handed perspective projection with `[0, 1]` depth.
///
/// `fov_y` is the vertical field of view in radians and must lie in `(0, π)`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> SceneResult<Mat4> {
    validate_frustum(fov_y, aspect, near, far)?;

    let y = 1.0 / (fov_y * 0.5).tan();
    let x = y / aspect;
    let z = far / (far - near);
    let w = -z * near;

    Ok(Mat4::from_cols(
        Vec4::new(x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, z, 1.0),
        Vec4::new(0.0, 0.0, w, 0.0),
    ))
}

/// Checks the parameters accepted by [`perspective`].
pub fn validate_frustum(fov_y: f32, aspect: f32, near: f32, far: f32) -> SceneResult<()> {
    if !(fov_y.is_finite() && fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(SceneError::invalid(format!(
            "field of view must be in (0, pi), got {fov_y}"
        )));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(SceneError::invalid(format!(
            "aspect ratio must be positive, got {aspect}"
        )));
    }
    if !(near.is_finite() && near > 0.0) {
        return Err(SceneError::invalid(format!(
            "near plane must be positive, got {near}"
        )));
    }
    if !(far.is_finite() && far > near) {
        return Err(SceneError::invalid(format!(
            "far plane ({far}) must be beyond near plane ({near})"
        )));
    }
    Ok(())
}
