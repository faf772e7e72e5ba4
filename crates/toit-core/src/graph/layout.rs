//! Automatic placement of new nodes

use std::f32::consts::TAU;

use glam::Vec3;

/// Radius of the placement circle around the origin
pub const DEFAULT_LAYOUT_RADIUS: f32 = 0.8;

/// Number of angular slots on the placement circle
pub const LAYOUT_SLOTS: usize = 6;

/// Position for the node created when the graph already holds `count` nodes.
///
/// The first node sits at the origin; every later one lands on a circle of
/// `radius` in the XY plane at `(count - 1) * 2π / 6`, so positions repeat
/// every six nodes. Depends only on `count`.
pub fn layout_position(count: usize, radius: f32) -> Vec3 {
    if count == 0 {
        return Vec3::ZERO;
    }
    let slot = (count - 1) % LAYOUT_SLOTS;
    let angle = slot as f32 * (TAU / LAYOUT_SLOTS as f32);
    Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
}
