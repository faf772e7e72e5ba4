//! Ray picking
//!
//! Turns a viewport pixel into a world-space ray and finds the node it hits.
//! Nodes are treated as spheres whose radius grows with distance, so far away
//! nodes stay easy to tap.

use glam::{Mat4, Vec2, Vec3, Vec4};
use toit_core::math::{self, EPSILON};
use toit_core::{NodeId, SceneError, SceneNode, SceneResult};

/// Hit radius at distance zero (twice the rendered node radius)
pub const DEFAULT_BASE_HIT_RADIUS: f32 = 0.4;

/// Relative hit radius growth per world unit of distance
pub const DEFAULT_HIT_RADIUS_GROWTH: f32 = 0.15;

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> SceneResult<Self> {
        if !origin.is_finite() {
            return Err(SceneError::InvalidArgument(format!(
                "non-finite ray origin {origin}"
            )));
        }
        Ok(Self {
            origin,
            direction: math::normalize(direction)?,
        })
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Closest point on the ray to `point` and its parameter (never negative).
    pub fn closest_point(&self, point: Vec3) -> (f32, Vec3) {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        (t, self.at(t))
    }
}

/// Unproject a viewport pixel into a world-space ray.
///
/// `point` is in pixels with the origin at the top-left corner and y growing
/// downward; `viewport` is the viewport size in pixels. The ray starts on the
/// near plane and points through the far plane.
pub fn screen_to_ray(
    point: Vec2,
    viewport: Vec2,
    view: Mat4,
    projection: Mat4,
) -> SceneResult<Ray> {
    if !(viewport.x > 0.0 && viewport.y > 0.0 && viewport.is_finite()) {
        return Err(SceneError::InvalidArgument(format!(
            "viewport size must be positive, got {viewport}"
        )));
    }
    if !point.is_finite() {
        return Err(SceneError::InvalidArgument(format!(
            "non-finite screen point {point}"
        )));
    }

    let ndc_x = 2.0 * point.x / viewport.x - 1.0;
    let ndc_y = 1.0 - 2.0 * point.y / viewport.y;

    let inverse_projection = math::inverse(projection)?;
    let inverse_view = math::inverse(view)?;

    let unproject = |depth: f32| -> SceneResult<Vec3> {
        let clip = Vec4::new(ndc_x, ndc_y, depth, 1.0);
        let view_space = inverse_projection * clip;
        if view_space.w.abs() <= EPSILON {
            return Err(SceneError::DegenerateTransform(
                "unprojected point is at infinity".into(),
            ));
        }
        Ok(inverse_view.transform_point3(view_space.truncate() / view_space.w))
    };

    let near = unproject(0.0)?;
    let far = unproject(1.0)?;
    Ray::new(near, far - near)
}

/// Something that can be picked: an id at a world position.
pub trait Pickable {
    fn pick_id(&self) -> NodeId;
    fn pick_position(&self) -> Vec3;
}

impl Pickable for SceneNode {
    fn pick_id(&self) -> NodeId {
        self.id()
    }

    fn pick_position(&self) -> Vec3 {
        self.world_position()
    }
}

impl Pickable for (NodeId, Vec3) {
    fn pick_id(&self) -> NodeId {
        self.0
    }

    fn pick_position(&self) -> Vec3 {
        self.1
    }
}

/// Result of a successful pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    /// Distance from the ray origin to the closest point on the ray
    pub distance_along_ray: f32,
    /// Distance from the node to the ray
    pub distance_to_ray: f32,
    /// Closest point on the ray to the node
    pub point: Vec3,
}

/// Distance-dependent hit radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRadius {
    pub base: f32,
    pub growth: f32,
}

impl Default for HitRadius {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_HIT_RADIUS,
            growth: DEFAULT_HIT_RADIUS_GROWTH,
        }
    }
}

impl HitRadius {
    pub fn new(base: f32, growth: f32) -> Self {
        Self { base, growth }
    }

    /// `base * (1 + distance * growth)`
    pub fn radius_at(&self, distance: f32) -> f32 {
        self.base * (1.0 + distance * self.growth)
    }
}

/// Pick the node hit by `ray`.
///
/// A node is a candidate when its distance to the ray is at most
/// `hit_radius(distance from ray origin to node)`. Among candidates the one
/// whose closest ray point is nearest the ray origin wins; exact ties keep the
/// first candidate in iteration order.
pub fn pick_node<'a, P, I, F>(ray: &Ray, nodes: I, hit_radius: F) -> Option<PickHit>
where
    P: Pickable + 'a,
    I: IntoIterator<Item = &'a P>,
    F: Fn(f32) -> f32,
{
    let mut closest: Option<PickHit> = None;

    for node in nodes {
        let position = node.pick_position();
        let (_, point) = ray.closest_point(position);
        let distance_to_ray = (position - point).length();
        let radius = hit_radius((position - ray.origin).length());

        if distance_to_ray > radius {
            continue;
        }

        let distance_along_ray = (point - ray.origin).length();
        if closest.is_none_or(|c| distance_along_ray < c.distance_along_ray) {
            closest = Some(PickHit {
                node: node.pick_id(),
                distance_along_ray,
                distance_to_ray,
                point,
            });
        }
    }

    if let Some(hit) = &closest {
        tracing::debug!(
            "Picked node {} at distance {:.3}",
            hit.node,
            hit.distance_along_ray
        );
    }
    closest
}

/// Parameter `t` where `ray` crosses the plane through `plane_point` with
/// normal `plane_normal`, or `None` for a parallel ray or a crossing behind
/// the origin.
pub fn ray_plane_intersection(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
    let denom = plane_normal.dot(ray.direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Where a node anchored at `anchor` should move so it stays under the ray,
/// constrained to the plane through `anchor` with normal `plane_normal`.
pub fn drag_point(ray: &Ray, anchor: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    ray_plane_intersection(ray, anchor, plane_normal).map(|t| ray.at(t))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn axis_ray() -> Ray {
        Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)).unwrap()
    }

    #[test]
    fn test_ray_new_normalizes() {
        let ray = axis_ray();
        assert_relative_eq!(ray.direction.length(), 1.0);
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_closest_point_clamps_behind_origin() {
        let ray = axis_ray();
        let (t, point) = ray.closest_point(Vec3::new(1.0, 0.0, -4.0));
        assert_eq!(t, 0.0);
        assert_eq!(point, Vec3::ZERO);
    }

    #[test]
    fn test_pick_prefers_nearest_along_ray() {
        let a = NodeId::new();
        let b = NodeId::new();
        let nodes = [(b, Vec3::new(0.0, 0.0, 5.0)), (a, Vec3::new(0.8, 0.0, 2.0))];

        let hit = pick_node(&axis_ray(), &nodes, |_| 1.0).unwrap();
        assert_eq!(hit.node, a);
        assert_relative_eq!(hit.distance_along_ray, 2.0, epsilon = 1e-5);
        assert_relative_eq!(hit.distance_to_ray, 0.8, epsilon = 1e-5);
    }

    #[test]
    fn test_pick_tie_keeps_first() {
        let a = NodeId::new();
        let b = NodeId::new();
        let nodes = [(a, Vec3::new(0.1, 0.0, 3.0)), (b, Vec3::new(-0.1, 0.0, 3.0))];

        let hit = pick_node(&axis_ray(), &nodes, |_| 1.0).unwrap();
        assert_eq!(hit.node, a);
    }

    #[test]
    fn test_pick_node_on_hit_sphere_counts() {
        let id = NodeId::new();
        let nodes = [(id, Vec3::new(1.0, 0.0, 2.0))];

        let hit = pick_node(&axis_ray(), &nodes, |_| 1.0).unwrap();
        assert_eq!(hit.node, id);
        assert_eq!(hit.distance_to_ray, 1.0);
    }

    #[test]
    fn test_pick_miss_and_empty() {
        let nodes = [(NodeId::new(), Vec3::new(2.0, 0.0, 3.0))];
        assert!(pick_node(&axis_ray(), &nodes, |_| 1.0).is_none());

        let empty: [(NodeId, Vec3); 0] = [];
        assert!(pick_node(&axis_ray(), &empty, |_| 1.0).is_none());
    }

    #[test]
    fn test_hit_radius_grows_with_distance() {
        let radius = HitRadius::default();
        assert_relative_eq!(radius.radius_at(0.0), 0.4);
        assert_relative_eq!(radius.radius_at(10.0), 0.4 * 2.5);

        // Same lateral offset: missed up close, hit far away
        let near = [(NodeId::new(), Vec3::new(0.5, 0.0, 1.0))];
        let far = [(NodeId::new(), Vec3::new(0.5, 0.0, 10.0))];
        let f = |d| radius.radius_at(d);
        assert!(pick_node(&axis_ray(), &near, f).is_none());
        assert!(pick_node(&axis_ray(), &far, f).is_some());
    }

    #[test]
    fn test_pick_scene_nodes() {
        let node = SceneNode::new(Vec3::new(0.0, 0.1, 4.0));
        let id = node.id();
        let nodes = vec![node];
        let hit = pick_node(&axis_ray(), &nodes, |d| HitRadius::default().radius_at(d));
        assert_eq!(hit.map(|h| h.node), Some(id));
    }

    #[test]
    fn test_screen_to_ray_center_and_edges() {
        let view = math::look_at(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y).unwrap();
        let projection = math::perspective(1.0, 800.0 / 600.0, 0.1, 100.0).unwrap();
        let viewport = Vec2::new(800.0, 600.0);

        let center = screen_to_ray(Vec2::new(400.0, 300.0), viewport, view, projection).unwrap();
        assert!((center.direction - Vec3::Z).length() < 1e-4);
        assert!((center.origin - Vec3::new(0.0, 0.0, -4.9)).length() < 1e-3);

        let right = screen_to_ray(Vec2::new(800.0, 300.0), viewport, view, projection).unwrap();
        assert!(right.direction.x > 0.0);

        let top = screen_to_ray(Vec2::new(400.0, 0.0), viewport, view, projection).unwrap();
        assert!(top.direction.y > 0.0);
    }

    #[test]
    fn test_screen_to_ray_rejects_bad_input() {
        let projection = math::perspective(1.0, 1.0, 0.1, 100.0).unwrap();
        let size = Vec2::new(100.0, 100.0);

        assert!(matches!(
            screen_to_ray(Vec2::ZERO, size, Mat4::ZERO, projection),
            Err(SceneError::DegenerateTransform(_))
        ));
        assert!(matches!(
            screen_to_ray(Vec2::ZERO, Vec2::new(0.0, 100.0), Mat4::IDENTITY, projection),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ray_plane_intersection() {
        let ray = axis_ray();
        let t = ray_plane_intersection(&ray, Vec3::new(0.0, 0.0, 4.0), Vec3::Z).unwrap();
        assert_relative_eq!(t, 4.0);

        // Parallel
        assert!(ray_plane_intersection(&ray, Vec3::new(1.0, 0.0, 0.0), Vec3::X).is_none());
        // Behind
        assert!(ray_plane_intersection(&ray, Vec3::new(0.0, 0.0, -1.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_drag_point_on_view_plane() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 2.0)).unwrap();
        let point = drag_point(&ray, Vec3::new(0.0, 0.0, 2.0), Vec3::Z).unwrap();
        assert!((point - Vec3::new(1.0, 0.0, 2.0)).length() < 1e-5);
    }
}
