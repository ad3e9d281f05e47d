//! View-frustum plane extraction and intersection tests

use crate::foundation::math::{Aabb, Mat4, Plane, Point3};
use crate::world::GridCoordinate;

/// Extracts the six clip planes from a projection-view matrix and tests
/// points, spheres, and boxes against them.
///
/// Until [`update`](Self::update) has run for the current frame every test
/// reports "inside": culling against stale or missing frustum data makes
/// geometry vanish, so an invalid frustum must never cull.
pub struct FrustumCuller {
    planes: Option<[Plane; 6]>,
}

impl Default for FrustumCuller {
    fn default() -> Self {
        Self::new()
    }
}

impl FrustumCuller {
    /// Create a culler with no frustum data; all tests pass until `update`.
    pub fn new() -> Self {
        Self { planes: None }
    }

    /// Rebuild the six planes from the current projection and view
    /// matrices. Uses the row addition/subtraction extraction on the
    /// combined matrix, normalizing each plane.
    pub fn update(&mut self, projection: &Mat4, view: &Mat4) {
        let m = projection * view;
        let row = |i: usize| {
            [m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]]
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let plane = |base: [f32; 4], sign: f32, other: [f32; 4]| {
            Plane::from_coefficients(
                base[0] + sign * other[0],
                base[1] + sign * other[1],
                base[2] + sign * other[2],
                base[3] + sign * other[3],
            )
        };
        self.planes = Some([
            plane(r3, 1.0, r0),  // left
            plane(r3, -1.0, r0), // right
            plane(r3, 1.0, r1),  // bottom
            plane(r3, -1.0, r1), // top
            plane(r3, 1.0, r2),  // near
            plane(r3, -1.0, r2), // far
        ]);
    }

    /// Discard the current planes; tests pass until the next `update`.
    pub fn invalidate(&mut self) {
        self.planes = None;
    }

    /// Whether valid frustum planes are currently held.
    pub fn is_valid(&self) -> bool {
        self.planes.is_some()
    }

    /// Whether a point lies inside (or on) the frustum.
    pub fn test_point(&self, point: Point3) -> bool {
        self.test_sphere(point, 0.0)
    }

    /// Whether a sphere intersects the frustum.
    pub fn test_sphere(&self, center: Point3, radius: f32) -> bool {
        let Some(planes) = &self.planes else {
            return true;
        };
        let center = center.coords;
        planes
            .iter()
            .all(|plane| plane.signed_distance(center) >= -radius)
    }

    /// Whether an axis-aligned box intersects the frustum. The box is
    /// outside a plane when its positive vertex (the corner furthest
    /// along the plane normal) is still behind it.
    pub fn test_aabb(&self, aabb: &Aabb) -> bool {
        let Some(planes) = &self.planes else {
            return true;
        };
        planes
            .iter()
            .all(|plane| plane.signed_distance(aabb.positive_vertex(plane.normal)) >= 0.0)
    }

    /// Whether a unit grid cell intersects the frustum.
    pub fn test_cell(&self, cell: GridCoordinate) -> bool {
        self.test_aabb(&cell.cell_aabb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn looking_down_negative_z() -> FrustumCuller {
        let projection = Mat4::new_perspective(16.0 / 9.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0);
        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, -1.0),
            &Vec3::new(0.0, 1.0, 0.0),
        );
        let mut culler = FrustumCuller::new();
        culler.update(&projection, &view);
        culler
    }

    #[test]
    fn test_everything_inside_before_first_update() {
        let culler = FrustumCuller::new();
        assert!(culler.test_point(Point3::new(1.0e6, 0.0, 0.0)));
        assert!(culler.test_sphere(Point3::new(0.0, -1.0e6, 0.0), 1.0));
        assert!(culler.test_cell(GridCoordinate::new(1_000_000, 0, 0)));
    }

    #[test]
    fn test_point_ahead_is_inside_point_behind_is_outside() {
        let culler = looking_down_negative_z();
        assert!(culler.test_point(Point3::new(0.0, 0.0, -10.0)));
        assert!(!culler.test_point(Point3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_eye_position_reports_inside() {
        let culler = looking_down_negative_z();
        // The eye sits just behind the near plane; any sphere that covers
        // the near-plane gap must not be culled.
        assert!(culler.test_sphere(Point3::new(0.0, 0.0, 0.0), 0.5));
        assert!(culler.test_point(Point3::new(0.0, 0.0, -0.2)));
    }

    #[test]
    fn test_box_behind_far_plane_is_outside() {
        let culler = looking_down_negative_z();
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -210.0), Vec3::new(1.0, 1.0, -205.0));
        assert!(!culler.test_aabb(&aabb));
    }

    #[test]
    fn test_box_straddling_a_plane_is_inside() {
        let culler = looking_down_negative_z();
        // Straddles the far plane at z = -100
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -105.0), Vec3::new(1.0, 1.0, -95.0));
        assert!(culler.test_aabb(&aabb));
    }

    #[test]
    fn test_invalidate_restores_fail_open() {
        let mut culler = looking_down_negative_z();
        assert!(!culler.test_point(Point3::new(0.0, 0.0, 10.0)));
        culler.invalidate();
        assert!(culler.test_point(Point3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_sphere_partially_intersecting_counts_as_inside() {
        let culler = looking_down_negative_z();
        // Center beyond the far plane, radius reaches back inside
        assert!(culler.test_sphere(Point3::new(0.0, 0.0, -103.0), 5.0));
        assert!(!culler.test_sphere(Point3::new(0.0, 0.0, -110.0), 5.0));
    }
}
