//! Math utilities and types
//!
//! Provides the fundamental math types shared by the culling pipeline.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// The corner of the AABB furthest along a direction (the "positive vertex")
    pub fn positive_vertex(&self, direction: Vec3) -> Vec3 {
        Vec3::new(
            if direction.x >= 0.0 { self.max.x } else { self.min.x },
            if direction.y >= 0.0 { self.max.y } else { self.min.y },
            if direction.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }
}

/// A plane in normal-distance form: `normal · p + d = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal of the plane (points toward the "inside" half-space)
    pub normal: Vec3,
    /// Signed distance term
    pub d: f32,
}

impl Plane {
    /// Build a plane from raw coefficients, normalizing by the normal's magnitude
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let length = normal.norm();
        if length > 0.0 {
            Self {
                normal: normal / length,
                d: d / length,
            }
        } else {
            Self { normal, d }
        }
    }

    /// Signed distance from a point to the plane (positive = inside half-space)
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_positive_vertex_follows_direction() {
        let aabb = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        let v = aabb.positive_vertex(Vec3::new(1.0, -1.0, 1.0));
        assert_relative_eq!(v.x, 2.0);
        assert_relative_eq!(v.y, 0.0);
        assert_relative_eq!(v.z, 6.0);
    }

    #[test]
    fn test_plane_normalization() {
        let plane = Plane::from_coefficients(0.0, 0.0, 2.0, 4.0);
        assert_relative_eq!(plane.normal.norm(), 1.0);
        assert_relative_eq!(plane.signed_distance(Vec3::zeros()), 2.0);
    }
}
