//! Geometric primitives: 3-D points and axis-aligned bounding boxes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point (or vector) in 3-D space, micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1).
    #[must_use]
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        Point3 {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
            z: (other.z - self.z).mul_add(t, self.z),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    /// A symmetric cube centered on `center` with half-extent `radius`.
    #[must_use]
    pub fn cube(center: Point3, radius: f64) -> Self {
        Self {
            min: Point3::new(center.x - radius, center.y - radius, center.z - radius),
            max: Point3::new(center.x + radius, center.y + radius, center.z + radius),
        }
    }

    /// Expands the box to enclose the sphere at `center` with `radius`.
    pub fn include_sphere(&mut self, center: &Point3, radius: f64) {
        self.min.x = self.min.x.min(center.x - radius);
        self.min.y = self.min.y.min(center.y - radius);
        self.min.z = self.min.z.min(center.z - radius);
        self.max.x = self.max.x.max(center.x + radius);
        self.max.y = self.max.y.max(center.y + radius);
        self.max.z = self.max.z.max(center.z + radius);
    }

    /// Returns true if `point` lies inside the box (inclusive).
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Point3 {
        Point3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(5.0, 6.0, 7.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.x, 3.0);
        assert_relative_eq!(mid.y, 4.0);
        assert_relative_eq!(mid.z, 5.0);
    }

    #[test]
    fn test_bounding_box_sphere_union() {
        let mut bbox = BoundingBox::cube(Point3::new(0.0, 0.0, 0.0), 1.0);
        bbox.include_sphere(&Point3::new(10.0, 0.0, 0.0), 2.0);
        assert_relative_eq!(bbox.max.x, 12.0);
        assert_relative_eq!(bbox.min.x, -1.0);
        assert!(bbox.contains(&Point3::new(11.0, 0.5, -0.5)));
        assert!(!bbox.contains(&Point3::new(13.0, 0.0, 0.0)));
    }
}
