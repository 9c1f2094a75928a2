//! Rigid transforms and axis-aligned bounds

use std::ops::Mul;

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// A rigid transform: rotation followed by translation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Orientation (unit quaternion)
    pub rotation: DQuat,
    /// Position of the frame origin
    pub translation: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
    };

    pub fn new(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation: rotation.normalize(),
            translation,
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation,
        }
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self::from_translation(DVec3::new(x, y, z))
    }

    pub fn from_rotation(rotation: DQuat) -> Self {
        Self::new(rotation, DVec3::ZERO)
    }

    /// Rotation of `angle` radians about `axis`
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        Self::from_rotation(DQuat::from_axis_angle(axis.normalize(), angle))
    }

    /// Build from position and roll/pitch/yaw (radians, XYZ order)
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        let rotation = DQuat::from_euler(EulerRot::XYZ, rpy[0], rpy[1], rpy[2]);
        Self::new(rotation, DVec3::from(xyz))
    }

    /// Compose: apply `other` first, then `self`
    pub fn mul_transform(&self, other: &Transform) -> Transform {
        Transform {
            rotation: (self.rotation * other.rotation).normalize(),
            translation: self.translation + self.rotation * other.translation,
        }
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.rotation * vector
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Approximate equality (quaternions `q` and `-q` are the same rotation)
    pub fn abs_diff_eq(&self, other: &Transform, epsilon: f64) -> bool {
        let same_rotation = self.rotation.abs_diff_eq(other.rotation, epsilon)
            || self.rotation.abs_diff_eq(-other.rotation, epsilon);
        same_rotation && self.translation.abs_diff_eq(other.translation, epsilon)
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.abs_diff_eq(&Transform::IDENTITY, epsilon)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.mul_transform(&rhs)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        self.mul_transform(rhs)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Smallest box containing all points (None for an empty slice)
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            bbox.min = bbox.min.min(*p);
            bbox.max = bbox.max.max(*p);
        }
        Some(bbox)
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlapping region, None if the boxes do not overlap with positive volume
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        let size = max - min;
        (size.x > 0.0 && size.y > 0.0 && size.z > 0.0).then_some(BoundingBox { min, max })
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after a rigid transform (re-bounded if rotated)
    pub fn transformed(&self, transform: &Transform) -> BoundingBox {
        let corners = self.corners().map(|c| transform.transform_point(c));
        let mut bbox = BoundingBox {
            min: corners[0],
            max: corners[0],
        };
        for c in &corners[1..] {
            bbox.min = bbox.min.min(*c);
            bbox.max = bbox.max.max(*c);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_compose_translations() {
        let a = Transform::from_xyz(1.0, 0.0, 0.0);
        let b = Transform::from_xyz(0.0, 2.0, 3.0);
        let c = a * b;
        assert_eq!(c.translation, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_compose_applies_right_first() {
        // rotate 90 deg about Z, then translate along X
        let rot = Transform::from_axis_angle(DVec3::Z, FRAC_PI_2);
        let shift = Transform::from_xyz(1.0, 0.0, 0.0);
        let p = (rot * shift).transform_point(DVec3::ZERO);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::from_xyz_rpy([1.0, -2.0, 0.5], [0.3, 0.2, -1.1]);
        assert!((t * t.inverse()).is_identity(1e-12));
        assert!((t.inverse() * t).is_identity(1e-12));
    }

    #[test]
    fn test_matrix_matches_point_transform() {
        let t = Transform::from_xyz_rpy([4.0, 5.0, 6.0], [0.1, 0.7, 0.2]);
        let p = DVec3::new(1.0, 2.0, 3.0);
        let via_mat = t.to_mat4().transform_point3(p);
        assert!(via_mat.abs_diff_eq(t.transform_point(p), 1e-12));
    }

    #[test]
    fn test_bbox_rotated_rebounds() {
        let bbox = BoundingBox::from_center_size(DVec3::ZERO, DVec3::new(2.0, 4.0, 6.0));
        let rotated = bbox.transformed(&Transform::from_axis_angle(DVec3::Z, FRAC_PI_2));
        assert_abs_diff_eq!(rotated.size().x, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rotated.size().y, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rotated.size().z, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BoundingBox::new(DVec3::ZERO, DVec3::splat(2.0));
        let b = BoundingBox::new(DVec3::splat(1.0), DVec3::splat(3.0));
        let c = BoundingBox::new(DVec3::splat(5.0), DVec3::splat(6.0));
        assert_eq!(
            a.intersection(&b),
            Some(BoundingBox::new(DVec3::splat(1.0), DVec3::splat(2.0)))
        );
        assert!(a.intersection(&c).is_none());
        assert!(a.union(&c).contains(&b));
    }
}
