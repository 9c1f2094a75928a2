//! Envelope kernel backend
//!
//! A lightweight reference kernel that represents every solid by its
//! axis-aligned bounding envelope. It is exact for boxes and unions of boxes,
//! conservative for everything else, and counts every call it receives so
//! callers can verify how much kernel work a build performed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DVec3;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{Axis3D, BooleanType, GeometryKernel, KernelError, KernelResult, Solid, Wire2D};
use crate::transform::{BoundingBox, Transform};

/// Bounding-envelope kernel with call counters
#[derive(Debug, Default)]
pub struct EnvelopeKernel {
    /// Storage for solid envelopes (keyed by UUID)
    envelopes: Mutex<HashMap<Uuid, BoundingBox>>,
    /// Total number of calls received
    calls: AtomicUsize,
    /// Calls per operation name
    per_op: Mutex<HashMap<&'static str, usize>>,
}

impl EnvelopeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of kernel calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls made to one operation (e.g. `"create_box"`)
    pub fn calls_to(&self, op: &str) -> usize {
        self.per_op.lock().get(op).copied().unwrap_or(0)
    }

    /// Number of solids currently stored
    pub fn solid_count(&self) -> usize {
        self.envelopes.lock().len()
    }

    fn record(&self, op: &'static str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_op.lock().entry(op).or_insert(0) += 1;
        tracing::trace!(op, "envelope kernel call");
    }

    /// Store an envelope and return a Solid reference
    fn store(&self, bbox: BoundingBox) -> Solid {
        let id = Uuid::new_v4();
        self.envelopes.lock().insert(id, bbox);
        Solid::new(id)
    }

    fn envelope(&self, solid: &Solid) -> KernelResult<BoundingBox> {
        self.envelopes
            .lock()
            .get(&solid.id)
            .copied()
            .ok_or(KernelError::UnknownSolid(solid.id))
    }

    /// Envelope of a circle of `radius` around `axis` passing through `center`
    fn disc_envelope(center: DVec3, axis: DVec3, radius: f64) -> BoundingBox {
        let extent = DVec3::new(
            (1.0 - axis.x * axis.x).max(0.0).sqrt(),
            (1.0 - axis.y * axis.y).max(0.0).sqrt(),
            (1.0 - axis.z * axis.z).max(0.0).sqrt(),
        ) * radius;
        BoundingBox::new(center - extent, center + extent)
    }

    fn check_positive(what: &str, value: f64) -> KernelResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(KernelError::InvalidGeometry(format!(
                "{what} must be positive, got {value}"
            )))
        }
    }
}

impl GeometryKernel for EnvelopeKernel {
    fn name(&self) -> &str {
        "envelope"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_box(&self, center: DVec3, size: DVec3) -> KernelResult<Solid> {
        self.record("create_box");
        Self::check_positive("box length", size.x)?;
        Self::check_positive("box width", size.y)?;
        Self::check_positive("box height", size.z)?;
        Ok(self.store(BoundingBox::from_center_size(center, size)))
    }

    fn create_cylinder(
        &self,
        center: DVec3,
        radius: f64,
        height: f64,
        axis: DVec3,
    ) -> KernelResult<Solid> {
        self.record("create_cylinder");
        Self::check_positive("cylinder radius", radius)?;
        Self::check_positive("cylinder height", height)?;
        let axis = axis.try_normalize().ok_or_else(|| {
            KernelError::InvalidGeometry("cylinder axis must be non-zero".into())
        })?;
        let half = axis * (height / 2.0);
        let bottom = Self::disc_envelope(center - half, axis, radius);
        let top = Self::disc_envelope(center + half, axis, radius);
        Ok(self.store(bottom.union(&top)))
    }

    fn create_sphere(&self, center: DVec3, radius: f64) -> KernelResult<Solid> {
        self.record("create_sphere");
        Self::check_positive("sphere radius", radius)?;
        Ok(self.store(BoundingBox::from_center_size(
            center,
            DVec3::splat(radius * 2.0),
        )))
    }

    fn extrude(
        &self,
        profile: &Wire2D,
        plane: &Transform,
        distance: f64,
    ) -> KernelResult<Solid> {
        self.record("extrude");
        if !profile.is_valid_profile() {
            return Err(KernelError::InvalidProfile(
                "extrusion profile must be a closed loop of at least 3 points".into(),
            ));
        }
        if !distance.is_finite() || distance == 0.0 {
            return Err(KernelError::InvalidGeometry(format!(
                "extrusion distance must be non-zero, got {distance}"
            )));
        }
        let points: Vec<DVec3> = profile
            .points
            .iter()
            .flat_map(|p| {
                [
                    plane.transform_point(p.extend(0.0)),
                    plane.transform_point(p.extend(distance)),
                ]
            })
            .collect();
        BoundingBox::from_points(&points)
            .map(|bbox| self.store(bbox))
            .ok_or_else(|| KernelError::InvalidProfile("empty profile".into()))
    }

    fn revolve(
        &self,
        profile: &Wire2D,
        plane: &Transform,
        axis: &Axis3D,
        angle: f64,
    ) -> KernelResult<Solid> {
        self.record("revolve");
        if !profile.is_valid_profile() {
            return Err(KernelError::InvalidProfile(
                "revolve profile must be a closed loop of at least 3 points".into(),
            ));
        }
        if !(angle > 0.0 && angle <= std::f64::consts::TAU) {
            return Err(KernelError::InvalidGeometry(format!(
                "revolve angle must be in (0, 2π], got {angle}"
            )));
        }
        let direction = axis.direction.try_normalize().ok_or_else(|| {
            KernelError::InvalidGeometry("revolve axis must be non-zero".into())
        })?;

        // Conservative: bound the full revolution of every profile point
        let mut bbox: Option<BoundingBox> = None;
        for p in &profile.points {
            let world = plane.transform_point(p.extend(0.0));
            let along = (world - axis.origin).dot(direction);
            let foot = axis.origin + direction * along;
            let radius = (world - foot).length();
            let disc = Self::disc_envelope(foot, direction, radius);
            bbox = Some(bbox.map_or(disc, |b| b.union(&disc)));
        }
        let bbox = bbox.ok_or_else(|| KernelError::InvalidProfile("empty profile".into()))?;
        if bbox.size().min_element() <= 0.0 {
            return Err(KernelError::InvalidGeometry(
                "revolved profile has no volume".into(),
            ));
        }
        Ok(self.store(bbox))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> KernelResult<Solid> {
        self.record("boolean");
        let ea = self.envelope(a)?;
        let eb = self.envelope(b)?;
        let result = match op {
            BooleanType::Union => ea.union(&eb),
            BooleanType::Intersect => ea.intersection(&eb).ok_or_else(|| {
                KernelError::BooleanFailed("intersection of disjoint solids is empty".into())
            })?,
            BooleanType::Subtract => {
                if eb.contains(&ea) {
                    return Err(KernelError::BooleanFailed(
                        "subtraction removes the whole solid".into(),
                    ));
                }
                ea
            }
        };
        Ok(self.store(result))
    }

    fn transform(&self, solid: &Solid, transform: &Transform) -> KernelResult<Solid> {
        self.record("transform");
        let envelope = self.envelope(solid)?;
        Ok(self.store(envelope.transformed(transform)))
    }

    fn bounding_box(&self, solid: &Solid) -> KernelResult<BoundingBox> {
        self.record("bounding_box");
        self.envelope(solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::DVec2;

    #[test]
    fn test_box_envelope() {
        let kernel = EnvelopeKernel::new();
        let solid = kernel
            .create_box(DVec3::new(0.0, 0.0, 5.0), DVec3::new(2.0, 4.0, 10.0))
            .unwrap();
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_eq!(bbox.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, DVec3::new(1.0, 2.0, 10.0));
    }

    #[test]
    fn test_degenerate_box_rejected() {
        let kernel = EnvelopeKernel::new();
        let err = kernel
            .create_box(DVec3::ZERO, DVec3::new(1.0, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidGeometry(_)));
        // failed calls are still counted
        assert_eq!(kernel.call_count(), 1);
        assert_eq!(kernel.solid_count(), 0);
    }

    #[test]
    fn test_cylinder_along_z() {
        let kernel = EnvelopeKernel::new();
        let solid = kernel
            .create_cylinder(DVec3::ZERO, 1.0, 4.0, DVec3::Z)
            .unwrap();
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_abs_diff_eq!(bbox.min.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.max.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.min.z, -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.max.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_extrude_rectangle() {
        let kernel = EnvelopeKernel::new();
        let profile = Wire2D::rectangle(DVec2::ZERO, 2.0, 2.0);
        let solid = kernel
            .extrude(&profile, &Transform::from_xyz(0.0, 0.0, 1.0), 3.0)
            .unwrap();
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_eq!(bbox.min, DVec3::new(-1.0, -1.0, 1.0));
        assert_eq!(bbox.max, DVec3::new(1.0, 1.0, 4.0));
    }

    #[test]
    fn test_open_profile_rejected() {
        let kernel = EnvelopeKernel::new();
        let profile = Wire2D::new(vec![DVec2::ZERO, DVec2::X, DVec2::Y], false);
        let err = kernel
            .extrude(&profile, &Transform::IDENTITY, 1.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidProfile(_)));
    }

    #[test]
    fn test_revolve_bounds() {
        let kernel = EnvelopeKernel::new();
        // square profile in XZ plane offset from the Z axis
        let plane = Transform::from_axis_angle(DVec3::X, std::f64::consts::FRAC_PI_2);
        let profile = Wire2D::rectangle(DVec2::new(3.0, 0.5), 2.0, 1.0);
        let solid = kernel
            .revolve(&profile, &plane, &Axis3D::z(), std::f64::consts::TAU)
            .unwrap();
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_abs_diff_eq!(bbox.max.x, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.min.y, -4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.size().z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_boolean_ops() {
        let kernel = EnvelopeKernel::new();
        let a = kernel.create_box(DVec3::ZERO, DVec3::splat(2.0)).unwrap();
        let b = kernel
            .create_box(DVec3::new(1.0, 0.0, 0.0), DVec3::splat(2.0))
            .unwrap();
        let far = kernel
            .create_box(DVec3::new(10.0, 0.0, 0.0), DVec3::splat(2.0))
            .unwrap();

        let union = kernel.boolean(&a, &b, BooleanType::Union).unwrap();
        let bbox = kernel.bounding_box(&union).unwrap();
        assert_eq!(bbox.min.x, -1.0);
        assert_eq!(bbox.max.x, 2.0);

        let common = kernel.boolean(&a, &b, BooleanType::Intersect).unwrap();
        let bbox = kernel.bounding_box(&common).unwrap();
        assert_eq!(bbox.min.x, 0.0);
        assert_eq!(bbox.max.x, 1.0);

        assert!(kernel.boolean(&a, &far, BooleanType::Intersect).is_err());
        assert!(kernel.boolean(&a, &a, BooleanType::Subtract).is_err());
    }

    #[test]
    fn test_transform_moves_envelope() {
        let kernel = EnvelopeKernel::new();
        let a = kernel.create_box(DVec3::ZERO, DVec3::splat(2.0)).unwrap();
        let moved = kernel
            .transform(&a, &Transform::from_xyz(0.0, 0.0, 5.0))
            .unwrap();
        assert_ne!(a.id, moved.id);
        let bbox = kernel.bounding_box(&moved).unwrap();
        assert_eq!(bbox.center(), DVec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_call_counters() {
        let kernel = EnvelopeKernel::new();
        let a = kernel.create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let _ = kernel.create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let _ = kernel.bounding_box(&a).unwrap();
        assert_eq!(kernel.call_count(), 3);
        assert_eq!(kernel.calls_to("create_box"), 2);
        assert_eq!(kernel.calls_to("bounding_box"), 1);
        assert_eq!(kernel.calls_to("boolean"), 0);
    }

    #[test]
    fn test_unknown_solid() {
        let kernel = EnvelopeKernel::new();
        let stranger = Solid::new(Uuid::new_v4());
        assert_eq!(
            kernel.bounding_box(&stranger),
            Err(KernelError::UnknownSolid(stranger.id))
        );
    }
}
