//! Geometry kernel trait definitions
//!
//! These traits define the interface the parametric layer uses to create and
//! combine solids. The kernel's internal representation never leaks out: callers
//! only ever hold opaque [`Solid`] handles.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::transform::{BoundingBox, Transform};

/// Error type for kernel operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Unknown solid: {0}")]
    UnknownSolid(Uuid),
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// An opaque handle to a solid owned by a kernel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
}

impl Solid {
    /// Create a new solid with the given ID
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// A 2D wire (loop of points) used as an extrusion or revolve profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire2D {
    /// Points defining the wire (in order)
    pub points: Vec<DVec2>,
    /// Whether the wire is closed
    pub closed: bool,
}

impl Wire2D {
    pub fn new(points: Vec<DVec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Create a rectangle wire
    pub fn rectangle(center: DVec2, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(
            vec![
                center + DVec2::new(-hw, -hh),
                center + DVec2::new(hw, -hh),
                center + DVec2::new(hw, hh),
                center + DVec2::new(-hw, hh),
            ],
            true,
        )
    }

    /// Create a circle wire (approximated with segments)
    pub fn circle(center: DVec2, radius: f64, segments: u32) -> Self {
        let points = (0..segments)
            .map(|i| {
                let angle = (i as f64 / segments as f64) * std::f64::consts::TAU;
                center + DVec2::new(angle.cos() * radius, angle.sin() * radius)
            })
            .collect();
        Self::new(points, true)
    }

    /// A profile must be closed and span at least three points
    pub fn is_valid_profile(&self) -> bool {
        self.closed && self.points.len() >= 3 && self.points.iter().all(|p| p.is_finite())
    }
}

/// Axis definition for revolve operations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis3D {
    /// Origin point of the axis
    pub origin: DVec3,
    /// Direction of the axis (normalized)
    pub direction: DVec3,
}

impl Axis3D {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn x() -> Self {
        Self::new(DVec3::ZERO, DVec3::X)
    }

    pub fn y() -> Self {
        Self::new(DVec3::ZERO, DVec3::Y)
    }

    pub fn z() -> Self {
        Self::new(DVec3::ZERO, DVec3::Z)
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

impl BooleanType {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanType::Union => "union",
            BooleanType::Subtract => "subtract",
            BooleanType::Intersect => "intersect",
        }
    }
}

/// The geometry kernel trait
///
/// Implementations create primitives, combine them, and answer the few
/// queries the placement engine needs (bounds). Every solid-producing call
/// returns a fresh handle; inputs are never mutated.
pub trait GeometryKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Create a box primitive centered at `center`
    fn create_box(&self, center: DVec3, size: DVec3) -> KernelResult<Solid>;

    /// Create a cylinder centered at `center`, extending `height / 2` each way along `axis`
    fn create_cylinder(
        &self,
        center: DVec3,
        radius: f64,
        height: f64,
        axis: DVec3,
    ) -> KernelResult<Solid>;

    /// Create a sphere primitive
    fn create_sphere(&self, center: DVec3, radius: f64) -> KernelResult<Solid>;

    /// Extrude a 2D profile along the +Z axis of `plane`
    ///
    /// # Arguments
    /// * `profile` - The closed profile, in the plane's XY coordinates
    /// * `plane` - Frame of the sketch plane
    /// * `distance` - Extrusion distance (negative extrudes along -Z)
    fn extrude(&self, profile: &Wire2D, plane: &Transform, distance: f64)
    -> KernelResult<Solid>;

    /// Revolve a 2D profile around an axis
    ///
    /// # Arguments
    /// * `profile` - The closed profile, in the plane's XY coordinates
    /// * `plane` - Frame of the sketch plane
    /// * `axis` - The rotation axis (world coordinates)
    /// * `angle` - The rotation angle in radians
    fn revolve(
        &self,
        profile: &Wire2D,
        plane: &Transform,
        axis: &Axis3D,
        angle: f64,
    ) -> KernelResult<Solid>;

    /// Perform a boolean operation on two solids
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> KernelResult<Solid>;

    /// Produce a copy of `solid` moved by a rigid transform
    fn transform(&self, solid: &Solid, transform: &Transform) -> KernelResult<Solid>;

    /// Axis-aligned bounds of a solid
    fn bounding_box(&self, solid: &Solid) -> KernelResult<BoundingBox>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> KernelResult<T> {
        Err(KernelError::KernelNotAvailable(
            "No geometry kernel available".into(),
        ))
    }
}

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn create_box(&self, _center: DVec3, _size: DVec3) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn create_cylinder(
        &self,
        _center: DVec3,
        _radius: f64,
        _height: f64,
        _axis: DVec3,
    ) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn create_sphere(&self, _center: DVec3, _radius: f64) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn extrude(
        &self,
        _profile: &Wire2D,
        _plane: &Transform,
        _distance: f64,
    ) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn revolve(
        &self,
        _profile: &Wire2D,
        _plane: &Transform,
        _axis: &Axis3D,
        _angle: f64,
    ) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn transform(&self, _solid: &Solid, _transform: &Transform) -> KernelResult<Solid> {
        Self::unavailable()
    }

    fn bounding_box(&self, _solid: &Solid) -> KernelResult<BoundingBox> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_kernel_rejects_everything() {
        let kernel = NullKernel;
        assert!(!kernel.is_available());
        assert!(matches!(
            kernel.create_box(DVec3::ZERO, DVec3::ONE),
            Err(KernelError::KernelNotAvailable(_))
        ));
        assert!(kernel.create_sphere(DVec3::ZERO, 1.0).is_err());
    }
}
