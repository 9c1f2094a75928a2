//! Geometry Kernel Boundary
//!
//! This crate provides:
//! - The `GeometryKernel` trait the parametric layer builds solids through
//! - Opaque `Solid` handles and kernel error types
//! - Rigid `Transform` and axis-aligned `BoundingBox` values
//! - `NullKernel` (rejects everything) and `EnvelopeKernel` (bounding-envelope
//!   reference backend with call counters)

pub mod kernel;
pub mod transform;

// Re-exports for convenience
pub use kernel::{
    Axis3D, BooleanType, EnvelopeKernel, GeometryKernel, KernelError, KernelResult, NullKernel,
    Solid, Wire2D, default_kernel,
};
pub use transform::{BoundingBox, Transform};
