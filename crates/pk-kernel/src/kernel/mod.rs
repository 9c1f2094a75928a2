//! Geometry kernel abstraction

mod envelope;
mod traits;

use std::sync::{Arc, LazyLock};

pub use envelope::EnvelopeKernel;
pub use traits::{
    Axis3D, BooleanType, GeometryKernel, KernelError, KernelResult, NullKernel, Solid, Wire2D,
};

static DEFAULT: LazyLock<Arc<dyn GeometryKernel>> = LazyLock::new(|| Arc::new(EnvelopeKernel::new()));

/// Get the default geometry kernel
///
/// The envelope backend is always compiled in, so it is the default. Every
/// call returns the same shared instance.
pub fn default_kernel() -> Arc<dyn GeometryKernel> {
    DEFAULT.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kernel_is_shared() {
        let a = default_kernel();
        let b = default_kernel();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "envelope");
    }
}
