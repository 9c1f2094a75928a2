//! Shared fixtures for unit tests

use std::sync::Arc;

use glam::DVec3;
use pk_kernel::{EnvelopeKernel, Transform};

use crate::assembly::{AssemblyClass, Layout};
use crate::cache::GeometryCache;
use crate::component::{BuildConfig, BuildContext};
use crate::constraint::Constraint;
use crate::params::ParamKind;
use crate::part::PartClass;
use crate::record::ClassRegistry;

/// Box with its origin at the center of the bottom face and a `top` mate
pub(crate) fn box_class() -> Arc<PartClass> {
    PartClass::builder("Box")
        .param("length", ParamKind::positive_float(), 10.0, "size along X")
        .param("width", ParamKind::positive_float(), 10.0, "size along Y")
        .param("height", ParamKind::positive_float(), 10.0, "size along Z")
        .mate("top", |p| Ok(Transform::from_xyz(0.0, 0.0, p.float("height")?)))
        .build(|p, kernel| {
            let (l, w, h) = (p.float("length")?, p.float("width")?, p.float("height")?);
            Ok(kernel.create_box(DVec3::new(0.0, 0.0, h / 2.0), DVec3::new(l, w, h))?)
        })
        .unwrap()
}

/// Upright cylinder standing on its origin
pub(crate) fn cylinder_class() -> Arc<PartClass> {
    PartClass::builder("Cylinder")
        .param("radius", ParamKind::positive_float(), 2.0, "")
        .param("height", ParamKind::positive_float(), 5.0, "")
        .mate("top", |p| Ok(Transform::from_xyz(0.0, 0.0, p.float("height")?)))
        .build(|p, kernel| {
            let (r, h) = (p.float("radius")?, p.float("height")?);
            Ok(kernel.create_cylinder(DVec3::new(0.0, 0.0, h / 2.0), r, h, DVec3::Z)?)
        })
        .unwrap()
}

/// Part whose geometry function always fails in the kernel
pub(crate) fn failing_class() -> Arc<PartClass> {
    PartClass::builder("Broken")
        .build(|_, kernel| Ok(kernel.create_box(DVec3::ZERO, DVec3::ZERO)?))
        .unwrap()
}

/// Two boxes, `b` sitting `gap` above the top of `a`
pub(crate) fn stack_class(box_class: Arc<PartClass>) -> Arc<AssemblyClass> {
    AssemblyClass::builder("Stack")
        .param("gap", ParamKind::non_negative_float(), 5.0, "space between the boxes")
        .mate("top", |p| Ok(Transform::from_xyz(0.0, 0.0, 20.0 + p.float("gap")?)))
        .build(move |p| {
            let gap = p.float("gap")?;
            Ok(Layout::new()
                .component("a", box_class.with_defaults()?)
                .component("b", box_class.with_defaults()?)
                .constrain(Constraint::attach("b", ("a", "top"), DVec3::new(0.0, 0.0, gap))))
        })
        .unwrap()
}

pub(crate) fn registry() -> ClassRegistry {
    let boxes = box_class();
    let mut registry = ClassRegistry::new();
    registry.register_part(boxes.clone()).unwrap();
    registry.register_part(cylinder_class()).unwrap();
    registry.register_assembly(stack_class(boxes)).unwrap();
    registry
}

/// Route build logs to the test output, filtered by `RUST_LOG`
pub(crate) fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pk_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Fresh counting kernel with a private geometry cache
pub(crate) fn counting_context() -> (Arc<EnvelopeKernel>, BuildContext) {
    init_tracing();
    let kernel = Arc::new(EnvelopeKernel::new());
    let ctx = BuildContext::new(kernel.clone()).with_cache(Arc::new(GeometryCache::new()));
    (kernel, ctx)
}

pub(crate) fn counting_context_with(config: BuildConfig) -> (Arc<EnvelopeKernel>, BuildContext) {
    let (kernel, ctx) = counting_context();
    (kernel, ctx.with_config(config))
}
