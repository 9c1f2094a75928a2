//! Parametric component model
//!
//! Parts and assemblies are defined by classes with typed parameter
//! schemas. Assemblies place their children with constraints, resolved in
//! dependency order; geometry is built lazily through a
//! [`GeometryKernel`](pk_kernel::GeometryKernel) and shared across equal parts.

pub mod assembly;
pub mod cache;
pub mod component;
pub mod constants;
pub mod constraint;
pub mod error;
pub mod params;
pub mod part;
pub mod record;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembly::{
    Aggregate, Assembly, AssemblyClass, AssemblyClassBuilder, DefaultPlacement, Layout, Placements,
    StructureError,
};
pub use cache::{CacheSlot, CacheState, GeometryCache, SharedSolid};
pub use component::{
    BuildConfig, BuildContext, Component, ComponentKind, DetachedPolicy, GeometryErrorPolicy, NodeGeometry,
    WalkEntry,
};
pub use constraint::{BoxFace, Constraint, MateRef};
pub use error::{ModelError, ModelResult};
pub use params::{ParamArgs, ParamDescriptor, ParamKind, ParamSchema, ParamValue, ParameterError, Params};
pub use part::{GeometryBuildError, MakeError, Part, PartClass, PartClassBuilder};
pub use record::{ClassRegistry, ComponentRecord, Document, RecordError};

pub use pk_kernel::{BoundingBox, GeometryKernel, Solid, Transform};
