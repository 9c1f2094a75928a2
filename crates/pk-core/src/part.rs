//! Parts: leaf components that own a single solid

use std::fmt;
use std::sync::Arc;

use pk_kernel::{BoundingBox, GeometryKernel, KernelError, Solid, Transform};
use thiserror::Error;
use uuid::Uuid;

use crate::cache::{CacheSlot, CacheState, SharedSolid, Stamped};
use crate::component::{BuildContext, DetachedPolicy, FrameSlot, MateFn, MateTable};
use crate::error::{ModelError, ModelResult, path_label};
use crate::params::{ParamArgs, ParamKind, ParamSchema, ParamSchemaBuilder, ParamValue, ParameterError, Params};

/// Error raised by a part's geometry function
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MakeError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("{0}")]
    Invalid(String),
}

/// A part's geometry could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Geometry build failed for {} ({class}({params})): {source}", path_label(.path))]
pub struct GeometryBuildError {
    /// Path of the failing component within the tree being built
    pub path: String,
    pub class: String,
    pub params: Params,
    pub source: MakeError,
}

/// Produces a part's solid from its parameters
pub type MakeFn = dyn Fn(&Params, &dyn GeometryKernel) -> Result<Solid, MakeError> + Send + Sync;

/// A part class: parameter schema, mates and geometry function
pub struct PartClass {
    name: String,
    doc: String,
    schema: ParamSchema,
    mates: MateTable,
    make: Box<MakeFn>,
}

impl PartClass {
    pub fn builder(name: impl Into<String>) -> PartClassBuilder {
        PartClassBuilder {
            name: name.into(),
            doc: String::new(),
            params: ParamSchema::builder(),
            mates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn mate_names(&self) -> Vec<&str> {
        self.mates.names()
    }

    /// Validate `args` and create an unbuilt part
    pub fn instantiate(self: &Arc<Self>, args: ParamArgs) -> Result<Part, ParameterError> {
        let params = self.schema.bind(&args)?;
        Ok(Part {
            id: Uuid::new_v4(),
            class: self.clone(),
            params,
            solid: CacheSlot::new(),
            frame: FrameSlot::default(),
        })
    }

    /// Part with every parameter at its default
    pub fn with_defaults(self: &Arc<Self>) -> Result<Part, ParameterError> {
        self.instantiate(ParamArgs::new())
    }
}

impl fmt::Debug for PartClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartClass")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("mates", &self.mates.names())
            .finish()
    }
}

pub struct PartClassBuilder {
    name: String,
    doc: String,
    params: ParamSchemaBuilder,
    mates: Vec<(String, Box<MateFn>)>,
}

impl PartClassBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<ParamValue>,
        doc: impl Into<String>,
    ) -> Self {
        self.params = self.params.param(name, kind, default, doc);
        self
    }

    pub fn required(mut self, name: impl Into<String>, kind: ParamKind, doc: impl Into<String>) -> Self {
        self.params = self.params.required(name, kind, doc);
        self
    }

    pub fn record(mut self, name: impl Into<String>, schema: ParamSchema, doc: impl Into<String>) -> Self {
        self.params = self.params.record(name, schema, doc);
        self
    }

    pub fn mate<F>(mut self, name: impl Into<String>, locate: F) -> Self
    where
        F: Fn(&Params) -> Result<Transform, ParameterError> + Send + Sync + 'static,
    {
        self.mates.push((name.into(), Box::new(locate)));
        self
    }

    /// Finish the class. Fails on bad defaults, duplicate parameters or
    /// duplicate mates.
    pub fn build<F>(self, make: F) -> ModelResult<Arc<PartClass>>
    where
        F: Fn(&Params, &dyn GeometryKernel) -> Result<Solid, MakeError> + Send + Sync + 'static,
    {
        let schema = self.params.build()?;
        let mut mates = MateTable::default();
        for (name, locate) in self.mates {
            mates.insert(name, locate)?;
        }
        Ok(Arc::new(PartClass {
            name: self.name,
            doc: self.doc,
            schema,
            mates,
            make: Box::new(make),
        }))
    }
}

/// A parametric leaf component
pub struct Part {
    id: Uuid,
    class: Arc<PartClass>,
    params: Params,
    solid: CacheSlot<Stamped<SharedSolid>>,
    frame: FrameSlot,
}

impl Part {
    /// Stable identity of this instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class(&self) -> &Arc<PartClass> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> CacheState {
        self.solid.state()
    }

    /// The part's solid in its own frame, built on first access
    ///
    /// The cached handle belongs to the kernel that built it; a context with
    /// another kernel gets that kernel's solid instead.
    pub fn solid(&self, ctx: &BuildContext) -> Result<SharedSolid, GeometryBuildError> {
        self.build_solid(ctx, "")
    }

    pub(crate) fn build_solid(&self, ctx: &BuildContext, path: &str) -> Result<SharedSolid, GeometryBuildError> {
        let stamped = self.solid.get_or_try_build_where(
            |built| built.built_by(ctx),
            || self.make_shared(ctx, path).map(|solid| Stamped::new(ctx, solid)),
        )?;
        Ok(stamped.value)
    }

    fn make_shared(&self, ctx: &BuildContext, path: &str) -> Result<SharedSolid, GeometryBuildError> {
        ctx.cache()
            .get_or_build(ctx.kernel_handle(), &self.class, &self.params, || {
                tracing::debug!(
                    class = %self.class.name,
                    params = %self.params,
                    path = path_label(path),
                    "Building part geometry"
                );
                (self.class.make)(&self.params, ctx.kernel())
                    .map(Arc::new)
                    .map_err(|source| {
                        tracing::warn!(
                            class = %self.class.name,
                            path = path_label(path),
                            "Part geometry failed: {}",
                            source
                        );
                        self.build_error(path, source)
                    })
            })
    }

    pub(crate) fn build_error(&self, path: &str, source: impl Into<MakeError>) -> GeometryBuildError {
        GeometryBuildError {
            path: path.to_string(),
            class: self.class.name.clone(),
            params: self.params.clone(),
            source: source.into(),
        }
    }

    /// Bounds of the solid in the part's own frame
    pub fn bounding_box(&self, ctx: &BuildContext) -> Result<BoundingBox, GeometryBuildError> {
        self.local_bounds(ctx, "")
    }

    pub(crate) fn local_bounds(&self, ctx: &BuildContext, path: &str) -> Result<BoundingBox, GeometryBuildError> {
        let solid = self.build_solid(ctx, path)?;
        ctx.kernel()
            .bounding_box(&solid)
            .map_err(|e| self.build_error(path, e))
    }

    /// Frame of a named mate relative to the part's origin
    pub fn mate(&self, name: &str) -> ModelResult<Transform> {
        match self.class.mates.locate(name, &self.params) {
            Some(frame) => Ok(frame?),
            None => Err(ModelError::UnknownMate {
                class: self.class.name.clone(),
                mate: name.to_string(),
            }),
        }
    }

    pub fn has_mate(&self, name: &str) -> bool {
        self.class.mates.contains(name)
    }

    /// Discard the cached solid. The shared content cache keeps its copy.
    pub fn invalidate(&self) -> bool {
        self.solid.invalidate()
    }

    pub fn world_transform(&self, policy: DetachedPolicy) -> ModelResult<Transform> {
        self.frame.resolve(policy, &self.class.name, self.id)
    }

    /// Place this part as a root
    pub fn attach_to_world(&self, frame: Transform) {
        self.frame.set(Some(frame));
    }

    pub fn detach(&self) {
        self.frame.set(None);
    }

    pub(crate) fn frame(&self) -> &FrameSlot {
        &self.frame
    }
}

impl Clone for Part {
    /// A copy with its own identity and frame that shares the built solid
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: self.class.clone(),
            params: self.params.clone(),
            solid: self.solid.clone(),
            frame: FrameSlot::default(),
        }
    }
}

/// Parts are equal when they are the same class with the same parameters
impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.class, &other.class) && self.params == other.params
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("id", &self.id)
            .field("class", &self.class.name)
            .field("params", &self.params)
            .field("state", &self.solid.state())
            .finish()
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class.name, self.params)
    }
}
