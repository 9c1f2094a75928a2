//! Components: the common face of parts and assemblies
//!
//! A [`Component`] is either a [`Part`] (leaf with one solid) or an
//! [`Assembly`] (named children placed by constraints). Both carry an
//! immutable parameter set, lazily built caches and a world frame that
//! the owning parent fills in during resolution.

mod context;
mod frame;
mod mate;
mod walk;

pub use context::{BuildConfig, BuildContext, DetachedPolicy, GeometryErrorPolicy};
pub(crate) use frame::FrameSlot;
pub use mate::MateFn;
pub(crate) use mate::MateTable;
pub use walk::{NodeGeometry, WalkEntry};

use std::fmt;
use std::sync::Arc;

use pk_kernel::{BoundingBox, Transform};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assembly::Assembly;
use crate::cache::{CacheState, SharedSolid};
use crate::error::ModelResult;
use crate::params::Params;
use crate::part::Part;

/// Whether a component is a leaf or composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Part,
    Assembly,
}

/// A node in a component tree
#[derive(Debug, Clone)]
pub enum Component {
    Part(Part),
    Assembly(Assembly),
}

impl Component {
    pub fn id(&self) -> Uuid {
        match self {
            Component::Part(p) => p.id(),
            Component::Assembly(a) => a.id(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Part(_) => ComponentKind::Part,
            Component::Assembly(_) => ComponentKind::Assembly,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Component::Part(p) => p.class_name(),
            Component::Assembly(a) => a.class_name(),
        }
    }

    pub fn params(&self) -> &Params {
        match self {
            Component::Part(p) => p.params(),
            Component::Assembly(a) => a.params(),
        }
    }

    pub fn as_part(&self) -> Option<&Part> {
        match self {
            Component::Part(p) => Some(p),
            Component::Assembly(_) => None,
        }
    }

    pub fn as_assembly(&self) -> Option<&Assembly> {
        match self {
            Component::Assembly(a) => Some(a),
            Component::Part(_) => None,
        }
    }

    /// Build state: a part's solid, an assembly's placements
    pub fn state(&self) -> CacheState {
        match self {
            Component::Part(p) => p.state(),
            Component::Assembly(a) => a.state(),
        }
    }

    pub fn mate(&self, name: &str) -> ModelResult<Transform> {
        match self {
            Component::Part(p) => p.mate(name),
            Component::Assembly(a) => a.mate(name),
        }
    }

    pub fn has_mate(&self, name: &str) -> bool {
        match self {
            Component::Part(p) => p.has_mate(name),
            Component::Assembly(a) => a.has_mate(name),
        }
    }

    /// Clear this component's own caches (not its descendants')
    pub fn invalidate(&self) -> bool {
        match self {
            Component::Part(p) => p.invalidate(),
            Component::Assembly(a) => a.invalidate(),
        }
    }

    /// Fully resolve placements and build all geometry
    pub fn build(&self, ctx: &BuildContext) -> ModelResult<()> {
        match self {
            Component::Part(p) => p.solid(ctx).map(|_| ()).map_err(Into::into),
            Component::Assembly(a) => {
                a.resolve(ctx)?;
                a.geometry(ctx).map(|_| ())
            }
        }
    }

    /// Geometry in the component's own frame (`None` for an empty assembly)
    pub fn local_geometry(&self, ctx: &BuildContext) -> ModelResult<Option<SharedSolid>> {
        match self {
            Component::Part(p) => Ok(Some(p.solid(ctx)?)),
            Component::Assembly(a) => Ok(a.geometry(ctx)?.solid.clone()),
        }
    }

    /// Geometry moved into world coordinates
    pub fn world_geometry(&self, ctx: &BuildContext) -> ModelResult<Option<SharedSolid>> {
        if let Component::Assembly(a) = self {
            a.resolve(ctx)?;
        }
        let world = self.world_transform(ctx.config().detached)?;
        let Some(solid) = self.local_geometry(ctx)? else {
            return Ok(None);
        };
        if world == Transform::IDENTITY {
            return Ok(Some(solid));
        }
        let moved = match self {
            Component::Part(p) => ctx.kernel().transform(&solid, &world).map_err(|e| p.build_error("", e))?,
            Component::Assembly(a) => ctx.kernel().transform(&solid, &world).map_err(|e| a.build_error("", e))?,
        };
        Ok(Some(Arc::new(moved)))
    }

    pub(crate) fn local_bounds(&self, ctx: &BuildContext, path: &str) -> ModelResult<BoundingBox> {
        match self {
            Component::Part(p) => Ok(p.local_bounds(ctx, path)?),
            Component::Assembly(a) => a.local_bounds(ctx, path),
        }
    }

    /// World frame pushed by the last resolve of the tree
    ///
    /// Does not resolve. A child of an attached root has no frame until the
    /// root is resolved, and loses it again when an edit or a re-attach
    /// makes it stale; `policy` decides what is returned then.
    /// [`Assembly::world_transform_at`] resolves and reads in one step.
    pub fn world_transform(&self, policy: DetachedPolicy) -> ModelResult<Transform> {
        match self {
            Component::Part(p) => p.world_transform(policy),
            Component::Assembly(a) => a.world_transform(policy),
        }
    }

    /// Place this component as a root
    pub fn attach_to_world(&self, frame: Transform) {
        match self {
            Component::Part(p) => p.attach_to_world(frame),
            Component::Assembly(a) => a.attach_to_world(frame),
        }
    }

    /// Forget the world frame of this component and its descendants
    pub fn detach(&self) {
        match self {
            Component::Part(p) => p.detach(),
            Component::Assembly(a) => a.detach(),
        }
    }

    pub(crate) fn frame(&self) -> &FrameSlot {
        match self {
            Component::Part(p) => p.frame(),
            Component::Assembly(a) => a.frame(),
        }
    }

    /// Component at a dotted path (empty path is `self`)
    pub fn find(&self, path: &str) -> Option<&Component> {
        if path.is_empty() {
            return Some(self);
        }
        match self {
            Component::Assembly(a) => a.find(path),
            Component::Part(_) => None,
        }
    }
}

impl From<Part> for Component {
    fn from(part: Part) -> Self {
        Component::Part(part)
    }
}

impl From<Assembly> for Component {
    fn from(assembly: Assembly) -> Self {
        Component::Assembly(assembly)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Part(p) => fmt::Display::fmt(p, f),
            Component::Assembly(a) => fmt::Display::fmt(a, f),
        }
    }
}
