//! Tree traversal for display and export

use std::sync::Arc;

use pk_kernel::Transform;
use uuid::Uuid;

use super::{BuildContext, Component, ComponentKind, DetachedPolicy, GeometryErrorPolicy};
use crate::assembly::Aggregate;
use crate::cache::SharedSolid;
use crate::constants::child_path;
use crate::error::{ModelError, ModelResult};
use crate::params::Params;
use crate::part::GeometryBuildError;

/// Geometry attached to a walked node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeGeometry {
    /// A part's solid, in the part's own frame
    Solid(SharedSolid),
    /// An assembly's aggregate, in the assembly's own frame
    Aggregate(Arc<Aggregate>),
    /// A part that failed under the placeholder policy
    Failed(GeometryBuildError),
}

/// One node of a fully resolved tree
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Dotted path from the root (empty for the root)
    pub path: String,
    pub id: Uuid,
    pub class: String,
    pub kind: ComponentKind,
    pub params: Params,
    /// Frame of the node in world coordinates
    pub world: Transform,
    pub geometry: NodeGeometry,
}

impl WalkEntry {
    /// Nesting depth (root is 0)
    pub fn depth(&self) -> usize {
        if self.path.is_empty() {
            0
        } else {
            self.path.matches(crate::constants::PATH_SEPARATOR).count() + 1
        }
    }
}

impl Component {
    /// Resolve and build the whole tree, listing every node depth-first in
    /// insertion order with its world frame and geometry
    ///
    /// This is the read-only view exporters and viewers consume.
    pub fn walk(&self, ctx: &BuildContext) -> ModelResult<Vec<WalkEntry>> {
        let root = match (self.frame().get(), ctx.config().detached) {
            (Some(frame), _) => frame,
            (None, DetachedPolicy::Identity) => Transform::IDENTITY,
            (None, DetachedPolicy::Error) => {
                return Err(ModelError::Detached {
                    class: self.class_name().to_string(),
                    id: self.id(),
                });
            }
        };
        if let Component::Assembly(a) = self {
            a.resolve(ctx)?;
        }

        let mut entries = Vec::new();
        self.walk_into(ctx, "", root, &mut entries)?;
        Ok(entries)
    }

    fn walk_into(&self, ctx: &BuildContext, path: &str, world: Transform, out: &mut Vec<WalkEntry>) -> ModelResult<()> {
        let geometry = match self {
            Component::Part(p) => match p.build_solid(ctx, path) {
                Ok(solid) => NodeGeometry::Solid(solid),
                Err(e) if ctx.config().geometry_errors == GeometryErrorPolicy::Placeholder => NodeGeometry::Failed(e),
                Err(e) => return Err(e.into()),
            },
            Component::Assembly(a) => NodeGeometry::Aggregate(a.aggregate_at(ctx, path)?),
        };

        out.push(WalkEntry {
            path: path.to_string(),
            id: self.id(),
            class: self.class_name().to_string(),
            kind: self.kind(),
            params: self.params().clone(),
            world,
            geometry,
        });

        if let Component::Assembly(a) = self {
            let placements = a.placements_at(ctx, path)?;
            for (name, child) in a.children() {
                let local = placements.local(name).unwrap_or_default();
                child.walk_into(ctx, &child_path(path, name), world * local, out)?;
            }
        }
        Ok(())
    }

    /// Indented text rendering of the tree below `name`
    ///
    /// ```text
    /// bench
    ///  ├─ top
    ///  └○ legs
    ///      ├─ left
    ///      └─ right
    /// ```
    pub fn tree_string(&self, name: &str) -> String {
        let mut out = format!("{name}\n");
        self.tree_into(&mut out, " ");
        out
    }

    fn tree_into(&self, out: &mut String, prefix: &str) {
        let Component::Assembly(a) = self else {
            return;
        };
        let count = a.len();
        for (i, (name, child)) in a.children().enumerate() {
            let last = i + 1 == count;
            let branch = if last { '└' } else { '├' };
            let glyph = match child.kind() {
                ComponentKind::Part => '─',
                ComponentKind::Assembly => '○',
            };
            out.push_str(&format!("{prefix}{branch}{glyph} {name}\n"));
            let indent = if last { "    " } else { "│   " };
            child.tree_into(out, &format!("{prefix}{indent}"));
        }
    }
}
