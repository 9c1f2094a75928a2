//! Aggregate geometry of an assembly

use std::sync::Arc;

use pk_kernel::{BooleanType, BoundingBox, Transform};

use super::Assembly;
use crate::cache::{SharedSolid, Stamped};
use crate::component::{BuildContext, Component, GeometryErrorPolicy};
use crate::constants::child_path;
use crate::error::{ModelError, ModelResult, path_label};
use crate::part::{GeometryBuildError, MakeError};

/// Union of all child solids, in the assembly's own frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    /// `None` when no child produced geometry
    pub solid: Option<SharedSolid>,
    /// Parts skipped under [`GeometryErrorPolicy::Placeholder`]
    pub failures: Vec<GeometryBuildError>,
}

impl Aggregate {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Assembly {
    /// Aggregate geometry, building children as needed
    pub fn geometry(&self, ctx: &BuildContext) -> ModelResult<Arc<Aggregate>> {
        self.aggregate_at(ctx, "")
    }

    pub(crate) fn aggregate_at(&self, ctx: &BuildContext, path: &str) -> ModelResult<Arc<Aggregate>> {
        // an aggregate with placeholders is only valid under the policy that allowed them
        let stamped = self.geometry.get_or_try_build_where(
            |built| built.built_under(ctx) || (built.built_by(ctx) && built.value.is_complete()),
            || self.aggregate(ctx, path).map(|a| Stamped::new(ctx, Arc::new(a))),
        )?;
        Ok(stamped.value)
    }

    fn aggregate(&self, ctx: &BuildContext, path: &str) -> ModelResult<Aggregate> {
        // structure and placements first, so a bad layout fails before any part builds
        let placements = self.placements_at(ctx, path)?;
        let placeholder = ctx.config().geometry_errors == GeometryErrorPolicy::Placeholder;

        let mut solid: Option<SharedSolid> = None;
        let mut failures = Vec::new();
        for child in &self.children {
            let child_path = child_path(path, &child.name);
            let built = match &child.component {
                Component::Part(part) => match part.build_solid(ctx, &child_path) {
                    Ok(s) => Some(s),
                    Err(e) if placeholder => {
                        failures.push(e);
                        None
                    }
                    Err(e) => return Err(e.into()),
                },
                Component::Assembly(sub) => match sub.aggregate_at(ctx, &child_path) {
                    Ok(agg) => {
                        failures.extend(agg.failures.iter().cloned());
                        agg.solid.clone()
                    }
                    Err(ModelError::GeometryBuild(e)) if placeholder => {
                        failures.push(e);
                        None
                    }
                    Err(e) => return Err(e),
                },
            };
            let Some(built) = built else { continue };

            let local = placements.local(&child.name).unwrap_or_default();
            let placed = if local == Transform::IDENTITY {
                built
            } else {
                let moved = ctx
                    .kernel()
                    .transform(&built, &local)
                    .map_err(|e| self.build_error(path, e))?;
                Arc::new(moved)
            };

            solid = Some(match solid {
                None => placed,
                Some(acc) => {
                    let merged = ctx
                        .kernel()
                        .boolean(&acc, &placed, BooleanType::Union)
                        .map_err(|e| self.build_error(path, e))?;
                    Arc::new(merged)
                }
            });
        }

        if !failures.is_empty() {
            tracing::warn!(
                path = path_label(path),
                failed = failures.len(),
                "Assembly built with placeholder children"
            );
        }
        Ok(Aggregate { solid, failures })
    }

    pub(crate) fn build_error(&self, path: &str, source: impl Into<MakeError>) -> ModelError {
        ModelError::GeometryBuild(GeometryBuildError {
            path: path.to_string(),
            class: self.class.name.clone(),
            params: self.params.clone(),
            source: source.into(),
        })
    }

    /// Bounds of the aggregate in the assembly's own frame
    pub fn bounding_box(&self, ctx: &BuildContext) -> ModelResult<BoundingBox> {
        self.local_bounds(ctx, "")
    }

    pub(crate) fn local_bounds(&self, ctx: &BuildContext, path: &str) -> ModelResult<BoundingBox> {
        let aggregate = self.aggregate_at(ctx, path)?;
        let solid = aggregate
            .solid
            .as_ref()
            .ok_or_else(|| self.build_error(path, MakeError::Invalid("assembly has no geometry".into())))?;
        ctx.kernel()
            .bounding_box(solid)
            .map_err(|e| self.build_error(path, e))
    }
}
