//! Constraint evaluation and world-frame propagation

use std::sync::Arc;

use pk_kernel::Transform;

use super::{Assembly, plan};
use crate::cache::Stamped;
use crate::component::{BuildContext, Component, DetachedPolicy};
use crate::constants::child_path;
use crate::constraint::Constraint;
use crate::error::{ModelError, ModelResult, path_label};

/// Children's frames relative to their assembly, in placement order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placements {
    entries: Vec<(String, Transform)>,
}

impl Placements {
    pub fn local(&self, name: &str) -> Option<Transform> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Child names in the order they were placed
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Transform)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Assembly {
    /// Local frames of all children, solving constraints on first access
    pub fn placements(&self, ctx: &BuildContext) -> ModelResult<Arc<Placements>> {
        self.placements_at(ctx, "")
    }

    pub(crate) fn placements_at(&self, ctx: &BuildContext, path: &str) -> ModelResult<Arc<Placements>> {
        // face constraints measure built geometry, so placements belong to a kernel
        let stamped = self.placement.get_or_try_build_where(
            |built| built.built_by(ctx),
            || self.solve(ctx, path).map(|p| Stamped::new(ctx, Arc::new(p))),
        )?;
        Ok(stamped.value)
    }

    fn solve(&self, ctx: &BuildContext, path: &str) -> ModelResult<Placements> {
        let plan = plan::plan(&self.children, &self.constraints, self.class.placement).map_err(|source| {
            tracing::warn!(path = path_label(path), "Assembly structure rejected: {}", source);
            ModelError::Structure {
                path: path.to_string(),
                source,
            }
        })?;

        tracing::debug!(
            class = %self.class.name,
            path = path_label(path),
            order = ?plan.order,
            "Solving placements"
        );

        let mut local: Vec<Option<Transform>> = vec![None; self.children.len()];
        for &idx in &plan.order {
            let frame = match plan.placing[idx] {
                Some(ci) => self.evaluate(&self.constraints[ci], &local, ctx, path)?,
                None => Transform::IDENTITY,
            };
            local[idx] = Some(frame);
        }

        let entries = plan
            .order
            .iter()
            .map(|&idx| (self.children[idx].name.clone(), local[idx].unwrap_or_default()))
            .collect();
        Ok(Placements { entries })
    }

    /// Local frame of the constraint's target
    fn evaluate(
        &self,
        constraint: &Constraint,
        local: &[Option<Transform>],
        ctx: &BuildContext,
        path: &str,
    ) -> ModelResult<Transform> {
        // dependencies come earlier in the plan order
        let placed = |idx: usize| -> ModelResult<Transform> {
            local[idx].ok_or_else(|| ModelError::NotFound(child_path(path, &self.children[idx].name)))
        };

        let target = constraint.target();
        let (_, target_component) = self.sibling(path, &target.component)?;
        let target_mate = target_component.mate(target.mate_name())?;

        let anchor = match constraint {
            Constraint::Fixed { at, .. } => *at,
            Constraint::Coincident { to, offset, .. } => {
                let (idx, source) = self.sibling(path, &to.component)?;
                placed(idx)? * source.mate(to.mate_name())? * *offset
            }
            Constraint::OnFace { to, face, offset, .. } => {
                let (idx, source) = self.sibling(path, to)?;
                let bounds = source.local_bounds(ctx, &child_path(path, to))?;
                placed(idx)? * face.frame(&bounds) * *offset
            }
        };

        Ok(anchor * target_mate.inverse())
    }

    fn sibling(&self, path: &str, name: &str) -> ModelResult<(usize, &Component)> {
        let idx = self
            .child_index(name)
            .ok_or_else(|| ModelError::NotFound(child_path(path, name)))?;
        Ok((idx, &self.children[idx].component))
    }

    /// Solve placements through the whole subtree and push world frames
    /// down to every descendant
    ///
    /// A detached root still solves its placements but only pushes frames
    /// when the context's detached policy is `Identity`.
    pub fn resolve(&self, ctx: &BuildContext) -> ModelResult<()> {
        let world = match (self.frame.get(), ctx.config().detached) {
            (Some(frame), _) => Some(frame),
            (None, DetachedPolicy::Identity) => Some(Transform::IDENTITY),
            (None, DetachedPolicy::Error) => None,
        };
        self.resolve_at(ctx, "", world)
    }

    pub(crate) fn resolve_at(&self, ctx: &BuildContext, path: &str, world: Option<Transform>) -> ModelResult<()> {
        let placements = self.placements_at(ctx, path)?;
        for child in &self.children {
            let local = placements.local(&child.name).unwrap_or_default();
            let child_world = world.map(|w| w * local);
            if child_world.is_some() {
                child.component.frame().set(child_world);
            }
            if let Component::Assembly(sub) = &child.component {
                sub.resolve_at(ctx, &child_path(path, &child.name), child_world)?;
            }
        }
        Ok(())
    }

    /// Resolve, then return the world frame of the component at `path`
    pub fn world_transform_at(&self, ctx: &BuildContext, path: &str) -> ModelResult<Transform> {
        self.resolve(ctx)?;
        let component = self
            .find(path)
            .ok_or_else(|| ModelError::NotFound(path.to_string()))?;
        component.world_transform(ctx.config().detached)
    }
}
