//! Subtree replacement and targeted invalidation

use super::{Assembly, plan};
use crate::component::Component;
use crate::constants::{PATH_SEPARATOR, child_path};
use crate::error::{ModelError, ModelResult};

impl Assembly {
    /// Swap the component at `path` for `component`, returning the old one
    ///
    /// The new layout is checked before anything changes; on error the tree
    /// is left untouched. On success the placement and geometry caches of
    /// every ancestor up to `self` are invalidated. Siblings keep theirs.
    /// World frames below `self` are cleared and pushed again by the next
    /// [`resolve`](Assembly::resolve).
    pub fn replace(&mut self, path: &str, component: impl Into<Component>) -> ModelResult<Component> {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let old = self.replace_in(&segments, component.into(), "")?;
        tracing::debug!(path, "Replaced component");
        Ok(old)
    }

    fn replace_in(&mut self, segments: &[&str], component: Component, prefix: &str) -> ModelResult<Component> {
        let Some((head, rest)) = segments.split_first() else {
            return Err(ModelError::NotFound(prefix.to_string()));
        };
        let path = child_path(prefix, head);
        let idx = self
            .child_index(head)
            .ok_or_else(|| ModelError::NotFound(path.clone()))?;

        let old = if rest.is_empty() {
            component.detach();
            let old = std::mem::replace(&mut self.children[idx].component, component);
            if let Err(source) = plan::plan(&self.children, &self.constraints, self.class.placement) {
                self.children[idx].component = old;
                return Err(ModelError::Structure {
                    path: prefix.to_string(),
                    source,
                });
            }
            old.detach();
            old
        } else {
            match &mut self.children[idx].component {
                Component::Assembly(sub) => sub.replace_in(rest, component, &path)?,
                Component::Part(_) => return Err(ModelError::NotFound(child_path(&path, rest[0]))),
            }
        };

        self.invalidate();
        // frames pushed from the old placements are stale until the next resolve
        self.clear_descendant_frames();
        Ok(old)
    }

    /// Invalidate the component at `path` and whatever derives from it
    ///
    /// Clears the target's own caches and the aggregate geometry of every
    /// ancestor. An ancestor's placements are cleared only where one of its
    /// constraints reads the geometry of the branch leading to the target.
    pub fn invalidate_path(&self, path: &str) -> ModelResult<()> {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        self.invalidate_in(&segments, "")?;
        tracing::debug!(path, "Invalidated component and ancestors");
        Ok(())
    }

    fn invalidate_in(&self, segments: &[&str], prefix: &str) -> ModelResult<()> {
        let Some((head, rest)) = segments.split_first() else {
            return Err(ModelError::NotFound(prefix.to_string()));
        };
        let path = child_path(prefix, head);
        let child = self
            .child(head)
            .ok_or_else(|| ModelError::NotFound(path.clone()))?;

        if rest.is_empty() {
            child.invalidate();
        } else {
            match child {
                Component::Assembly(sub) => sub.invalidate_in(rest, &path)?,
                Component::Part(_) => return Err(ModelError::NotFound(child_path(&path, rest[0]))),
            }
        }

        self.geometry.invalidate();
        if self
            .constraints
            .iter()
            .any(|c| c.geometry_dependency() == Some(*head))
        {
            self.placement.invalidate();
            self.clear_descendant_frames();
        }
        Ok(())
    }
}
