//! World frames pushed down the tree by resolution

use parking_lot::RwLock;
use pk_kernel::Transform;
use uuid::Uuid;

use super::DetachedPolicy;
use crate::error::{ModelError, ModelResult};

/// A component's resolved world frame
///
/// Written by the owning parent during resolution (or by the user for a
/// root). Clones start detached.
#[derive(Debug, Default)]
pub(crate) struct FrameSlot {
    world: RwLock<Option<Transform>>,
}

impl FrameSlot {
    pub fn get(&self) -> Option<Transform> {
        *self.world.read()
    }

    /// Returns true if the stored frame changed
    pub fn set(&self, frame: Option<Transform>) -> bool {
        let mut world = self.world.write();
        if *world == frame {
            return false;
        }
        *world = frame;
        true
    }

    pub fn resolve(&self, policy: DetachedPolicy, class: &str, id: Uuid) -> ModelResult<Transform> {
        match (self.get(), policy) {
            (Some(frame), _) => Ok(frame),
            (None, DetachedPolicy::Identity) => Ok(Transform::IDENTITY),
            (None, DetachedPolicy::Error) => Err(ModelError::Detached {
                class: class.to_string(),
                id,
            }),
        }
    }
}

impl Clone for FrameSlot {
    fn clone(&self) -> Self {
        Self::default()
    }
}
