//! Named mates: coordinate frames a class exposes for placement

use pk_kernel::Transform;

use crate::constants::ORIGIN_MATE;
use crate::error::{ModelError, ModelResult};
use crate::params::{ParameterError, Params};

/// Computes a mate frame (in the component's own frame) from its parameters
pub type MateFn = dyn Fn(&Params) -> Result<Transform, ParameterError> + Send + Sync;

/// The mates a class declares, in declaration order
///
/// The implicit `origin` mate (identity) is always present and cannot be
/// redefined.
#[derive(Default)]
pub(crate) struct MateTable {
    defs: Vec<(String, Box<MateFn>)>,
}

impl MateTable {
    pub fn insert(&mut self, name: String, locate: Box<MateFn>) -> ModelResult<()> {
        if name == ORIGIN_MATE {
            return Err(ModelError::Definition(format!(
                "mate '{ORIGIN_MATE}' is implicit and cannot be redefined"
            )));
        }
        if name.is_empty() || name.contains(crate::constants::PATH_SEPARATOR) {
            return Err(ModelError::Definition(format!("invalid mate name '{name}'")));
        }
        if self.contains(&name) {
            return Err(ModelError::Definition(format!("duplicate mate '{name}'")));
        }
        self.defs.push((name, locate));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        name == ORIGIN_MATE || self.defs.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        std::iter::once(ORIGIN_MATE)
            .chain(self.defs.iter().map(|(n, _)| n.as_str()))
            .collect()
    }

    /// `None` if no such mate exists
    pub fn locate(&self, name: &str, params: &Params) -> Option<Result<Transform, ParameterError>> {
        if name == ORIGIN_MATE {
            return Some(Ok(Transform::IDENTITY));
        }
        self.defs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, locate)| locate(params))
    }
}
