//! Error types for model construction, resolution and building

use thiserror::Error;
use uuid::Uuid;

use crate::assembly::StructureError;
use crate::params::ParameterError;
use crate::part::GeometryBuildError;
use crate::record::RecordError;

/// Label used for the root of a tree in messages
pub(crate) fn path_label(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

/// Top-level error for everything a component tree can fail at
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    GeometryBuild(#[from] GeometryBuildError),

    #[error("Assembly {}: {source}", path_label(.path))]
    Structure {
        path: String,
        source: StructureError,
    },

    #[error("Component {class} ({id}) has no resolved world frame")]
    Detached { class: String, id: Uuid },

    #[error("No component at path '{0}'")]
    NotFound(String),

    #[error("Component class {class} has no mate '{mate}'")]
    UnknownMate { class: String, mate: String },

    #[error("Unknown component class: {0}")]
    UnknownClass(String),

    #[error("Invalid class definition: {0}")]
    Definition(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ModelError {
    /// The structural error, if this is one
    pub fn structure(&self) -> Option<&StructureError> {
        match self {
            ModelError::Structure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
