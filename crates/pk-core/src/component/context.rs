//! Build configuration and the context threaded through every build

use std::fmt;
use std::sync::Arc;

use pk_kernel::{GeometryKernel, default_kernel};
use serde::{Deserialize, Serialize};

use crate::cache::GeometryCache;

/// What to do when a part's geometry fails to build inside an assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryErrorPolicy {
    /// Fail the whole build with the first error
    #[default]
    Abort,
    /// Record the failure, leave the part out of the aggregate and continue
    Placeholder,
}

/// What a world-frame query returns for a component with no resolved frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetachedPolicy {
    /// Report [`ModelError::Detached`](crate::ModelError::Detached)
    #[default]
    Error,
    /// Treat the component as sitting at the world origin
    Identity,
}

/// Build configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub geometry_errors: GeometryErrorPolicy,
    #[serde(default)]
    pub detached: DetachedPolicy,
}

impl BuildConfig {
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

/// Kernel, geometry cache and configuration used for a build
#[derive(Clone)]
pub struct BuildContext {
    kernel: Arc<dyn GeometryKernel>,
    cache: Arc<GeometryCache>,
    config: BuildConfig,
}

impl BuildContext {
    /// Context using the process-wide geometry cache
    pub fn new(kernel: Arc<dyn GeometryKernel>) -> Self {
        Self {
            kernel,
            cache: GeometryCache::global(),
            config: BuildConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<GeometryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn kernel(&self) -> &dyn GeometryKernel {
        self.kernel.as_ref()
    }

    pub fn kernel_handle(&self) -> &Arc<dyn GeometryKernel> {
        &self.kernel
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(default_kernel())
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("kernel", &self.kernel.name())
            .field("config", &self.config)
            .finish()
    }
}
