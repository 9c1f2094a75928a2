//! Build caches
//!
//! [`CacheSlot`] is the tri-state cache every component carries for its
//! derived data. [`GeometryCache`] shares built part solids across all
//! components with the same class and parameters.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::{Mutex, RwLock};
use pk_kernel::{GeometryKernel, Solid};
use serde::{Deserialize, Serialize};

use crate::component::{BuildContext, GeometryErrorPolicy};
use crate::params::Params;
use crate::part::PartClass;

/// Shared handle to a built solid
pub type SharedSolid = Arc<Solid>;

/// Observable state of a cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheState {
    /// Never built
    Unbuilt,
    /// Holds a value
    Built,
    /// Cleared by invalidation or a failed build; rebuilt on next access
    Invalid,
}

#[derive(Clone)]
enum Slot<T> {
    Unbuilt,
    Built(T),
    Invalid,
}

/// Lazily built value guarded by a read-write lock
///
/// Readers of a built value only take the read lock. A build holds the
/// write lock for its whole duration, so concurrent first accesses run
/// the builder once. A failed build leaves the slot `Invalid`; the lock is
/// never poisoned.
pub struct CacheSlot<T> {
    inner: RwLock<Slot<T>>,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slot::Unbuilt),
        }
    }

    pub fn state(&self) -> CacheState {
        match &*self.inner.read() {
            Slot::Unbuilt => CacheState::Unbuilt,
            Slot::Built(_) => CacheState::Built,
            Slot::Invalid => CacheState::Invalid,
        }
    }

    /// The cached value, if built
    pub fn get(&self) -> Option<T> {
        match &*self.inner.read() {
            Slot::Built(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn get_or_try_build<E>(&self, build: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.get_or_try_build_where(|_| true, build)
    }

    /// Like [`get_or_try_build`](Self::get_or_try_build), but a built value
    /// rejected by `fresh` is replaced by a new build
    pub fn get_or_try_build_where<E>(
        &self,
        fresh: impl Fn(&T) -> bool,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let Slot::Built(value) = &*self.inner.read()
            && fresh(value)
        {
            return Ok(value.clone());
        }

        let mut slot = self.inner.write();
        // another thread may have finished while we waited
        if let Slot::Built(value) = &*slot
            && fresh(value)
        {
            return Ok(value.clone());
        }
        match build() {
            Ok(value) => {
                *slot = Slot::Built(value.clone());
                Ok(value)
            }
            Err(e) => {
                *slot = Slot::Invalid;
                Err(e)
            }
        }
    }

    /// Drop the cached value. Returns true if a value was discarded.
    pub fn invalidate(&self) -> bool {
        let mut slot = self.inner.write();
        match &*slot {
            Slot::Built(_) => {
                *slot = Slot::Invalid;
                true
            }
            _ => false,
        }
    }
}

impl<T: Clone> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CacheSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: RwLock::new(self.inner.read().clone()),
        }
    }
}

impl<T: Clone> fmt::Debug for CacheSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSlot")
            .field("state", &self.state())
            .finish()
    }
}

/// Identity of the kernel a cached value was built with
///
/// The kernel is held weakly. Its allocation outlives it while any stamp
/// exists, so a live kernel never shares the address of a dropped one.
#[derive(Clone)]
pub(crate) struct KernelStamp(Weak<dyn GeometryKernel>);

impl KernelStamp {
    pub fn of(kernel: &Arc<dyn GeometryKernel>) -> Self {
        Self(Arc::downgrade(kernel))
    }

    pub fn is(&self, kernel: &Arc<dyn GeometryKernel>) -> bool {
        self.addr() == Arc::as_ptr(kernel).cast::<()>() as usize
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    fn addr(&self) -> usize {
        self.0.as_ptr().cast::<()>() as usize
    }
}

/// A per-component cached value with the kernel and error policy it was
/// built under
#[derive(Clone)]
pub(crate) struct Stamped<T> {
    kernel: KernelStamp,
    policy: GeometryErrorPolicy,
    pub value: T,
}

impl<T> Stamped<T> {
    pub fn new(ctx: &BuildContext, value: T) -> Self {
        Self {
            kernel: KernelStamp::of(ctx.kernel_handle()),
            policy: ctx.config().geometry_errors,
            value,
        }
    }

    /// Built by the context's kernel
    pub fn built_by(&self, ctx: &BuildContext) -> bool {
        self.kernel.is(ctx.kernel_handle())
    }

    /// Built by the context's kernel under its geometry error policy
    pub fn built_under(&self, ctx: &BuildContext) -> bool {
        self.built_by(ctx) && self.policy == ctx.config().geometry_errors
    }
}

/// Content key: kernel instance, part class and bound parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GeometryKey {
    kernel: usize,
    class: usize,
    params: Params,
}

struct GeometryEntry {
    // the stamp pins the kernel's address, the class is held for the same reason
    kernel: KernelStamp,
    _class: Arc<PartClass>,
    slot: Arc<CacheSlot<SharedSolid>>,
}

static GLOBAL: LazyLock<Arc<GeometryCache>> = LazyLock::new(|| Arc::new(GeometryCache::new()));

/// Content-addressed cache of part solids
///
/// The map lock is only held to find or insert a slot; building happens
/// under the per-key slot lock so unrelated keys build in parallel and each
/// key is built at most once.
#[derive(Default)]
pub struct GeometryCache {
    entries: Mutex<HashMap<GeometryKey, GeometryEntry>>,
}

impl GeometryCache {
    /// A private cache, mainly for isolating tests
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> Arc<GeometryCache> {
        GLOBAL.clone()
    }

    fn key(kernel: &Arc<dyn GeometryKernel>, class: &Arc<PartClass>, params: &Params) -> GeometryKey {
        GeometryKey {
            kernel: Arc::as_ptr(kernel).cast::<()>() as usize,
            class: Arc::as_ptr(class) as usize,
            params: params.clone(),
        }
    }

    fn slot(
        &self,
        key: &GeometryKey,
        kernel: &Arc<dyn GeometryKernel>,
        class: &Arc<PartClass>,
    ) -> Arc<CacheSlot<SharedSolid>> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            Self::purge_locked(&mut entries);
        }
        entries
            .entry(key.clone())
            .or_insert_with(|| GeometryEntry {
                kernel: KernelStamp::of(kernel),
                _class: class.clone(),
                slot: Arc::new(CacheSlot::new()),
            })
            .slot
            .clone()
    }

    /// Return the shared solid for this content, building it if needed
    ///
    /// A failed build leaves no entry behind.
    pub fn get_or_build<E>(
        &self,
        kernel: &Arc<dyn GeometryKernel>,
        class: &Arc<PartClass>,
        params: &Params,
        build: impl FnOnce() -> Result<SharedSolid, E>,
    ) -> Result<SharedSolid, E> {
        let key = Self::key(kernel, class, params);
        let slot = self.slot(&key, kernel, class);
        if let Some(solid) = slot.get() {
            tracing::trace!(class = class.name(), "Geometry cache hit");
            return Ok(solid);
        }
        let result = slot.get_or_try_build(build);
        if result.is_err() {
            let mut entries = self.entries.lock();
            if entries.get(&key).is_some_and(|e| Arc::ptr_eq(&e.slot, &slot)) {
                entries.remove(&key);
            }
        }
        result
    }

    pub fn lookup(
        &self,
        kernel: &Arc<dyn GeometryKernel>,
        class: &Arc<PartClass>,
        params: &Params,
    ) -> Option<SharedSolid> {
        let key = Self::key(kernel, class, params);
        let slot = self.entries.lock().get(&key).map(|e| e.slot.clone())?;
        slot.get()
    }

    /// Drop the entries of kernels that no longer exist. Returns how many
    /// were removed.
    pub fn purge(&self) -> usize {
        Self::purge_locked(&mut self.entries.lock())
    }

    fn purge_locked(entries: &mut HashMap<GeometryKey, GeometryEntry>) -> usize {
        let before = entries.len();
        entries.retain(|_, e| e.kernel.is_alive());
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged geometry of dropped kernels");
        }
        removed
    }

    /// Number of keys holding a built solid
    pub fn len(&self) -> usize {
        let slots: Vec<_> = self
            .entries
            .lock()
            .values()
            .filter(|e| e.kernel.is_alive())
            .map(|e| e.slot.clone())
            .collect();
        slots
            .iter()
            .filter(|s| s.state() == CacheState::Built)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl fmt::Debug for GeometryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryCache")
            .field("keys", &self.entries.lock().len())
            .finish()
    }
}
