use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::format::render_class;
use crate::hierarchy::{resolve_raw_hierarchy, ResolvedHierarchy};
use crate::store::{ClassId, TypeEnv};

/// Whether and how many resolved hierarchies are kept.
///
/// `enabled` is read on every store, so flipping it at runtime only affects hierarchies
/// resolved afterwards; hierarchies already handed out stay valid.
#[derive(Debug)]
pub struct CachePolicy {
    enabled: AtomicBool,
    capacity: usize,
}

impl CachePolicy {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            capacity: capacity.max(1),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Self::DEFAULT_CAPACITY)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(true, Self::DEFAULT_CAPACITY)
    }
}

/// Raw hierarchies keyed by root class, evicted least recently used first.
#[derive(Debug)]
pub struct HierarchyCache {
    policy: CachePolicy,
    inner: Mutex<HierarchyCacheInner>,
    /// Serializes resolution so concurrent misses for the same root compute it once.
    compute: parking_lot::Mutex<()>,
}

#[derive(Debug, Default)]
struct HierarchyCacheInner {
    map: HashMap<ClassId, Arc<ResolvedHierarchy>>,
    order: VecDeque<ClassId>,
}

impl Default for HierarchyCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl HierarchyCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(HierarchyCacheInner::default()),
            compute: parking_lot::Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.lock_inner().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, root: ClassId) -> Option<Arc<ResolvedHierarchy>> {
        let mut inner = self.lock_inner();
        let value = inner.map.get(&root)?.clone();
        if let Some(pos) = inner.order.iter().position(|k| *k == root) {
            inner.order.remove(pos);
        }
        inner.order.push_back(root);
        Some(value)
    }

    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        inner.map.clear();
        inner.order.clear();
    }

    /// Cached hierarchy of `root`, resolving (and storing, if enabled) it on a miss.
    pub fn get_or_resolve(
        &self,
        env: &dyn TypeEnv,
        root: ClassId,
    ) -> Result<Arc<ResolvedHierarchy>> {
        if let Some(hit) = self.get(root) {
            tracing::trace!(target = "genera.cache", root = %render_class(env, root), "cache hit");
            return Ok(hit);
        }

        let _guard = self.compute.lock();
        // Another caller may have finished while we waited.
        if let Some(hit) = self.get(root) {
            tracing::trace!(target = "genera.cache", root = %render_class(env, root), "cache hit");
            return Ok(hit);
        }

        tracing::trace!(target = "genera.cache", root = %render_class(env, root), "cache miss");
        let hierarchy = Arc::new(resolve_raw_hierarchy(env, root, &[])?);
        if self.policy.is_enabled() {
            self.insert(env, root, hierarchy.clone());
        }
        Ok(hierarchy)
    }

    fn insert(&self, env: &dyn TypeEnv, root: ClassId, hierarchy: Arc<ResolvedHierarchy>) {
        let mut inner = self.lock_inner();
        inner.map.insert(root, hierarchy);
        if let Some(pos) = inner.order.iter().position(|k| *k == root) {
            inner.order.remove(pos);
        }
        inner.order.push_back(root);

        while inner.map.len() > self.policy.capacity {
            let Some(evicted) = inner.order.pop_front() else {
                break;
            };
            inner.map.remove(&evicted);
            tracing::debug!(
                target = "genera.cache",
                root = %render_class(env, evicted),
                "evicted hierarchy"
            );
        }
    }

    #[track_caller]
    fn lock_inner(&self) -> MutexGuard<'_, HierarchyCacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target = "genera.cache",
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    error = %err,
                    "mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}
