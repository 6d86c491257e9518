//! Pool registry
//!
//! Maps normalized kind keys to pools. Resources instantiated from a template
//! carry a `(Clone)` suffix in their kind key; the registry strips it so a
//! resource and its template resolve to the same pool.

use crate::config::PoolSettings;
use crate::error::{PoolError, PoolResult};
use crate::pooling::pool::{PoolStats, ResourcePool, ShrinkOptions};
use crate::pooling::resource::{PooledResource, ResourceFactory};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Suffix carried by kind keys of instantiated resources
pub const CLONE_SUFFIX: &str = "(Clone)";

/// Strip any trailing clone suffixes from a kind key
pub fn normalize_kind(kind: &str) -> &str {
    let mut kind = kind;
    while let Some(stripped) = kind.strip_suffix(CLONE_SUFFIX) {
        kind = stripped;
    }
    kind
}

/// Counts of one registered pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatsEntry {
    /// Kind key of the pool
    pub kind: String,
    /// Counts of the pool
    pub stats: PoolStats,
}

/// Counts across every registered pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Per-pool counts, sorted by kind
    pub pools: Vec<PoolStatsEntry>,
    /// Sum over all pools
    pub total: PoolStats,
}

/// Registry of pools keyed by normalized kind
pub struct PoolRegistry<F: ResourceFactory> {
    factory: Arc<F>,
    pools: RwLock<HashMap<String, Arc<ResourcePool<F>>>>,
}

impl<F: ResourceFactory> PoolRegistry<F> {
    /// Create an empty registry whose pools share `factory`
    pub fn new(factory: Arc<F>) -> Self {
        Self {
            factory,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Factory shared by every pool
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    /// Return the pool for `kind`, creating it if needed
    ///
    /// The flag reports whether a new pool was created; when it is `false`
    /// `template` and `settings` were ignored.
    pub fn create_or_get(
        &self,
        kind: &str,
        template: Arc<F::Template>,
        settings: PoolSettings,
    ) -> (Arc<ResourcePool<F>>, bool) {
        let kind = normalize_kind(kind);
        if let Some(pool) = self.pools.read().get(kind) {
            return (Arc::clone(pool), false);
        }

        let mut pools = self.pools.write();
        // Another caller may have created it between the two locks
        if let Some(pool) = pools.get(kind) {
            return (Arc::clone(pool), false);
        }

        let pool = ResourcePool::new(kind, template, Arc::clone(&self.factory), settings);
        pools.insert(kind.to_string(), Arc::clone(&pool));
        (pool, true)
    }

    /// Pool registered for `kind`
    pub fn get(&self, kind: &str) -> PoolResult<Arc<ResourcePool<F>>> {
        let kind = normalize_kind(kind);
        self.pools.read().get(kind).cloned().ok_or_else(|| {
            let err = PoolError::PoolNotFound { kind: kind.to_string() };
            log::error!("{err}");
            err
        })
    }

    /// Whether a pool is registered for `kind`
    pub fn contains(&self, kind: &str) -> bool {
        self.pools.read().contains_key(normalize_kind(kind))
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    /// Whether no pool is registered
    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }

    /// Registered kind keys, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.pools.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Tear down the pool for `kind` and unregister it
    ///
    /// A missing pool is an error when `strict`, a logged no-op otherwise.
    pub fn remove(&self, kind: &str, destroy: bool, strict: bool) -> PoolResult<()> {
        let kind = normalize_kind(kind);
        let removed = self.pools.write().remove(kind);
        match removed {
            Some(pool) => {
                pool.destroy_pool(destroy);
                Ok(())
            }
            None => {
                let err = PoolError::PoolNotFound { kind: kind.to_string() };
                if strict {
                    log::error!("remove: {err}");
                    Err(err)
                } else {
                    log::warn!("remove ignored: {err}");
                    Ok(())
                }
            }
        }
    }

    /// Tear down and unregister every pool
    pub fn remove_all(&self, destroy: bool) {
        let pools: Vec<_> = self.pools.write().drain().map(|(_, pool)| pool).collect();
        for pool in &pools {
            pool.destroy_pool(destroy);
        }
        if !pools.is_empty() {
            log::info!("Removed {} pools", pools.len());
        }
    }

    /// Shrink every pool toward its initial size; returns total evictions
    pub fn shrink_all(&self, options: ShrinkOptions) -> usize {
        self.snapshot().iter().map(|pool| pool.shrink(options)).sum()
    }

    /// Destroy every pooled resource, keeping the (now empty) pools registered
    ///
    /// Attached auto-shrinkers are removed too when `remove_auto_shrink` is set.
    pub fn destroy_all_objects_in_pools(&self, remove_auto_shrink: bool) {
        for pool in self.snapshot() {
            pool.destroy_all();
            if remove_auto_shrink {
                pool.auto_shrink_remove();
            }
        }
    }

    /// Forget every pooled resource without destroying, keeping the pools
    pub fn clear_all(&self) {
        for pool in self.snapshot() {
            pool.clear();
        }
    }

    /// Hand out an active resource from the pool for `kind`
    ///
    /// `Ok(None)` means the pool exists but is exhausted.
    pub fn get_object(&self, kind: &str) -> PoolResult<Option<F::Handle>> {
        Ok(self.get(kind)?.get(true))
    }

    /// Mark a resource as in use in the pool its kind key resolves to
    pub fn activate(&self, handle: &F::Handle) -> PoolResult<()> {
        self.get(handle.kind_key())?.activate(handle, true)
    }

    /// Return a resource to the pool its kind key resolves to
    pub fn deactivate(&self, handle: &F::Handle) -> PoolResult<()> {
        self.get(handle.kind_key())?.deactivate(handle, true)
    }

    /// Counts per pool plus a global total
    pub fn stats(&self) -> RegistryStats {
        let mut report = RegistryStats::default();
        for pool in self.snapshot() {
            let stats = pool.stats();
            report.total.active += stats.active;
            report.total.inactive += stats.inactive;
            report.total.total += stats.total;
            report.pools.push(PoolStatsEntry {
                kind: pool.kind().to_string(),
                stats,
            });
        }
        report.pools.sort_by(|a, b| a.kind.cmp(&b.kind));
        report
    }

    /// Write the stats report to the log
    pub fn log_stats(&self) {
        let report = self.stats();
        log::info!("=== Pool Statistics ===");
        for entry in &report.pools {
            log::info!(
                "{}: {}/{} active, {} inactive",
                entry.kind,
                entry.stats.active,
                entry.stats.total,
                entry.stats.inactive
            );
        }
        log::info!(
            "Total: {}/{} active across {} pools",
            report.total.active,
            report.total.total,
            report.pools.len()
        );
    }

    /// Current pools, so fan-out runs without holding the registry lock
    fn snapshot(&self) -> Vec<Arc<ResourcePool<F>>> {
        self.pools.read().values().cloned().collect()
    }
}
