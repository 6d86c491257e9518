//! Batch operations over a list of pools

use crate::config::{AutoShrinkSettings, PoolSettings};
use crate::error::{PoolError, PoolResult};
use crate::pooling::pool::{AddOptions, ResourcePool};
use crate::pooling::registry::PoolRegistry;
use crate::pooling::resource::{PooledResource, ResourceFactory};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// An explicit list of distinct pools
pub struct PoolBatch<F: ResourceFactory> {
    pools: Vec<Arc<ResourcePool<F>>>,
}

impl<F: ResourceFactory> PoolBatch<F> {
    /// Resolve `(kind, template)` requests to pools through `registry`
    ///
    /// Missing pools are created with `settings`. A pool is listed once no matter
    /// how many requests resolve to it. When `auto_shrink` is given, every
    /// listed pool without a shrinker gets one; settings that do not validate
    /// fail the build.
    pub fn build<'a>(
        registry: &PoolRegistry<F>,
        requests: impl IntoIterator<Item = (&'a str, Arc<F::Template>)>,
        settings: PoolSettings,
        auto_shrink: Option<&AutoShrinkSettings>,
    ) -> PoolResult<Self> {
        let mut pools: Vec<Arc<ResourcePool<F>>> = Vec::new();
        for (kind, template) in requests {
            let (pool, created) = registry.create_or_get(kind, template, settings);
            if created || !pools.iter().any(|listed| Arc::ptr_eq(listed, &pool)) {
                pools.push(pool);
            }
        }

        let batch = Self { pools };
        if let Some(auto_shrink) = auto_shrink {
            batch.update_auto_shrinks(auto_shrink, false)?;
        }
        Ok(batch)
    }

    /// Wrap already resolved pools, dropping duplicates
    pub fn from_pools(pools: impl IntoIterator<Item = Arc<ResourcePool<F>>>) -> Self {
        let mut distinct: Vec<Arc<ResourcePool<F>>> = Vec::new();
        for pool in pools {
            if !distinct.iter().any(|listed| Arc::ptr_eq(listed, &pool)) {
                distinct.push(pool);
            }
        }
        Self { pools: distinct }
    }

    /// Pools in request order
    pub fn pools(&self) -> &[Arc<ResourcePool<F>>] {
        &self.pools
    }

    /// Number of pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Pick a pool uniformly at random
    pub fn random_pool<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<ResourcePool<F>>> {
        self.pools.choose(rng)
    }

    /// Take a resource from a uniformly chosen pool
    ///
    /// `None` if the batch is empty or the chosen pool is exhausted.
    pub fn random_object<R: Rng + ?Sized>(&self, rng: &mut R, activate: bool) -> Option<F::Handle> {
        self.random_pool(rng)?.get(activate)
    }

    /// Apply auto-shrink settings to every pool
    ///
    /// Pools without a shrinker get one. Existing shrinkers are replaced by a
    /// fresh one when `reattach` is set, and reconfigured from their next cycle
    /// otherwise. Settings that do not validate are rejected before any pool
    /// is touched.
    pub fn update_auto_shrinks(&self, settings: &AutoShrinkSettings, reattach: bool) -> PoolResult<()> {
        for pool in &self.pools {
            if pool.has_auto_shrink() && !reattach {
                pool.auto_shrink_reconfigure(settings.clone())?;
                continue;
            }
            // Keep the current shrinker unless its replacement is usable
            if let Err(e) = settings.validate() {
                let err = PoolError::InvalidSettings {
                    kind: pool.kind().to_string(),
                    reason: e.to_string(),
                };
                log::error!("{err}");
                return Err(err);
            }
            pool.auto_shrink_remove();
            pool.auto_shrink_attach(settings.clone())?;
        }
        Ok(())
    }

    /// Restart every attached shrinker; returns how many were restarted
    pub fn start_auto_shrinks(&self) -> usize {
        self.pools.iter().filter(|pool| pool.auto_shrink_start()).count()
    }

    /// Stop every attached shrinker without detaching; returns how many
    pub fn stop_auto_shrinks(&self) -> usize {
        self.pools.iter().filter(|pool| pool.auto_shrink_stop()).count()
    }

    /// Detach every shrinker; returns how many were removed
    pub fn remove_auto_shrinks(&self) -> usize {
        self.pools.iter().filter(|pool| pool.auto_shrink_remove()).count()
    }

    /// Remove every pool in the batch from `registry`
    ///
    /// Keeps going past failures and returns the first one.
    pub fn remove_from(self, registry: &PoolRegistry<F>, destroy: bool, strict: bool) -> PoolResult<()> {
        let mut first_error = None;
        for pool in &self.pools {
            if let Err(e) = registry.remove(pool.kind(), destroy, strict) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Hand externally created resources to their pools
///
/// Each handle's kind key selects (or creates, from the paired template, with
/// default sizing) its pool, which then `add`s it. Returns how many were
/// admitted.
pub fn adopt_resources<F: ResourceFactory>(
    registry: &PoolRegistry<F>,
    resources: impl IntoIterator<Item = (Arc<F::Template>, F::Handle)>,
    options: AddOptions,
) -> usize {
    let mut admitted = 0;
    for (template, handle) in resources {
        let kind = handle.kind_key().to_string();
        let (pool, created) = registry.create_or_get(&kind, template, PoolSettings::default());
        if created {
            log::debug!("Created pool '{}' for adopted resources", pool.kind());
        }
        if pool.add(handle, options) {
            admitted += 1;
        }
    }
    admitted
}
