//! Pooling manager
//!
//! Owns the registry for one application and applies [`PoolingConfig`]
//! defaults. Construct it explicitly and pass it (or `registry()`) to whatever
//! needs pools; dropping it tears every pool down.

use crate::config::{Config, ConfigError, PoolingConfig};
use crate::pooling::pool::ResourcePool;
use crate::pooling::registry::PoolRegistry;
use crate::pooling::resource::ResourceFactory;
use std::sync::Arc;

/// Registry owner configured from a [`PoolingConfig`]
pub struct PoolingManager<F: ResourceFactory> {
    config: PoolingConfig,
    registry: Arc<PoolRegistry<F>>,
}

impl<F: ResourceFactory> PoolingManager<F> {
    /// Create a manager after validating `config`
    pub fn new(factory: Arc<F>, config: PoolingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "Initializing pooling manager (default pool {}/{}, auto-shrink {})",
            config.default_pool.initial_size,
            config.default_pool.max_size,
            if config.auto_shrink.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            registry: Arc::new(PoolRegistry::new(factory)),
        })
    }

    /// Create a manager with the default configuration
    pub fn with_defaults(factory: Arc<F>) -> Self {
        Self {
            config: PoolingConfig::default(),
            registry: Arc::new(PoolRegistry::new(factory)),
        }
    }

    /// Create a manager from a `.toml` or `.ron` config file
    pub fn from_config_file(factory: Arc<F>, path: &str) -> Result<Self, ConfigError> {
        let config = PoolingConfig::load_from_file(path)?;
        Self::new(factory, config)
    }

    /// Active configuration
    pub fn config(&self) -> &PoolingConfig {
        &self.config
    }

    /// Shared registry
    pub fn registry(&self) -> &Arc<PoolRegistry<F>> {
        &self.registry
    }

    /// Return the pool for `kind`, creating it with the configured defaults
    ///
    /// Newly created pools get the configured auto-shrinker, if any.
    pub fn create_or_get_default(&self, kind: &str, template: Arc<F::Template>) -> (Arc<ResourcePool<F>>, bool) {
        let (pool, created) = self.registry.create_or_get(kind, template, self.config.default_pool);
        if created {
            if let Some(settings) = &self.config.auto_shrink {
                if let Err(e) = pool.auto_shrink_attach(settings.clone()) {
                    log::warn!("Pool '{}' created without auto-shrink: {}", pool.kind(), e);
                }
            }
        }
        (pool, created)
    }

    /// Tear down every pool, destroying its resources
    ///
    /// The registry stays usable; pools created afterwards are torn down by
    /// the next `shutdown()` or on drop.
    pub fn shutdown(&self) {
        log::info!("Shutting down pooling manager");
        self.registry.remove_all(true);
    }
}

impl<F: ResourceFactory> Drop for PoolingManager<F> {
    fn drop(&mut self) {
        self.registry.remove_all(true);
    }
}
