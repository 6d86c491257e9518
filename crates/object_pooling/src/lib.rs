//! # Object Pooling
//!
//! Reusable resource pools with adaptive auto-shrinking.
//!
//! ## Features
//!
//! - **Resource Pools**: active/inactive partitions with oldest-first reuse
//! - **Auto-Shrink**: background sampling that trims idle resources to recent demand
//! - **Registry**: pools keyed by resource kind, with clone-suffix normalization
//! - **Batches**: random selection and bulk shrinker control over several pools
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use object_pooling::prelude::*;
//!
//! let manager = PoolingManager::new(Arc::new(SpriteFactory), PoolingConfig::default())?;
//! let (bullets, _) = manager.create_or_get_default("Bullet", Arc::new(bullet_template));
//!
//! if let Some(bullet) = bullets.get(true) {
//!     // ... fire it ...
//!     bullets.deactivate(&bullet, true)?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod pooling;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{PoolError, PoolResult};

/// Common imports for pool users
pub mod prelude {
    pub use crate::{
        config::{AutoShrinkSettings, Config, ConfigError, PoolSettings, PoolingConfig},
        error::{PoolError, PoolResult},
        pooling::{
            adopt_resources, AddOptions, OwningPool, PoolBatch, PoolRegistry, PoolStats, PooledResource,
            PoolingManager, ResourceFactory, ResourcePool, ShrinkOptions,
        },
    };
}
