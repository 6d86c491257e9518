//! Pooling
//!
//! Pools, their auto-shrinkers, and the registry and batch helpers built on them.

pub mod auto_shrink;
pub mod batch;
pub mod manager;
pub mod pool;
pub mod registry;
pub mod resource;

pub use auto_shrink::{shrink_target, AutoShrinker, ShrinkTarget, ShrinkerState};
pub use batch::{adopt_resources, PoolBatch};
pub use manager::PoolingManager;
pub use pool::{AddOptions, PoolStats, ResourcePool, ShrinkOptions};
pub use registry::{normalize_kind, PoolRegistry, PoolStatsEntry, RegistryStats, CLONE_SUFFIX};
pub use resource::{OwningPool, PoolView, PooledResource, ResourceFactory};
