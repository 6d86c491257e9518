//! Pool error taxonomy
//!
//! Partition-membership errors are local and recoverable: callers on lenient
//! paths never see them, strict paths get them back as `Err`. Registry lookup
//! misses always surface to the caller.

use thiserror::Error;

/// Errors raised by pools and the pool registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The handle is not owned by the pool
    #[error("resource is not in pool '{kind}'; use `add` to admit it first")]
    NotInPool {
        /// Kind key of the pool that was asked
        kind: String,
    },

    /// No pool is registered for the kind key
    #[error("no pool registered for '{kind}'; create it with `create_or_get` first")]
    PoolNotFound {
        /// Normalized kind key that missed
        kind: String,
    },

    /// The pool is at capacity and has no idle handle to hand out
    #[error("pool '{kind}' is exhausted (max size {max_size}, no inactive resources)")]
    PoolExhausted {
        /// Kind key of the exhausted pool
        kind: String,
        /// Configured hard cap
        max_size: usize,
    },

    /// A second auto-shrinker was attached to the same pool
    #[error("pool '{kind}' already has an auto-shrinker; remove it before attaching another")]
    AlreadyAttached {
        /// Kind key of the pool
        kind: String,
    },

    /// Auto-shrink settings were rejected before reaching the shrinker
    #[error("invalid auto-shrink settings for pool '{kind}': {reason}")]
    InvalidSettings {
        /// Kind key of the pool
        kind: String,
        /// Why the settings were rejected
        reason: String,
    },

    /// Partition bookkeeping no longer adds up
    #[error("pool '{kind}' is out of sync: {all} owned, {active} active + {inactive} inactive")]
    Desync {
        /// Kind key of the pool
        kind: String,
        /// Number of owned handles
        all: usize,
        /// Size of the active partition
        active: usize,
        /// Size of the inactive partition
        inactive: usize,
    },
}

/// Result alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
