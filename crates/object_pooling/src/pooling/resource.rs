//! Collaborator traits for pooled resources
//!
//! The pool never creates or tears down a resource itself. A [`ResourceFactory`]
//! instantiates handles from a template, flips their activation flag and destroys
//! them; the pool only moves handles between its partitions.
//!
//! Resources that want to know which pool owns them opt in through
//! [`PooledResource::set_owning_pool`], which hands them a weak [`OwningPool`]
//! link when they are created by, or added to, a pool.

use crate::error::{PoolError, PoolResult};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// A handle to one pooled resource instance
///
/// Handles are cheap to clone and compare by identity: two clones of the same
/// handle must be equal and hash identically.
pub trait PooledResource: Clone + Eq + Hash + Send + Sync + 'static {
    /// Kind identifier of the resource, possibly carrying a clone suffix
    fn kind_key(&self) -> &str;

    /// Receive a back-reference to the pool that now owns this resource
    ///
    /// Called while the pool is updating its bookkeeping, so implementations
    /// should store the link and return without calling back into the pool.
    fn set_owning_pool(&self, _pool: OwningPool<Self>) {}
}

/// Creates, toggles and destroys the resources behind pooled handles
pub trait ResourceFactory: Send + Sync + 'static {
    /// Prototype new resources are instantiated from
    type Template: Send + Sync + 'static;
    /// Handle type produced by this factory
    type Handle: PooledResource;

    /// Create a new resource from the template
    fn instantiate(&self, template: &Self::Template) -> Self::Handle;

    /// Tear down a resource
    fn destroy(&self, handle: &Self::Handle);

    /// Current activation flag of the resource
    fn is_active(&self, handle: &Self::Handle) -> bool;

    /// Set the activation flag of the resource
    fn set_active(&self, handle: &Self::Handle, active: bool);

    /// Whether the backing resource still exists
    fn is_alive(&self, _handle: &Self::Handle) -> bool {
        true
    }
}

/// Handle-typed view of a pool, used by [`OwningPool`]
pub trait PoolView<H>: Send + Sync {
    /// Normalized kind key of the pool
    fn kind(&self) -> &str;
    /// Number of owned handles
    fn count(&self) -> usize;
    /// Number of handles in use
    fn active_count(&self) -> usize;
    /// Number of idle handles
    fn inactive_count(&self) -> usize;
    /// Whether the pool owns the handle
    fn contains(&self, handle: &H) -> bool;
    /// Mark a handle as in use
    fn activate(&self, handle: &H, strict: bool) -> PoolResult<()>;
    /// Return a handle to the idle partition
    fn deactivate(&self, handle: &H, strict: bool) -> PoolResult<()>;
}

/// Weak back-reference from a resource to its pool
///
/// Holding the link does not keep the pool alive. Once the pool is gone the
/// convenience methods report [`PoolError::PoolNotFound`].
pub struct OwningPool<H> {
    kind: Arc<str>,
    pool: Weak<dyn PoolView<H>>,
}

impl<H> OwningPool<H> {
    /// Create a link to a pool
    pub fn new(kind: impl Into<Arc<str>>, pool: Weak<dyn PoolView<H>>) -> Self {
        Self {
            kind: kind.into(),
            pool,
        }
    }

    /// Kind key of the owning pool
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Upgrade to the pool if it still exists
    pub fn upgrade(&self) -> Option<Arc<dyn PoolView<H>>> {
        self.pool.upgrade()
    }

    /// Whether the owning pool still exists
    pub fn is_alive(&self) -> bool {
        self.pool.strong_count() > 0
    }

    /// Return the handle to its pool's idle partition
    pub fn deactivate(&self, handle: &H) -> PoolResult<()> {
        self.pool()?.deactivate(handle, true)
    }

    /// Mark the handle as in use in its pool
    pub fn activate(&self, handle: &H) -> PoolResult<()> {
        self.pool()?.activate(handle, true)
    }

    /// Whether the pool still owns the handle
    pub fn contains(&self, handle: &H) -> bool {
        self.upgrade().is_some_and(|pool| pool.contains(handle))
    }

    fn pool(&self) -> PoolResult<Arc<dyn PoolView<H>>> {
        self.upgrade().ok_or_else(|| PoolError::PoolNotFound {
            kind: self.kind.to_string(),
        })
    }
}

impl<H> Clone for OwningPool<H> {
    fn clone(&self) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            pool: Weak::clone(&self.pool),
        }
    }
}

impl<H> fmt::Debug for OwningPool<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwningPool")
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}
