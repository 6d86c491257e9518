//! Resource Pool
//!
//! One homogeneous collection of resource handles for a single resource kind.
//! Every owned handle sits in exactly one of two partitions:
//!
//! ```text
//!            all (oldest-first)
//!          ┌─────────┴─────────┐
//!       active              inactive
//!    (in use by a         (idle, handed out
//!       caller)            oldest-first)
//! ```
//!
//! All partition updates happen under one lock, so no caller or background
//! shrinker can observe a handle in both partitions or in neither.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pool = ResourcePool::new("Square", template, factory, PoolSettings::new(5, 10));
//!
//! let square = pool.get(true).expect("pool has room");
//! // ... use the resource ...
//! pool.deactivate(&square, true)?;
//!
//! // Reclaim idle resources down to the initial size
//! pool.shrink(ShrinkOptions::idle_only());
//! ```

use crate::config::{AutoShrinkSettings, ConfigError, PoolSettings};
use crate::error::{PoolError, PoolResult};
use crate::pooling::auto_shrink::{AutoShrinker, ShrinkTarget};
use crate::pooling::resource::{OwningPool, PoolView, PooledResource, ResourceFactory};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

/// Which partition a handle lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Active,
    Inactive,
}

impl Partition {
    const fn from_active(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// Options for `shrink` and `shrink_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrinkOptions {
    /// Permit evicting in-use resources once idle ones run out
    pub remove_active: bool,
    /// Destroy evicted resources instead of merely forgetting them
    pub destroy: bool,
}

impl ShrinkOptions {
    /// Evict idle resources only, destroying them
    pub const fn idle_only() -> Self {
        Self {
            remove_active: false,
            destroy: true,
        }
    }

    /// Set whether evicted resources are destroyed
    pub const fn with_destroy(mut self, destroy: bool) -> Self {
        self.destroy = destroy;
        self
    }
}

impl Default for ShrinkOptions {
    fn default() -> Self {
        Self {
            remove_active: true,
            destroy: true,
        }
    }
}

/// Options for `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Evict one resource to make room when the pool is full
    pub priority: bool,
    /// Destroy the evicted resource instead of forgetting it
    pub destroy: bool,
    /// Permit evicting an in-use resource when no idle one exists
    pub remove_active: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            priority: true,
            destroy: true,
            remove_active: true,
        }
    }
}

/// Per-pool counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Handles in use
    pub active: usize,
    /// Idle handles
    pub inactive: usize,
    /// All owned handles
    pub total: usize,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Position in `all`
    order: u64,
    partition: Partition,
    /// Position in the handle's partition; refreshed on every move
    partition_order: u64,
}

/// Partition bookkeeping, always accessed under the pool lock
struct PoolState<H> {
    next_order: u64,
    slots: HashMap<H, Slot>,
    all: BTreeMap<u64, H>,
    active: BTreeMap<u64, H>,
    inactive: BTreeMap<u64, H>,
    initial_size: usize,
    max_size: usize,
}

impl<H: PooledResource> PoolState<H> {
    fn new(settings: PoolSettings) -> Self {
        Self {
            next_order: 0,
            slots: HashMap::new(),
            all: BTreeMap::new(),
            active: BTreeMap::new(),
            inactive: BTreeMap::new(),
            initial_size: settings.initial_size,
            max_size: settings.max_size,
        }
    }

    fn len(&self) -> usize {
        self.all.len()
    }

    fn contains(&self, handle: &H) -> bool {
        self.slots.contains_key(handle)
    }

    fn has_room(&self) -> bool {
        self.max_size == 0 || self.all.len() < self.max_size
    }

    fn ticket(&mut self) -> u64 {
        let ticket = self.next_order;
        self.next_order += 1;
        ticket
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut BTreeMap<u64, H> {
        match partition {
            Partition::Active => &mut self.active,
            Partition::Inactive => &mut self.inactive,
        }
    }

    fn partition(&self, partition: Partition) -> &BTreeMap<u64, H> {
        match partition {
            Partition::Active => &self.active,
            Partition::Inactive => &self.inactive,
        }
    }

    /// Admit a handle that is not yet owned
    fn insert(&mut self, handle: H, partition: Partition) {
        let order = self.ticket();
        let partition_order = self.ticket();
        self.slots.insert(
            handle.clone(),
            Slot {
                order,
                partition,
                partition_order,
            },
        );
        self.all.insert(order, handle.clone());
        self.partition_mut(partition).insert(partition_order, handle);
    }

    /// Move an owned handle to `partition`; returns `false` if not owned
    ///
    /// A handle already in the target partition keeps its position.
    fn place(&mut self, handle: &H, partition: Partition) -> bool {
        let Some(slot) = self.slots.get(handle).copied() else {
            return false;
        };
        if slot.partition == partition {
            return true;
        }

        self.partition_mut(slot.partition).remove(&slot.partition_order);
        let partition_order = self.ticket();
        self.partition_mut(partition).insert(partition_order, handle.clone());
        if let Some(slot) = self.slots.get_mut(handle) {
            slot.partition = partition;
            slot.partition_order = partition_order;
        }
        true
    }

    /// Forget an owned handle; returns `false` if not owned
    fn take(&mut self, handle: &H) -> bool {
        let Some(slot) = self.slots.remove(handle) else {
            return false;
        };
        self.all.remove(&slot.order);
        self.partition_mut(slot.partition).remove(&slot.partition_order);
        true
    }

    fn oldest(&self, partition: Partition) -> Option<H> {
        self.partition(partition).values().next().cloned()
    }

    /// Evict oldest-first from one partition, or from `all` when `None`
    fn evict_oldest(&mut self, partition: Option<Partition>, budget: &mut usize, evicted: &mut Vec<H>) {
        while *budget > 0 {
            let next = match partition {
                Some(partition) => self.oldest(partition),
                None => self.all.values().next().cloned(),
            };
            let Some(handle) = next else {
                break;
            };
            self.take(&handle);
            evicted.push(handle);
            *budget -= 1;
        }
    }

    /// Remove every handle, returning them oldest-first
    fn drain(&mut self) -> Vec<H> {
        let handles = std::mem::take(&mut self.all).into_values().collect();
        self.slots.clear();
        self.active.clear();
        self.inactive.clear();
        handles
    }

    /// Rebuild both partitions from the resources' own flags
    ///
    /// Handles whose backing resource is gone are dropped. Returns how many.
    fn resort<F>(&mut self, factory: &F) -> usize
    where
        F: ResourceFactory<Handle = H>,
    {
        self.active.clear();
        self.inactive.clear();

        let handles: Vec<H> = self.all.values().cloned().collect();
        let mut dropped = 0;
        for handle in handles {
            if !factory.is_alive(&handle) {
                if let Some(slot) = self.slots.remove(&handle) {
                    self.all.remove(&slot.order);
                }
                dropped += 1;
                continue;
            }

            let partition = Partition::from_active(factory.is_active(&handle));
            let partition_order = self.ticket();
            self.partition_mut(partition).insert(partition_order, handle.clone());
            if let Some(slot) = self.slots.get_mut(&handle) {
                slot.partition = partition;
                slot.partition_order = partition_order;
            }
        }
        dropped
    }

    fn check(&self, kind: &str) -> PoolResult<()> {
        let desync = || PoolError::Desync {
            kind: kind.to_string(),
            all: self.all.len(),
            active: self.active.len(),
            inactive: self.inactive.len(),
        };

        if self.slots.len() != self.all.len() || self.active.len() + self.inactive.len() != self.all.len() {
            return Err(desync());
        }
        for (partition, map) in [(Partition::Active, &self.active), (Partition::Inactive, &self.inactive)] {
            for (order, handle) in map {
                match self.slots.get(handle) {
                    Some(slot) if slot.partition == partition && slot.partition_order == *order => {}
                    _ => return Err(desync()),
                }
            }
        }
        Ok(())
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active.len(),
            inactive: self.inactive.len(),
            total: self.all.len(),
        }
    }
}

/// A pool of reusable resources of one kind
///
/// Pools are shared as `Arc<ResourcePool<F>>`; every method takes `&self` and is
/// safe to call from any thread, including an attached [`AutoShrinker`].
pub struct ResourcePool<F: ResourceFactory> {
    kind: String,
    template: Arc<F::Template>,
    factory: Arc<F>,
    state: Mutex<PoolState<F::Handle>>,
    auto_shrinker: Mutex<Option<AutoShrinker>>,
    self_ref: Weak<Self>,
}

impl<F: ResourceFactory> ResourcePool<F> {
    /// Create a pool and populate it with `initial_size` idle resources
    ///
    /// `initial_size` is clamped to a non-zero `max_size`.
    pub fn new(
        kind: impl Into<String>,
        template: Arc<F::Template>,
        factory: Arc<F>,
        settings: PoolSettings,
    ) -> Arc<Self> {
        let settings = settings.normalized();
        let pool = Arc::new_cyclic(|self_ref| Self {
            kind: kind.into(),
            template,
            factory,
            state: Mutex::new(PoolState::new(settings)),
            auto_shrinker: Mutex::new(None),
            self_ref: self_ref.clone(),
        });
        pool.initialize(false);

        log::info!(
            "Created pool '{}' (initial {}, max {})",
            pool.kind,
            settings.initial_size,
            settings.max_size
        );
        pool
    }

    /// Normalized kind key of this pool
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Template new resources are created from
    pub fn template(&self) -> &Arc<F::Template> {
        &self.template
    }

    /// Number of owned handles
    pub fn count(&self) -> usize {
        self.state.lock().len()
    }

    /// Number of handles in use
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Number of idle handles
    pub fn inactive_count(&self) -> usize {
        self.state.lock().inactive.len()
    }

    /// Active, inactive and total counts taken atomically
    pub fn stats(&self) -> PoolStats {
        self.state.lock().stats()
    }

    /// Size `shrink()` resizes toward
    pub fn initial_size(&self) -> usize {
        self.state.lock().initial_size
    }

    /// Hard cap on owned handles; `0` is unbounded
    pub fn max_size(&self) -> usize {
        self.state.lock().max_size
    }

    /// Change the initial size, raising a non-zero `max_size` to match
    pub fn set_initial_size(&self, initial_size: usize) {
        let mut state = self.state.lock();
        state.initial_size = initial_size;
        if state.max_size != 0 && initial_size > state.max_size {
            state.max_size = initial_size;
        }
    }

    /// Change the hard cap
    ///
    /// A non-zero cap below the current count shrinks the pool immediately,
    /// evicting idle resources first, and clamps `initial_size`.
    pub fn set_max_size(&self, max_size: usize) {
        let evicted = {
            let mut state = self.state.lock();
            state.max_size = max_size;
            if max_size != 0 && state.initial_size > max_size {
                state.initial_size = max_size;
            }
            if max_size != 0 && state.len() > max_size {
                self.shrink_locked(&mut state, max_size, true)
            } else {
                Vec::new()
            }
        };
        self.destroy_handles(&evicted);
    }

    /// Hand out a resource
    ///
    /// Reuses the handle that has been idle longest; otherwise creates a new
    /// one if the pool has room. Returns `None` when the pool is exhausted.
    /// The handle is marked active or inactive according to `activate`.
    pub fn get(&self, activate: bool) -> Option<F::Handle> {
        let partition = Partition::from_active(activate);
        let mut state = self.state.lock();

        let handle = if let Some(handle) = state.oldest(Partition::Inactive) {
            handle
        } else if state.has_room() {
            let handle = self.factory.instantiate(&self.template);
            handle.set_owning_pool(self.owning_pool());
            state.insert(handle.clone(), Partition::Inactive);
            handle
        } else {
            let exhausted = PoolError::PoolExhausted {
                kind: self.kind.clone(),
                max_size: state.max_size,
            };
            log::debug!("{exhausted}");
            return None;
        };

        state.place(&handle, partition);
        self.factory.set_active(&handle, activate);
        Some(handle)
    }

    /// Mark an owned handle as in use
    ///
    /// A handle that is not owned is an error when `strict`, a silent no-op
    /// otherwise.
    pub fn activate(&self, handle: &F::Handle, strict: bool) -> PoolResult<()> {
        self.move_to(handle, Partition::Active, strict, "activate")
    }

    /// Return an owned handle to the idle partition
    ///
    /// A handle that is not owned is an error when `strict`, a silent no-op
    /// otherwise.
    pub fn deactivate(&self, handle: &F::Handle, strict: bool) -> PoolResult<()> {
        self.move_to(handle, Partition::Inactive, strict, "deactivate")
    }

    fn move_to(&self, handle: &F::Handle, partition: Partition, strict: bool, operation: &str) -> PoolResult<()> {
        let mut state = self.state.lock();
        if !state.place(handle, partition) {
            drop(state);
            return self.not_in_pool(strict, operation);
        }
        self.factory.set_active(handle, partition == Partition::Active);
        Ok(())
    }

    fn not_in_pool(&self, strict: bool, operation: &str) -> PoolResult<()> {
        let err = PoolError::NotInPool { kind: self.kind.clone() };
        if strict {
            log::error!("{operation}: {err}");
            Err(err)
        } else {
            log::debug!("{operation} ignored: {err}");
            Ok(())
        }
    }

    /// Whether the pool owns the handle
    pub fn contains(&self, handle: &F::Handle) -> bool {
        self.state.lock().contains(handle)
    }

    /// Remove an owned handle and destroy its resource
    pub fn destroy(&self, handle: &F::Handle) -> PoolResult<()> {
        let owned = self.state.lock().take(handle);
        if !owned {
            return self.not_in_pool(true, "destroy");
        }
        self.factory.destroy(handle);
        Ok(())
    }

    /// Admit a resource created outside the pool
    ///
    /// A full pool with `priority` set first evicts one resource (idle first,
    /// in-use only with `remove_active`). The handle joins the partition
    /// matching its own activation flag. Returns whether it was admitted;
    /// handles already owned, or with no room left, are dropped silently.
    pub fn add(&self, handle: F::Handle, options: AddOptions) -> bool {
        let (admitted, evicted) = {
            let mut state = self.state.lock();
            if state.contains(&handle) {
                return false;
            }

            let count = state.len();
            let evicted = if options.priority && state.max_size > 0 && count == state.max_size {
                self.shrink_locked(&mut state, count - 1, options.remove_active)
            } else {
                Vec::new()
            };

            let admitted = state.has_room();
            if admitted {
                let partition = Partition::from_active(self.factory.is_active(&handle));
                handle.set_owning_pool(self.owning_pool());
                state.insert(handle, partition);
            } else {
                log::debug!("Pool '{}' is full; resource not admitted", self.kind);
            }
            (admitted, evicted)
        };

        if options.destroy {
            self.destroy_handles(&evicted);
        }
        admitted
    }

    /// Forget a handle without destroying it; returns whether it was owned
    pub fn remove(&self, handle: &F::Handle) -> bool {
        self.state.lock().take(handle)
    }

    /// Shrink toward `initial_size`; returns how many resources were evicted
    pub fn shrink(&self, options: ShrinkOptions) -> usize {
        let initial_size = self.initial_size();
        self.shrink_to(initial_size, options)
    }

    /// Shrink toward `size`; returns how many resources were evicted
    ///
    /// Idle resources go first, oldest-first. In-use resources are evicted
    /// only with `remove_active`, so the result can stay above `size`.
    pub fn shrink_to(&self, size: usize, options: ShrinkOptions) -> usize {
        let evicted = {
            let mut state = self.state.lock();
            self.shrink_locked(&mut state, size, options.remove_active)
        };

        if options.destroy {
            self.destroy_handles(&evicted);
        }
        if !evicted.is_empty() {
            log::debug!("Shrunk pool '{}' by {} toward {}", self.kind, evicted.len(), size);
        }
        evicted.len()
    }

    fn shrink_locked(&self, state: &mut PoolState<F::Handle>, size: usize, remove_active: bool) -> Vec<F::Handle> {
        let mut budget = state.len().saturating_sub(size);
        let mut evicted = Vec::with_capacity(budget);
        if budget == 0 {
            return evicted;
        }

        state.evict_oldest(Some(Partition::Inactive), &mut budget, &mut evicted);
        if budget > 0 && remove_active {
            state.evict_oldest(Some(Partition::Active), &mut budget, &mut evicted);

            // Both partitions ran dry before `all` did, so the bookkeeping is off.
            // Rebuild from the resources' flags, then take the oldest remaining.
            if budget > 0 && !state.all.is_empty() {
                if let Err(err) = state.check(&self.kind) {
                    log::error!("{err}; resorting before shrink continues");
                }
                let dropped = state.resort(self.factory.as_ref());
                budget = budget.saturating_sub(dropped);
                state.evict_oldest(None, &mut budget, &mut evicted);
            }
        }
        evicted
    }

    fn destroy_handles(&self, handles: &[F::Handle]) {
        for handle in handles {
            self.factory.destroy(handle);
        }
    }

    /// Destroy every owned resource and empty the pool
    pub fn destroy_all(&self) {
        let handles = self.state.lock().drain();
        self.destroy_handles(&handles);
        if !handles.is_empty() {
            log::debug!("Destroyed {} resources in pool '{}'", handles.len(), self.kind);
        }
    }

    /// Empty the pool (destroying resources if `destroy_objects`) and remove
    /// any attached auto-shrinker
    pub fn destroy_pool(&self, destroy_objects: bool) {
        if destroy_objects {
            self.destroy_all();
        } else {
            self.clear();
        }
        self.auto_shrink_remove();
        log::info!("Destroyed pool '{}'", self.kind);
    }

    /// Forget every handle without destroying resources
    pub fn clear(&self) {
        self.state.lock().drain();
    }

    /// Empty the pool, then refill it with `initial_size` idle resources
    ///
    /// Current resources are destroyed when `destroy` is set and forgotten
    /// otherwise.
    pub fn initialize(&self, destroy: bool) {
        if destroy {
            self.destroy_all();
        } else {
            self.clear();
        }

        let mut state = self.state.lock();
        for _ in 0..state.initial_size {
            let handle = self.factory.instantiate(&self.template);
            handle.set_owning_pool(self.owning_pool());
            self.factory.set_active(&handle, false);
            state.insert(handle, Partition::Inactive);
        }
    }

    /// Rebuild the partitions from each resource's own activation flag
    ///
    /// Use when resources were toggled behind the pool's back. Handles whose
    /// resource no longer exists are forgotten; returns how many.
    pub fn sort(&self) -> usize {
        let dropped = self.state.lock().resort(self.factory.as_ref());
        if dropped > 0 {
            log::debug!("Sort dropped {} dead resources from pool '{}'", dropped, self.kind);
        }
        dropped
    }

    /// Check the partition invariant
    pub fn verify(&self) -> PoolResult<()> {
        self.state.lock().check(&self.kind)
    }

    /// All owned handles, oldest first
    pub fn handles(&self) -> Vec<F::Handle> {
        self.state.lock().all.values().cloned().collect()
    }

    /// Handles in use, in activation order
    pub fn active_handles(&self) -> Vec<F::Handle> {
        self.state.lock().active.values().cloned().collect()
    }

    /// Idle handles, longest idle first
    pub fn inactive_handles(&self) -> Vec<F::Handle> {
        self.state.lock().inactive.values().cloned().collect()
    }

    /// Attach and start an auto-shrinker
    ///
    /// Fails if one is already attached or `settings` do not validate.
    pub fn auto_shrink_attach(&self, settings: AutoShrinkSettings) -> PoolResult<()> {
        let mut slot = self.auto_shrinker.lock();
        if slot.is_some() {
            let err = PoolError::AlreadyAttached { kind: self.kind.clone() };
            log::error!("{err}");
            return Err(err);
        }

        let target: Weak<dyn ShrinkTarget> = self.self_ref.clone();
        let mut shrinker =
            AutoShrinker::new(self.kind.clone(), target, settings).map_err(|e| self.invalid_settings(e))?;
        shrinker.start();
        *slot = Some(shrinker);
        Ok(())
    }

    /// Stop and drop the attached auto-shrinker; returns whether one existed
    pub fn auto_shrink_remove(&self) -> bool {
        let shrinker = self.auto_shrinker.lock().take();
        shrinker.map_or(false, |mut shrinker| {
            shrinker.stop();
            true
        })
    }

    /// Whether an auto-shrinker is attached
    pub fn has_auto_shrink(&self) -> bool {
        self.auto_shrinker.lock().is_some()
    }

    /// Whether the attached auto-shrinker is running
    pub fn auto_shrink_running(&self) -> bool {
        self.auto_shrinker.lock().as_ref().is_some_and(AutoShrinker::is_running)
    }

    /// Current settings of the attached auto-shrinker
    pub fn auto_shrink_settings(&self) -> Option<AutoShrinkSettings> {
        self.auto_shrinker.lock().as_ref().map(AutoShrinker::settings)
    }

    /// Samples collected since the last shrink cycle
    pub fn auto_shrink_samples(&self) -> Option<Vec<usize>> {
        self.auto_shrinker.lock().as_ref().map(AutoShrinker::samples)
    }

    /// (Re)start the attached auto-shrinker, applying its settings immediately
    pub fn auto_shrink_start(&self) -> bool {
        self.with_auto_shrinker(AutoShrinker::start)
    }

    /// Stop the attached auto-shrinker without detaching it
    pub fn auto_shrink_stop(&self) -> bool {
        self.with_auto_shrinker(AutoShrinker::stop)
    }

    /// Replace the attached auto-shrinker's settings from its next cycle on
    ///
    /// Returns whether a shrinker was attached. Settings that do not validate
    /// are rejected and the current ones stay.
    pub fn auto_shrink_reconfigure(&self, settings: AutoShrinkSettings) -> PoolResult<bool> {
        let mut slot = self.auto_shrinker.lock();
        match slot.as_mut() {
            Some(shrinker) => {
                shrinker.reconfigure(settings).map_err(|e| self.invalid_settings(e))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn invalid_settings(&self, err: ConfigError) -> PoolError {
        let err = PoolError::InvalidSettings {
            kind: self.kind.clone(),
            reason: err.to_string(),
        };
        log::error!("{err}");
        err
    }

    fn with_auto_shrinker(&self, apply: impl FnOnce(&mut AutoShrinker)) -> bool {
        let mut slot = self.auto_shrinker.lock();
        slot.as_mut().map_or(false, |shrinker| {
            apply(shrinker);
            true
        })
    }

    fn owning_pool(&self) -> OwningPool<F::Handle> {
        let view: Weak<dyn PoolView<F::Handle>> = self.self_ref.clone();
        OwningPool::new(self.kind.as_str(), view)
    }

    #[cfg(test)]
    fn corrupt_partitions(&self, handle: &F::Handle) {
        let mut state = self.state.lock();
        state.active.retain(|_, h| h != handle);
        state.inactive.retain(|_, h| h != handle);
    }
}

impl<F: ResourceFactory> PoolView<F::Handle> for ResourcePool<F> {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn count(&self) -> usize {
        Self::count(self)
    }

    fn active_count(&self) -> usize {
        Self::active_count(self)
    }

    fn inactive_count(&self) -> usize {
        Self::inactive_count(self)
    }

    fn contains(&self, handle: &F::Handle) -> bool {
        Self::contains(self, handle)
    }

    fn activate(&self, handle: &F::Handle, strict: bool) -> PoolResult<()> {
        Self::activate(self, handle, strict)
    }

    fn deactivate(&self, handle: &F::Handle, strict: bool) -> PoolResult<()> {
        Self::deactivate(self, handle, strict)
    }
}

impl<F: ResourceFactory> ShrinkTarget for ResourcePool<F> {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn active_count(&self) -> usize {
        Self::active_count(self)
    }

    fn inactive_count(&self) -> usize {
        Self::inactive_count(self)
    }

    fn shrink_idle_to(&self, size: usize) -> usize {
        self.shrink_to(size, ShrinkOptions::idle_only())
    }
}

impl<F: ResourceFactory> Drop for ResourcePool<F> {
    fn drop(&mut self) {
        if let Some(mut shrinker) = self.auto_shrinker.get_mut().take() {
            shrinker.stop();
        }
    }
}
