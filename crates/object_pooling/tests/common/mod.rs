//! Shared fixtures for scenario tests

use object_pooling::prelude::*;
use parking_lot::Mutex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub struct Shape {
    pub id: u64,
    pub name: String,
    pub active: AtomicBool,
    pub owner: Mutex<Option<OwningPool<ShapeHandle>>>,
}

#[derive(Clone)]
pub struct ShapeHandle(pub Arc<Shape>);

impl ShapeHandle {
    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    /// Return this shape to whichever pool owns it
    pub fn release(&self) -> PoolResult<()> {
        let owner = self.0.owner.lock().clone();
        match owner {
            Some(owner) => owner.deactivate(self),
            None => Err(PoolError::NotInPool { kind: self.0.name.clone() }),
        }
    }
}

impl fmt::Debug for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id)
    }
}

impl PartialEq for ShapeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ShapeHandle {}

impl Hash for ShapeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PooledResource for ShapeHandle {
    fn kind_key(&self) -> &str {
        &self.0.name
    }

    fn set_owning_pool(&self, pool: OwningPool<Self>) {
        *self.0.owner.lock() = Some(pool);
    }
}

#[derive(Default)]
pub struct ShapeFactory {
    next_id: AtomicU64,
    pub destroyed: AtomicU64,
}

impl ShapeFactory {
    pub fn loose(&self, name: &str, active: bool) -> ShapeHandle {
        ShapeHandle(Arc::new(Shape {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            active: AtomicBool::new(active),
            owner: Mutex::new(None),
        }))
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl ResourceFactory for ShapeFactory {
    type Template = String;
    type Handle = ShapeHandle;

    fn instantiate(&self, template: &String) -> ShapeHandle {
        self.loose(&format!("{template}(Clone)"), false)
    }

    fn destroy(&self, _handle: &ShapeHandle) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_active(&self, handle: &ShapeHandle) -> bool {
        handle.is_active()
    }

    fn set_active(&self, handle: &ShapeHandle, active: bool) {
        handle.0.active.store(active, Ordering::SeqCst);
    }
}

pub fn pool(initial_size: usize, max_size: usize) -> (Arc<ShapeFactory>, Arc<ResourcePool<ShapeFactory>>) {
    let factory = Arc::new(ShapeFactory::default());
    let pool = ResourcePool::new(
        "Square",
        Arc::new("Square".to_string()),
        Arc::clone(&factory),
        PoolSettings::new(initial_size, max_size),
    );
    (factory, pool)
}

pub fn template(name: &str) -> Arc<String> {
    Arc::new(name.to_string())
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
