//! In-memory resource factory for unit tests

use crate::config::PoolSettings;
use crate::pooling::pool::ResourcePool;
use crate::pooling::resource::{OwningPool, PooledResource, ResourceFactory};
use parking_lot::Mutex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) struct TestResource {
    pub id: u64,
    pub name: String,
    pub active: AtomicBool,
    pub alive: AtomicBool,
    pub owner: Mutex<Option<OwningPool<TestHandle>>>,
}

#[derive(Clone)]
pub(crate) struct TestHandle(pub Arc<TestResource>);

impl TestHandle {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.0.alive.load(Ordering::SeqCst)
    }

    pub fn owner(&self) -> Option<OwningPool<TestHandle>> {
        self.0.owner.lock().clone()
    }
}

impl fmt::Debug for TestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHandle")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("active", &self.is_active())
            .finish()
    }
}

impl PartialEq for TestHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TestHandle {}

impl Hash for TestHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PooledResource for TestHandle {
    fn kind_key(&self) -> &str {
        &self.0.name
    }

    fn set_owning_pool(&self, pool: OwningPool<Self>) {
        *self.0.owner.lock() = Some(pool);
    }
}

#[derive(Default)]
pub(crate) struct TestFactory {
    next_id: AtomicU64,
    pub destroyed: Mutex<Vec<u64>>,
}

impl TestFactory {
    /// A resource created outside any pool
    pub fn external(&self, name: &str, active: bool) -> TestHandle {
        TestHandle(Arc::new(TestResource {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            active: AtomicBool::new(active),
            alive: AtomicBool::new(true),
            owner: Mutex::new(None),
        }))
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.lock().len()
    }

    pub fn was_destroyed(&self, handle: &TestHandle) -> bool {
        self.destroyed.lock().contains(&handle.id())
    }
}

impl ResourceFactory for TestFactory {
    type Template = String;
    type Handle = TestHandle;

    fn instantiate(&self, template: &String) -> TestHandle {
        self.external(&format!("{template}(Clone)"), false)
    }

    fn destroy(&self, handle: &TestHandle) {
        handle.0.alive.store(false, Ordering::SeqCst);
        self.destroyed.lock().push(handle.id());
    }

    fn is_active(&self, handle: &TestHandle) -> bool {
        handle.is_active()
    }

    fn set_active(&self, handle: &TestHandle, active: bool) {
        handle.0.active.store(active, Ordering::SeqCst);
    }

    fn is_alive(&self, handle: &TestHandle) -> bool {
        handle.is_alive()
    }
}

pub(crate) fn test_pool(
    initial_size: usize,
    max_size: usize,
) -> (Arc<TestFactory>, Arc<ResourcePool<TestFactory>>) {
    let factory = Arc::new(TestFactory::default());
    let pool = ResourcePool::new(
        "Square",
        Arc::new("Square".to_string()),
        Arc::clone(&factory),
        PoolSettings::new(initial_size, max_size),
    );
    (factory, pool)
}
