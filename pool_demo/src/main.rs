//! Pool demo
//!
//! Drives a few sprite pools through bursts of demand followed by a quiet
//! period, so the auto-shrinkers visibly trim idle sprites back down.
//!
//! Usage: `pool_demo [config.toml|config.ron]`

use object_pooling::prelude::*;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Demo errors
#[derive(Error, Debug)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pool: {0}")]
    Pool(#[from] PoolError),
}

/// Sprite template: a name plus the texture it would be drawn with
struct SpriteTemplate {
    name: String,
    texture: &'static str,
}

struct Sprite {
    id: u64,
    name: String,
    texture: &'static str,
    visible: AtomicBool,
    pool: Mutex<Option<OwningPool<SpriteHandle>>>,
}

#[derive(Clone)]
struct SpriteHandle(Arc<Sprite>);

impl SpriteHandle {
    /// Hide the sprite and hand it back to its pool
    fn release(&self) -> PoolResult<()> {
        let pool = self.0.pool.lock().clone();
        match pool {
            Some(pool) => pool.deactivate(self),
            None => Err(PoolError::NotInPool { kind: self.0.name.clone() }),
        }
    }
}

impl PartialEq for SpriteHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SpriteHandle {}

impl Hash for SpriteHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PooledResource for SpriteHandle {
    fn kind_key(&self) -> &str {
        &self.0.name
    }

    fn set_owning_pool(&self, pool: OwningPool<Self>) {
        *self.0.pool.lock() = Some(pool);
    }
}

#[derive(Default)]
struct SpriteFactory {
    next_id: AtomicU64,
}

impl ResourceFactory for SpriteFactory {
    type Template = SpriteTemplate;
    type Handle = SpriteHandle;

    fn instantiate(&self, template: &SpriteTemplate) -> SpriteHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::trace!("Loading sprite #{} with texture {}", id, template.texture);
        SpriteHandle(Arc::new(Sprite {
            id,
            name: format!("{}(Clone)", template.name),
            texture: template.texture,
            visible: AtomicBool::new(false),
            pool: Mutex::new(None),
        }))
    }

    fn destroy(&self, handle: &SpriteHandle) {
        log::trace!("Unloading sprite #{} ({})", handle.0.id, handle.0.texture);
    }

    fn is_active(&self, handle: &SpriteHandle) -> bool {
        handle.0.visible.load(Ordering::Relaxed)
    }

    fn set_active(&self, handle: &SpriteHandle, active: bool) {
        handle.0.visible.store(active, Ordering::Relaxed);
    }
}

fn template(name: &str, texture: &'static str) -> Arc<SpriteTemplate> {
    Arc::new(SpriteTemplate {
        name: name.to_string(),
        texture,
    })
}

fn load_config() -> Result<PoolingConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => Ok(PoolingConfig::load_from_file(&path)?),
        None => Ok(PoolingConfig {
            default_pool: PoolSettings::new(8, 64),
            auto_shrink: Some(
                AutoShrinkSettings::default()
                    .with_sample_period(Duration::from_millis(20))
                    .with_shrink_period(Duration::from_millis(400))
                    .with_buffer(2)
                    .with_max_start_jitter(Duration::from_millis(100)),
            ),
            ..PoolingConfig::default()
        }),
    }
}

/// One frame: spawn up to `demand` sprites, then release some at random
fn tick(batch: &PoolBatch<SpriteFactory>, live: &mut Vec<SpriteHandle>, demand: usize, rng: &mut StdRng) -> PoolResult<()> {
    for _ in 0..demand {
        match batch.random_object(rng, true) {
            Some(sprite) => live.push(sprite),
            None => log::debug!("Sprite pool exhausted; skipping spawn"),
        }
    }

    let mut index = 0;
    while index < live.len() {
        if rng.gen_bool(0.4) {
            live.swap_remove(index).release()?;
        } else {
            index += 1;
        }
    }
    Ok(())
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    env_logger::Builder::from_default_env()
        .filter_level(config.log_filter())
        .init();

    log::info!("Starting pool demo");
    let manager = PoolingManager::new(Arc::new(SpriteFactory::default()), config)?;

    let requests = [
        ("Bullet", template("Bullet", "bullet.png")),
        ("Asteroid", template("Asteroid", "asteroid.png")),
        ("Spark", template("Spark", "spark.png")),
        ("Bullet", template("Bullet", "bullet_alt.png")),
    ];
    let batch = PoolBatch::build(
        manager.registry(),
        requests.iter().map(|(kind, template)| (*kind, Arc::clone(template))),
        manager.config().default_pool,
        manager.config().auto_shrink.as_ref(),
    )?;
    log::info!("Batch holds {} pools", batch.len());

    // Stray sprites spawned before the pools existed
    let factory = Arc::clone(manager.registry().factory());
    let strays: Vec<_> = (0..3)
        .map(|_| {
            let sprite_template = template("Spark", "spark.png");
            let sprite = factory.instantiate(&sprite_template);
            (sprite_template, sprite)
        })
        .collect();
    let adopted = adopt_resources(manager.registry(), strays, AddOptions::default());
    log::info!("Adopted {} stray sprites", adopted);

    let mut rng = StdRng::seed_from_u64(42);
    let mut live = Vec::new();

    log::info!("Burst phase");
    for _ in 0..30 {
        tick(&batch, &mut live, 12, &mut rng)?;
        std::thread::sleep(Duration::from_millis(10));
    }
    manager.registry().log_stats();

    log::info!("Quiet phase");
    for _ in 0..100 {
        tick(&batch, &mut live, 1, &mut rng)?;
        std::thread::sleep(Duration::from_millis(10));
    }
    manager.registry().log_stats();

    for sprite in live.drain(..) {
        sprite.release()?;
    }
    let evicted = manager.registry().shrink_all(ShrinkOptions::idle_only());
    log::info!("Final shrink evicted {} sprites", evicted);
    manager.registry().log_stats();

    batch.remove_auto_shrinks();
    manager.shutdown();
    log::info!("Pool demo finished");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Pool demo failed: {}", e);
        eprintln!("pool_demo: {e}");
        std::process::exit(1);
    }
}
