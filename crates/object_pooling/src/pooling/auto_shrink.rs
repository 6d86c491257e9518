//! Adaptive auto-shrinking
//!
//! An [`AutoShrinker`] watches one pool from two background threads:
//!
//! - the **sampler** records the pool's active count every sample period
//! - the **shrinker** resizes the pool every shrink period to the average of
//!   those samples plus a buffer, evicting idle resources only
//!
//! Both threads wait on the same shutdown channel, so `stop()` wakes them
//! immediately and returns only after they have exited.

use crate::config::{AutoShrinkSettings, ConfigError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rand::Rng;
use std::io;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The pool surface an auto-shrinker needs
pub trait ShrinkTarget: Send + Sync {
    /// Kind key of the pool
    fn kind(&self) -> &str;
    /// Number of handles in use
    fn active_count(&self) -> usize;
    /// Number of idle handles
    fn inactive_count(&self) -> usize;
    /// Evict idle handles until at most `size` remain; returns how many went
    fn shrink_idle_to(&self, size: usize) -> usize;
}

/// Lifecycle state of an auto-shrinker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkerState {
    /// No background threads
    Stopped,
    /// Sampler and shrinker threads are running
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerRole {
    Sampler,
    Shrinker,
}

impl WorkerRole {
    const fn name(self) -> &'static str {
        match self {
            Self::Sampler => "sampler",
            Self::Shrinker => "shrinker",
        }
    }
}

/// Size to shrink to: average sample (truncated) plus `buffer`
///
/// Returns `None` when there are no samples yet. Saturates instead of
/// overflowing.
pub fn shrink_target(samples: &[usize], buffer: usize) -> Option<usize> {
    if samples.is_empty() {
        return None;
    }
    let sum = samples.iter().fold(0usize, |sum, &sample| sum.saturating_add(sample));
    Some((sum / samples.len()).saturating_add(buffer))
}

/// State shared between the owner and both worker threads
struct Shared {
    kind: String,
    target: Weak<dyn ShrinkTarget>,
    settings: Mutex<AutoShrinkSettings>,
    samples: Mutex<Vec<usize>>,
}

impl Shared {
    fn period(&self, role: WorkerRole) -> Duration {
        let settings = self.settings.lock();
        match role {
            WorkerRole::Sampler => settings.sample_period(),
            WorkerRole::Shrinker => settings.shrink_period(),
        }
    }

    /// Run one cycle; returns `false` once the pool is gone
    fn tick(&self, role: WorkerRole) -> bool {
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        match role {
            WorkerRole::Sampler => self.record(target.as_ref()),
            WorkerRole::Shrinker => {
                self.shrink(target.as_ref());
            }
        }
        true
    }

    fn record(&self, target: &dyn ShrinkTarget) {
        let active = target.active_count();
        let mut samples = self.samples.lock();
        samples.push(active);
        log::trace!("Pool '{}' sampled {} active ({} samples)", self.kind, active, samples.len());
    }

    fn shrink(&self, target: &dyn ShrinkTarget) -> Option<usize> {
        let samples = std::mem::take(&mut *self.samples.lock());
        let buffer = self.settings.lock().buffer;

        if target.inactive_count() == 0 {
            return None;
        }
        let Some(size) = shrink_target(&samples, buffer) else {
            log::debug!("Pool '{}' has no samples yet; skipping shrink", self.kind);
            return None;
        };

        let evicted = target.shrink_idle_to(size);
        log::debug!(
            "Auto-shrink of pool '{}' over {} samples: target {}, evicted {}",
            self.kind,
            samples.len(),
            size,
            evicted
        );
        Some(evicted)
    }
}

struct Workers {
    shutdown: Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Signal shutdown and join every worker except the calling thread
    fn shut_down(self, kind: &str) {
        // Disconnecting wakes every pending wait
        drop(self.shutdown);
        let current = thread::current().id();
        for handle in self.handles {
            // The last pool reference can be released on a worker thread
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::error!("Auto-shrink worker for pool '{}' panicked", kind);
            }
        }
    }
}

type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

fn spawn_named(name: String, body: WorkerBody) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name).spawn(body)
}

/// Background sampler/shrinker pair for one pool
///
/// The shrinker holds only a weak reference to its pool; both threads exit on
/// their own once the pool is dropped.
pub struct AutoShrinker {
    shared: Arc<Shared>,
    workers: Option<Workers>,
}

impl AutoShrinker {
    /// Create a stopped shrinker for `target`
    ///
    /// Fails if `settings` do not validate.
    pub fn new(
        kind: impl Into<String>,
        target: Weak<dyn ShrinkTarget>,
        settings: AutoShrinkSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                kind: kind.into(),
                target,
                settings: Mutex::new(settings),
                samples: Mutex::new(Vec::new()),
            }),
            workers: None,
        })
    }

    /// Start (or restart) both workers
    ///
    /// A running shrinker is stopped first, so current settings apply from the
    /// first cycle. Both workers share one random start delay. If either
    /// thread cannot be spawned, the other is shut down again and the
    /// shrinker stays stopped.
    pub fn start(&mut self) {
        self.start_with(spawn_named);
    }

    fn start_with(&mut self, spawn: impl Fn(String, WorkerBody) -> io::Result<JoinHandle<()>>) {
        self.stop();

        let settings = self.settings();
        let jitter = start_jitter(settings.max_start_jitter_ms);
        let (shutdown, signal) = crossbeam_channel::bounded::<()>(0);

        let mut handles = Vec::with_capacity(2);
        for role in [WorkerRole::Sampler, WorkerRole::Shrinker] {
            let shared = Arc::clone(&self.shared);
            let signal = signal.clone();
            let spawned = spawn(
                format!("pool-{}-{}", role.name(), self.shared.kind),
                Box::new(move || run_worker(&shared, role, jitter, &signal)),
            );

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    log::error!(
                        "Failed to spawn {} thread for pool '{}': {}; auto-shrink stays stopped",
                        role.name(),
                        self.shared.kind,
                        e
                    );
                    Workers { shutdown, handles }.shut_down(&self.shared.kind);
                    self.shared.samples.lock().clear();
                    return;
                }
            }
        }

        self.workers = Some(Workers { shutdown, handles });
        log::info!(
            "Auto-shrink started for pool '{}' (sample {:?}, shrink {:?}, buffer {}, delay {:?})",
            self.shared.kind,
            settings.sample_period(),
            settings.shrink_period(),
            settings.buffer,
            jitter
        );
    }

    /// Stop both workers and discard collected samples
    ///
    /// Blocks until the workers have exited, so no cycle runs after this
    /// returns. Stopping a stopped shrinker is a no-op.
    pub fn stop(&mut self) {
        let Some(workers) = self.workers.take() else {
            return;
        };
        workers.shut_down(&self.shared.kind);

        self.shared.samples.lock().clear();
        log::info!("Auto-shrink stopped for pool '{}'", self.shared.kind);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ShrinkerState {
        if self.workers.is_some() {
            ShrinkerState::Running
        } else {
            ShrinkerState::Stopped
        }
    }

    /// Whether the workers are running
    pub fn is_running(&self) -> bool {
        self.state() == ShrinkerState::Running
    }

    /// Current settings
    pub fn settings(&self) -> AutoShrinkSettings {
        self.shared.settings.lock().clone()
    }

    /// Replace the settings; running workers pick them up on their next cycle
    ///
    /// Settings that do not validate are rejected and the old ones stay.
    pub fn reconfigure(&mut self, settings: AutoShrinkSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        *self.shared.settings.lock() = settings;
        log::debug!("Auto-shrink for pool '{}' reconfigured", self.shared.kind);
        Ok(())
    }

    /// Samples collected since the last shrink cycle
    pub fn samples(&self) -> Vec<usize> {
        self.shared.samples.lock().clone()
    }

    /// Take one sample right away; returns `false` if the pool is gone
    pub fn sample_now(&self) -> bool {
        self.shared.tick(WorkerRole::Sampler)
    }

    /// Run one shrink cycle right away
    ///
    /// Returns the number of evicted resources, or `None` when the cycle was
    /// skipped (no samples, no idle resources, or the pool is gone). Samples
    /// are cleared either way.
    pub fn shrink_now(&self) -> Option<usize> {
        match self.shared.target.upgrade() {
            Some(target) => self.shared.shrink(target.as_ref()),
            None => {
                self.shared.samples.lock().clear();
                None
            }
        }
    }
}

impl Drop for AutoShrinker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start_jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Wait for `period`; returns `false` if shutdown was signalled instead
fn wait(signal: &Receiver<()>, period: Duration) -> bool {
    match signal.recv_timeout(period) {
        Err(RecvTimeoutError::Timeout) => true,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
    }
}

fn run_worker(shared: &Shared, role: WorkerRole, jitter: Duration, signal: &Receiver<()>) {
    if !wait(signal, jitter) {
        return;
    }
    loop {
        if !wait(signal, shared.period(role)) {
            break;
        }
        if !shared.tick(role) {
            log::debug!("Pool '{}' dropped; {} exiting", shared.kind, role.name());
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    /// Counts-only stand-in for a pool
    struct FakePool {
        active: AtomicUsize,
        inactive: AtomicUsize,
        shrunk_to: Mutex<Vec<usize>>,
        cycles: Mutex<Vec<Instant>>,
        /// Keep the idle count unchanged so every cycle reaches the pool
        hold_idle: AtomicBool,
    }

    impl FakePool {
        fn new(active: usize, inactive: usize) -> Arc<Self> {
            Arc::new(Self {
                active: AtomicUsize::new(active),
                inactive: AtomicUsize::new(inactive),
                shrunk_to: Mutex::new(Vec::new()),
                cycles: Mutex::new(Vec::new()),
                hold_idle: AtomicBool::new(false),
            })
        }

        fn holding_idle(active: usize, inactive: usize) -> Arc<Self> {
            let pool = Self::new(active, inactive);
            pool.hold_idle.store(true, Ordering::SeqCst);
            pool
        }

        fn cycle_count(&self) -> usize {
            self.cycles.lock().len()
        }

        fn wait_for_cycles(&self, count: usize, timeout: Duration) -> bool {
            let deadline = Instant::now() + timeout;
            while self.cycle_count() < count {
                if Instant::now() >= deadline {
                    return false;
                }
                thread::sleep(Duration::from_millis(2));
            }
            true
        }
    }

    impl ShrinkTarget for FakePool {
        fn kind(&self) -> &str {
            "Fake"
        }

        fn active_count(&self) -> usize {
            self.active.load(Ordering::SeqCst)
        }

        fn inactive_count(&self) -> usize {
            self.inactive.load(Ordering::SeqCst)
        }

        fn shrink_idle_to(&self, size: usize) -> usize {
            self.shrunk_to.lock().push(size);
            self.cycles.lock().push(Instant::now());
            if self.hold_idle.load(Ordering::SeqCst) {
                return 0;
            }
            let active = self.active_count();
            let inactive = self.inactive_count();
            let keep = size.saturating_sub(active).min(inactive);
            self.inactive.store(keep, Ordering::SeqCst);
            inactive - keep
        }
    }

    fn shrinker_for(pool: &Arc<FakePool>, settings: AutoShrinkSettings) -> AutoShrinker {
        let target: Weak<dyn ShrinkTarget> = Arc::downgrade(pool) as Weak<dyn ShrinkTarget>;
        AutoShrinker::new("Fake", target, settings).expect("Settings should validate")
    }

    fn fast_settings() -> AutoShrinkSettings {
        AutoShrinkSettings::default()
            .with_sample_period(Duration::from_millis(2))
            .with_shrink_period(Duration::from_millis(40))
            .with_max_start_jitter(Duration::ZERO)
    }

    #[test]
    fn test_shrink_target_truncates_average() {
        assert_eq!(shrink_target(&[], 3), None);
        assert_eq!(shrink_target(&[4, 5], 0), Some(4));
        assert_eq!(shrink_target(&[1, 2, 2], 1), Some(2));
        assert_eq!(shrink_target(&[0, 0], 2), Some(2));
    }

    #[test]
    fn test_shrink_target_saturates() {
        assert_eq!(shrink_target(&[3], usize::MAX), Some(usize::MAX));
        assert_eq!(shrink_target(&[usize::MAX, usize::MAX], 0), Some(usize::MAX / 2));
        assert_eq!(shrink_target(&[usize::MAX, 1], usize::MAX), Some(usize::MAX));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let pool = FakePool::new(0, 0);
        let target: Weak<dyn ShrinkTarget> = Arc::downgrade(&pool) as Weak<dyn ShrinkTarget>;
        let zero_sample = AutoShrinkSettings::default().with_sample_period(Duration::ZERO);
        assert!(matches!(
            AutoShrinker::new("Fake", target, zero_sample.clone()),
            Err(ConfigError::Invalid(_))
        ));

        let mut shrinker = shrinker_for(&pool, AutoShrinkSettings::default().with_buffer(2));
        assert!(shrinker.reconfigure(zero_sample).is_err());
        let zero_shrink = AutoShrinkSettings::default().with_shrink_period(Duration::ZERO);
        assert!(shrinker.reconfigure(zero_shrink).is_err());
        assert_eq!(shrinker.settings().buffer, 2);
        assert_eq!(shrinker.settings().sample_period(), Duration::from_secs(5));
    }

    #[test]
    fn test_manual_cycle_shrinks_to_average() {
        let pool = FakePool::new(5, 3);
        let shrinker = shrinker_for(&pool, AutoShrinkSettings::default());

        assert!(shrinker.sample_now());
        pool.active.store(3, Ordering::SeqCst);
        assert!(shrinker.sample_now());
        assert_eq!(shrinker.samples(), vec![5, 3]);

        // Average 4 with 3 active keeps one idle resource
        assert_eq!(shrinker.shrink_now(), Some(2));
        assert_eq!(*pool.shrunk_to.lock(), vec![4]);
        assert!(shrinker.samples().is_empty());
    }

    #[test]
    fn test_cycle_without_samples_is_skipped() {
        let pool = FakePool::new(2, 4);
        let shrinker = shrinker_for(&pool, AutoShrinkSettings::default());

        assert_eq!(shrinker.shrink_now(), None);
        assert!(pool.shrunk_to.lock().is_empty());
    }

    #[test]
    fn test_cycle_without_idle_clears_samples() {
        let pool = FakePool::new(2, 0);
        let shrinker = shrinker_for(&pool, AutoShrinkSettings::default());

        shrinker.sample_now();
        shrinker.sample_now();
        assert_eq!(shrinker.shrink_now(), None);
        assert!(shrinker.samples().is_empty());
        assert!(pool.shrunk_to.lock().is_empty());
    }

    #[test]
    fn test_buffer_applies() {
        let pool = FakePool::new(1, 6);
        let shrinker = shrinker_for(&pool, AutoShrinkSettings::default().with_buffer(2));

        shrinker.sample_now();
        assert_eq!(shrinker.shrink_now(), Some(4));
        assert_eq!(pool.inactive_count(), 2);
    }

    #[test]
    fn test_dropped_pool_ends_cycles() {
        let pool = FakePool::new(1, 1);
        let shrinker = shrinker_for(&pool, AutoShrinkSettings::default());
        shrinker.sample_now();
        drop(pool);

        assert!(!shrinker.sample_now());
        assert_eq!(shrinker.shrink_now(), None);
        assert!(shrinker.samples().is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let pool = FakePool::new(0, 0);
        let mut shrinker = shrinker_for(&pool, AutoShrinkSettings::default());
        assert_eq!(shrinker.state(), ShrinkerState::Stopped);

        shrinker.start();
        assert_eq!(shrinker.state(), ShrinkerState::Running);

        shrinker
            .reconfigure(AutoShrinkSettings::default().with_buffer(7))
            .expect("Settings should validate");
        assert!(shrinker.is_running());
        assert_eq!(shrinker.settings().buffer, 7);

        // Default jitter is up to 10 s; stop must not wait it out
        let started = Instant::now();
        shrinker.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(shrinker.state(), ShrinkerState::Stopped);

        shrinker.stop();
    }

    #[test]
    fn test_background_cycle_shrinks_idle() {
        let pool = FakePool::new(3, 10);
        let mut shrinker = shrinker_for(&pool, fast_settings());
        shrinker.start();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pool.shrunk_to.lock().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        shrinker.stop();

        let shrunk_to = pool.shrunk_to.lock();
        assert!(!shrunk_to.is_empty(), "Shrinker should have run a cycle");
        assert_eq!(shrunk_to[0], 3);
        assert_eq!(pool.inactive_count(), 0);
    }

    #[test]
    fn test_stop_halts_background_cycles() {
        let pool = FakePool::new(1, 0);
        let mut shrinker = shrinker_for(&pool, fast_settings());
        shrinker.start();
        thread::sleep(Duration::from_millis(20));
        shrinker.stop();

        assert!(shrinker.samples().is_empty());
        thread::sleep(Duration::from_millis(20));
        assert!(shrinker.samples().is_empty());
    }

    #[test]
    fn test_reconfigure_applies_from_next_cycle() {
        let pool = FakePool::holding_idle(1, 5);
        let slow = fast_settings().with_shrink_period(Duration::from_millis(400));
        let fast = fast_settings().with_shrink_period(Duration::from_millis(20));

        let started = Instant::now();
        let mut shrinker = shrinker_for(&pool, slow);
        shrinker.start();
        // Let the shrinker thread enter its first 400 ms wait
        thread::sleep(Duration::from_millis(50));
        shrinker.reconfigure(fast).expect("Settings should validate");

        thread::sleep(Duration::from_millis(250));
        assert_eq!(pool.cycle_count(), 0, "Pending wait should keep the old period");

        assert!(pool.wait_for_cycles(4, Duration::from_secs(5)), "Cycles should follow");
        shrinker.stop();

        let cycles = pool.cycles.lock();
        assert!(cycles[0].duration_since(started) >= Duration::from_millis(390));
        // Three more cycles at 20 ms, far below another 400 ms wait
        assert!(cycles[3].duration_since(cycles[0]) < Duration::from_millis(390));
    }

    #[test]
    fn test_restart_applies_settings_immediately() {
        let pool = FakePool::holding_idle(1, 5);
        let mut shrinker = shrinker_for(&pool, fast_settings().with_shrink_period(Duration::from_secs(30)));
        shrinker.start();
        thread::sleep(Duration::from_millis(20));

        shrinker
            .reconfigure(fast_settings().with_shrink_period(Duration::from_millis(20)))
            .expect("Settings should validate");
        let restarted = Instant::now();
        shrinker.start();

        assert!(pool.wait_for_cycles(1, Duration::from_secs(5)), "Restart should use the new period");
        shrinker.stop();
        assert!(pool.cycles.lock()[0].duration_since(restarted) < Duration::from_secs(1));
    }

    #[test]
    fn test_failed_spawn_leaves_shrinker_stopped() {
        let pool = FakePool::holding_idle(1, 5);
        let mut shrinker = shrinker_for(&pool, fast_settings());

        shrinker.start_with(|name, body| {
            if name.contains("shrinker") {
                Err(io::Error::new(io::ErrorKind::Other, "no threads left"))
            } else {
                spawn_named(name, body)
            }
        });
        assert_eq!(shrinker.state(), ShrinkerState::Stopped);

        // The sampler that did start was shut down again
        thread::sleep(Duration::from_millis(30));
        assert!(shrinker.samples().is_empty());
        assert_eq!(pool.cycle_count(), 0);

        shrinker.start();
        assert!(shrinker.is_running());
        shrinker.stop();
    }
}
