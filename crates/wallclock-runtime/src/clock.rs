//! Wallclock - slot and epoch change scheduler

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use wallclock_core::{
    ChainConfig, Epoch, EpochCalculator, Slot, SlotCalculator, WallClockResult,
};

use crate::boundary::{self, Shared};

/// How long `stop` waits for each loop to exit before aborting it
pub const STOP_SETTLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Scheduler counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockStats {
    /// Slot boundaries dispatched
    pub slot_boundaries: u64,
    /// Epoch boundaries dispatched
    pub epoch_boundaries: u64,
    /// Slot callbacks handed to the blocking pool
    pub slot_callbacks_dispatched: u64,
    /// Epoch callbacks handed to the blocking pool
    pub epoch_callbacks_dispatched: u64,
    /// Boundary loops still running
    pub active_loops: usize,
}

/// Beacon wallclock - tells the current slot and epoch and notifies on change
///
/// Two background tasks, one per boundary kind, sleep until the current
/// window ends and then dispatch every registered callback with the freshly
/// resolved slot or epoch. Callbacks run on the runtime's blocking pool and
/// are never awaited, so a slow callback cannot delay boundary detection.
///
/// A host that loses its chain connection should drop its handle (hold it as
/// `Option<Arc<WallClock>>`) and stop registering; there is no empty or
/// default clock to register against.
pub struct WallClock {
    slots: SlotCalculator,
    epochs: EpochCalculator,
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl WallClock {
    /// Create a wallclock and start its loops on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, or if `slot_duration` or
    /// `slots_per_epoch` is zero.
    pub fn new(genesis: SystemTime, slot_duration: Duration, slots_per_epoch: u64) -> Self {
        Self::with_handle(genesis, slot_duration, slots_per_epoch, Handle::current())
    }

    /// Create a wallclock whose loops and callbacks run on `handle`
    ///
    /// # Panics
    ///
    /// Panics if `slot_duration` or `slots_per_epoch` is zero.
    pub fn with_handle(
        genesis: SystemTime,
        slot_duration: Duration,
        slots_per_epoch: u64,
        handle: Handle,
    ) -> Self {
        let slots = SlotCalculator::new(genesis, slot_duration);
        let epochs = EpochCalculator::new(genesis, slot_duration, slots_per_epoch);
        let shared = Arc::new(Shared::default());
        let (shutdown, _) = watch::channel(false);

        shared.active_loops.fetch_add(2, Ordering::AcqRel);
        let tasks = vec![
            handle.spawn(boundary::run(
                slots.clone(),
                Arc::clone(&shared),
                shutdown.subscribe(),
                handle.clone(),
            )),
            handle.spawn(boundary::run(
                epochs.clone(),
                Arc::clone(&shared),
                shutdown.subscribe(),
                handle.clone(),
            )),
        ];

        info!(
            slot_duration = ?slot_duration,
            slots_per_epoch,
            "wallclock started"
        );

        WallClock {
            slots,
            epochs,
            shared,
            shutdown,
            tasks: Mutex::new(Some(tasks)),
        }
    }

    /// Validate `config` and start a wallclock on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn from_config(config: &ChainConfig) -> WallClockResult<Self> {
        config.validate()?;
        Ok(Self::new(
            config.genesis,
            config.slot_duration,
            config.slots_per_epoch,
        ))
    }

    /// Current slot and epoch, resolved from a single clock read
    pub fn now(&self) -> (Slot, Epoch) {
        self.from_time(SystemTime::now())
    }

    /// Slot and epoch containing `t`
    pub fn from_time(&self, t: SystemTime) -> (Slot, Epoch) {
        (self.slots.from_time(t), self.epochs.from_time(t))
    }

    pub fn slots(&self) -> &SlotCalculator {
        &self.slots
    }

    pub fn epochs(&self) -> &EpochCalculator {
        &self.epochs
    }

    /// Register a callback for every slot boundary. Ignored once stopped.
    ///
    /// The callback may run on any thread, possibly concurrently with itself,
    /// and possibly before this returns.
    pub fn on_slot_changed<F>(&self, callback: F)
    where
        F: Fn(Slot) + Send + Sync + 'static,
    {
        let mut registry = self.shared.registry.write();
        if self.shared.is_closed() {
            return;
        }
        registry.slot.push(Arc::new(callback));
    }

    /// Register a callback for every epoch boundary. Ignored once stopped.
    pub fn on_epoch_changed<F>(&self, callback: F)
    where
        F: Fn(Epoch) + Send + Sync + 'static,
    {
        let mut registry = self.shared.registry.write();
        if self.shared.is_closed() {
            return;
        }
        registry.epoch.push(Arc::new(callback));
    }

    pub fn slot_callback_count(&self) -> usize {
        self.shared.registry.read().slot.len()
    }

    pub fn epoch_callback_count(&self) -> usize {
        self.shared.registry.read().epoch.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn stats(&self) -> ClockStats {
        let shared = &self.shared;
        ClockStats {
            slot_boundaries: shared.slot_counters.boundaries.load(Ordering::Relaxed),
            epoch_boundaries: shared.epoch_counters.boundaries.load(Ordering::Relaxed),
            slot_callbacks_dispatched: shared.slot_counters.dispatched.load(Ordering::Relaxed),
            epoch_callbacks_dispatched: shared.epoch_counters.dispatched.load(Ordering::Relaxed),
            active_loops: shared.active_loops.load(Ordering::Acquire),
        }
    }

    /// Stop both loops and drop all registrations.
    ///
    /// Idempotent. Concurrent callers all return once the loops have exited;
    /// only the first does the work. No new dispatch cycle begins after this
    /// returns, but callbacks from a cycle already dispatched may still be
    /// running or about to run.
    ///
    /// Synchronous callers without an async context can drive it on the
    /// runtime the clock was started on:
    ///
    /// ```no_run
    /// # use std::time::{Duration, SystemTime};
    /// # use wallclock_runtime::WallClock;
    /// let runtime = tokio::runtime::Runtime::new().unwrap();
    /// let clock = {
    ///     let _guard = runtime.enter();
    ///     WallClock::new(SystemTime::now(), Duration::from_secs(12), 32)
    /// };
    /// runtime.handle().block_on(clock.stop());
    /// ```
    pub async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;

        if self.close() {
            info!("wallclock stopping");
        }

        let Some(handles) = tasks.take() else {
            return;
        };

        for mut handle in handles {
            match tokio::time::timeout(STOP_SETTLE_TIMEOUT, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "boundary loop failed"),
                Err(_) => {
                    warn!("boundary loop did not settle, aborting");
                    handle.abort();
                }
            }
        }

        info!(stats = ?self.stats(), "wallclock stopped");
    }

    fn close(&self) -> bool {
        let closed = self.shared.close();
        if closed {
            self.shutdown.send_replace(true);
        }
        closed
    }
}

impl Drop for WallClock {
    fn drop(&mut self) {
        self.close();
    }
}
