//! Boundary loop shared by the slot and epoch schedulers

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, trace};

use wallclock_core::{Epoch, EpochCalculator, Slot, SlotCalculator, TimeWindow};

/// Registered change callback
pub(crate) type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Callback lists for both boundaries
#[derive(Default)]
pub(crate) struct Registry {
    pub slot: Vec<Callback<Slot>>,
    pub epoch: Vec<Callback<Epoch>>,
}

#[derive(Default)]
pub(crate) struct LoopCounters {
    pub boundaries: AtomicU64,
    pub dispatched: AtomicU64,
}

/// State shared between the clock handle and its loops
#[derive(Default)]
pub(crate) struct Shared {
    pub registry: RwLock<Registry>,
    /// Set once, only while holding the registry write lock
    closed: AtomicBool,
    pub slot_counters: LoopCounters,
    pub epoch_counters: LoopCounters,
    pub active_loops: AtomicUsize,
}

impl Shared {
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Latch the closed flag and drop all registrations.
    /// Returns false if the flag was already set.
    pub fn close(&self) -> bool {
        let mut registry = self.registry.write();
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        registry.slot.clear();
        registry.epoch.clear();
        true
    }
}

/// Decrements `active_loops` when the loop ends, including on abort
struct ActiveLoop<'a>(&'a AtomicUsize);

impl Drop for ActiveLoop<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One kind of protocol boundary the scheduler tracks
pub(crate) trait Boundary: Send + Sync + 'static {
    type Unit: Copy + Send + 'static;

    const KIND: &'static str;

    fn resolve(&self) -> Self::Unit;

    fn number(unit: &Self::Unit) -> u64;

    fn window(unit: &Self::Unit) -> TimeWindow;

    fn callbacks(registry: &Registry) -> &[Callback<Self::Unit>];

    fn counters(shared: &Shared) -> &LoopCounters;
}

impl Boundary for SlotCalculator {
    type Unit = Slot;

    const KIND: &'static str = "slot";

    fn resolve(&self) -> Slot {
        self.current()
    }

    fn number(unit: &Slot) -> u64 {
        unit.number()
    }

    fn window(unit: &Slot) -> TimeWindow {
        unit.time_window()
    }

    fn callbacks(registry: &Registry) -> &[Callback<Slot>] {
        &registry.slot
    }

    fn counters(shared: &Shared) -> &LoopCounters {
        &shared.slot_counters
    }
}

impl Boundary for EpochCalculator {
    type Unit = Epoch;

    const KIND: &'static str = "epoch";

    fn resolve(&self) -> Epoch {
        self.current()
    }

    fn number(unit: &Epoch) -> u64 {
        unit.number()
    }

    fn window(unit: &Epoch) -> TimeWindow {
        unit.time_window()
    }

    fn callbacks(registry: &Registry) -> &[Callback<Epoch>] {
        &registry.epoch
    }

    fn counters(shared: &Shared) -> &LoopCounters {
        &shared.epoch_counters
    }
}

/// Sleep to the end of the current window, re-resolve, dispatch. Repeat
/// until the clock is closed.
///
/// The caller increments `active_loops` before spawning this.
pub(crate) async fn run<B: Boundary>(
    calculator: B,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
    handle: Handle,
) {
    let _active = ActiveLoop(&shared.active_loops);
    debug!(kind = B::KIND, "boundary loop started");

    loop {
        if shared.is_closed() {
            break;
        }

        let current = calculator.resolve();
        let remaining = B::window(&current).remaining_from(SystemTime::now());
        if remaining.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = shutdown.changed() => {}
            }
        }

        if shared.is_closed() {
            break;
        }

        // Timer and wall clock can disagree by a hair; only a new number is a boundary.
        let next = calculator.resolve();
        if B::number(&next) <= B::number(&current) {
            trace!(kind = B::KIND, number = B::number(&next), "woke before boundary");
            continue;
        }

        let callbacks = {
            let registry = shared.registry.read();
            if shared.is_closed() {
                break;
            }
            B::callbacks(&registry).to_vec()
        };

        let counters = B::counters(&shared);
        counters.boundaries.fetch_add(1, Ordering::Relaxed);
        counters
            .dispatched
            .fetch_add(callbacks.len() as u64, Ordering::Relaxed);
        debug!(
            kind = B::KIND,
            number = B::number(&next),
            callbacks = callbacks.len(),
            "boundary reached"
        );

        for callback in callbacks {
            let shared = Arc::clone(&shared);
            // Untracked. A callback that never returns pins a blocking thread, not this loop.
            handle.spawn_blocking(move || {
                if !shared.is_closed() {
                    callback(next);
                }
            });
        }
    }

    debug!(kind = B::KIND, "boundary loop exited");
}
