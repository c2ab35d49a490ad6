//! Scheduler behaviour against the real wall clock.
//! Run: `cargo test -p wallclock-runtime --test boundary_dispatch -- --nocapture`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use wallclock_runtime::{Epoch, Slot, WallClock};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slot_and_epoch_callbacks_fire_once_per_boundary() {
    init_tracing();
    let clock = WallClock::new(SystemTime::now(), Duration::from_secs(1), 2);

    let slot_count = Arc::new(AtomicU64::new(0));
    let epoch_count = Arc::new(AtomicU64::new(0));
    {
        let slot_count = Arc::clone(&slot_count);
        clock.on_slot_changed(move |_| {
            slot_count.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let epoch_count = Arc::clone(&epoch_count);
        clock.on_epoch_changed(move |_| {
            epoch_count.fetch_add(1, Ordering::SeqCst);
        });
    }

    tokio::time::sleep(Duration::from_millis(5100)).await;

    assert_eq!(slot_count.load(Ordering::SeqCst), 5, "slot callbacks");
    assert_eq!(epoch_count.load(Ordering::SeqCst), 2, "epoch callbacks");

    let stats = clock.stats();
    assert_eq!(stats.slot_boundaries, 5);
    assert_eq!(stats.epoch_boundaries, 2);

    clock.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn callbacks_receive_the_new_slot_and_epoch() {
    init_tracing();
    let clock = WallClock::new(SystemTime::now(), Duration::from_millis(300), 2);

    let slots: Arc<Mutex<Vec<Slot>>> = Arc::default();
    let epochs: Arc<Mutex<Vec<Epoch>>> = Arc::default();
    {
        let slots = Arc::clone(&slots);
        clock.on_slot_changed(move |slot| slots.lock().push(slot));
    }
    {
        let epochs = Arc::clone(&epochs);
        clock.on_epoch_changed(move |epoch| epochs.lock().push(epoch));
    }

    tokio::time::sleep(Duration::from_millis(1350)).await;
    clock.stop().await;

    let mut slot_numbers: Vec<u64> = slots.lock().iter().map(|s| s.number()).collect();
    slot_numbers.sort_unstable();
    assert_eq!(slot_numbers, vec![1, 2, 3, 4]);

    let mut epoch_numbers: Vec<u64> = epochs.lock().iter().map(|e| e.number()).collect();
    epoch_numbers.sort_unstable();
    assert_eq!(epoch_numbers, vec![1, 2]);

    for slot in slots.lock().iter() {
        assert_eq!(slot.time_window().duration(), Duration::from_millis(300));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_callback_does_not_delay_boundaries() {
    init_tracing();
    let clock = WallClock::new(SystemTime::now(), Duration::from_millis(200), 4);

    let fast = Arc::new(AtomicU64::new(0));
    clock.on_slot_changed(|_| std::thread::sleep(Duration::from_secs(1)));
    {
        let fast = Arc::clone(&fast);
        clock.on_slot_changed(move |_| {
            fast.fetch_add(1, Ordering::SeqCst);
        });
    }

    tokio::time::sleep(Duration::from_millis(1100)).await;
    clock.stop().await;

    assert_eq!(fast.load(Ordering::SeqCst), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_registry_still_tracks_boundaries() {
    let clock = WallClock::new(SystemTime::now(), Duration::from_millis(100), 2);

    tokio::time::sleep(Duration::from_millis(450)).await;
    let stats = clock.stats();
    clock.stop().await;

    assert_eq!(stats.slot_boundaries, 4);
    assert_eq!(stats.slot_callbacks_dispatched, 0);
    assert_eq!(stats.epoch_callbacks_dispatched, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_clocks_do_not_interfere() {
    let a = WallClock::new(SystemTime::now(), Duration::from_millis(100), 2);
    let b = WallClock::new(SystemTime::now(), Duration::from_millis(100), 2);

    let count = Arc::new(AtomicU64::new(0));
    {
        let count = Arc::clone(&count);
        b.on_slot_changed(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }

    a.stop().await;
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(a.is_stopped());
    assert!(!b.is_stopped());
    assert_eq!(b.stats().active_loops, 2);
    assert_eq!(count.load(Ordering::SeqCst), 2);

    b.stop().await;
}
