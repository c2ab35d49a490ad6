//! Epochs and the epoch calculator

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::window::{scale, whole_units};
use crate::{TimeWindow, WallClockError, WallClockResult};

/// A numbered epoch and the window it occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Epoch {
    number: u64,
    window: TimeWindow,
}

impl Epoch {
    pub fn new(number: u64, window: TimeWindow) -> Self {
        Epoch { number, window }
    }

    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[inline]
    pub fn time_window(&self) -> TimeWindow {
        self.window
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {} {}", self.number, self.window)
    }
}

/// Maps epoch numbers to windows, and slots or wall-clock times to epochs.
///
/// An epoch spans `slots_per_epoch` consecutive slots starting at
/// `number * slots_per_epoch`. Times before genesis clamp to epoch 0.
#[derive(Clone, Debug)]
pub struct EpochCalculator {
    genesis: SystemTime,
    slot_duration: Duration,
    slots_per_epoch: u64,
}

impl EpochCalculator {
    /// Create an epoch calculator
    ///
    /// # Panics
    ///
    /// Panics if `slot_duration` or `slots_per_epoch` is zero.
    pub fn new(genesis: SystemTime, slot_duration: Duration, slots_per_epoch: u64) -> Self {
        assert!(!slot_duration.is_zero(), "slot duration must be positive");
        assert!(slots_per_epoch > 0, "slots per epoch must be positive");
        EpochCalculator {
            genesis,
            slot_duration,
            slots_per_epoch,
        }
    }

    pub fn genesis(&self) -> SystemTime {
        self.genesis
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    pub fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch
    }

    /// Length of one epoch
    pub fn epoch_duration(&self) -> Duration {
        scale(self.slot_duration, self.slots_per_epoch)
    }

    /// Build the epoch with the given number
    pub fn from_number(&self, number: u64) -> Epoch {
        let first_slot = number * self.slots_per_epoch;
        let next_first_slot = (number + 1) * self.slots_per_epoch;
        Epoch::new(
            number,
            TimeWindow::new(
                self.genesis + scale(self.slot_duration, first_slot),
                self.genesis + scale(self.slot_duration, next_first_slot),
            ),
        )
    }

    /// Epoch containing the current wall-clock time
    pub fn current(&self) -> Epoch {
        self.from_time(SystemTime::now())
    }

    /// Epoch containing `t`
    pub fn from_time(&self, t: SystemTime) -> Epoch {
        let elapsed = t.duration_since(self.genesis).unwrap_or_default();
        self.from_number(whole_units(elapsed, self.epoch_duration()))
    }

    /// Epoch containing `t`, failing if `t` precedes genesis
    pub fn checked_from_time(&self, t: SystemTime) -> WallClockResult<Epoch> {
        match self.genesis.duration_since(t) {
            Ok(by) if !by.is_zero() => Err(WallClockError::BeforeGenesis { by }),
            _ => Ok(self.from_time(t)),
        }
    }

    /// Number of the first slot in `epoch`
    pub fn first_slot(&self, epoch: &Epoch) -> u64 {
        epoch.number() * self.slots_per_epoch
    }

    /// Number of the last slot in `epoch`
    pub fn last_slot(&self, epoch: &Epoch) -> u64 {
        (epoch.number() + 1) * self.slots_per_epoch - 1
    }

    /// Epoch containing the given slot
    pub fn from_slot_number(&self, slot: u64) -> Epoch {
        self.from_number(slot / self.slots_per_epoch)
    }

    pub fn is_before_genesis(&self, t: SystemTime) -> bool {
        t < self.genesis
    }
}
