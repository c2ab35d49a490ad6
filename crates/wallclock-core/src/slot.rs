//! Slots and the slot calculator

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::window::{scale, whole_units};
use crate::{TimeWindow, WallClockError, WallClockResult};

/// A numbered slot and the window it occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    number: u64,
    window: TimeWindow,
}

impl Slot {
    pub fn new(number: u64, window: TimeWindow) -> Self {
        Slot { number, window }
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

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} {}", self.number, self.window)
    }
}

/// Maps slot numbers to windows and wall-clock times to slots.
///
/// Genesis and slot duration are fixed at construction. Times before genesis
/// clamp to slot 0; use [`SlotCalculator::checked_from_time`] to tell them
/// apart.
#[derive(Clone, Debug)]
pub struct SlotCalculator {
    genesis: SystemTime,
    slot_duration: Duration,
}

impl SlotCalculator {
    /// Create a slot calculator
    ///
    /// # Panics
    ///
    /// Panics if `slot_duration` is zero.
    pub fn new(genesis: SystemTime, slot_duration: Duration) -> Self {
        assert!(!slot_duration.is_zero(), "slot duration must be positive");
        SlotCalculator {
            genesis,
            slot_duration,
        }
    }

    pub fn genesis(&self) -> SystemTime {
        self.genesis
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Build the slot with the given number
    pub fn from_number(&self, number: u64) -> Slot {
        Slot::new(
            number,
            TimeWindow::new(
                self.genesis + scale(self.slot_duration, number),
                self.genesis + scale(self.slot_duration, number + 1),
            ),
        )
    }

    /// Slot containing the current wall-clock time
    pub fn current(&self) -> Slot {
        self.from_time(SystemTime::now())
    }

    /// Slot containing `t`
    pub fn from_time(&self, t: SystemTime) -> Slot {
        let elapsed = t.duration_since(self.genesis).unwrap_or_default();
        self.from_number(whole_units(elapsed, self.slot_duration))
    }

    /// Slot containing `t`, failing if `t` precedes genesis
    pub fn checked_from_time(&self, t: SystemTime) -> WallClockResult<Slot> {
        match self.genesis.duration_since(t) {
            Ok(by) if !by.is_zero() => Err(WallClockError::BeforeGenesis { by }),
            _ => Ok(self.from_time(t)),
        }
    }

    pub fn is_before_genesis(&self, t: SystemTime) -> bool {
        t < self.genesis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::UNIX_EPOCH;

    fn calculator() -> SlotCalculator {
        SlotCalculator::new(
            UNIX_EPOCH + Duration::from_secs(1_606_824_023),
            Duration::from_secs(12),
        )
    }

    #[test]
    fn test_slot_zero_starts_at_genesis() {
        let slots = calculator();
        let slot = slots.from_number(0);

        assert_eq!(slot.number(), 0);
        assert_eq!(slot.time_window().start(), slots.genesis());
        assert_eq!(slot.time_window().duration(), Duration::from_secs(12));
    }

    #[test]
    fn test_from_time_floors() {
        let slots = calculator();
        let genesis = slots.genesis();

        assert_eq!(slots.from_time(genesis).number(), 0);
        assert_eq!(slots.from_time(genesis + Duration::from_millis(11_999)).number(), 0);
        assert_eq!(slots.from_time(genesis + Duration::from_secs(12)).number(), 1);
        assert_eq!(slots.from_time(genesis + Duration::from_secs(12 * 100 + 5)).number(), 100);
    }

    #[test]
    fn test_before_genesis_clamps_to_zero() {
        let slots = calculator();
        let before = slots.genesis() - Duration::from_secs(30);

        assert!(slots.is_before_genesis(before));
        assert_eq!(slots.from_time(before).number(), 0);
        assert_eq!(
            slots.checked_from_time(before),
            Err(WallClockError::BeforeGenesis {
                by: Duration::from_secs(30)
            })
        );
        assert_eq!(slots.checked_from_time(slots.genesis()).map(|s| s.number()), Ok(0));
    }

    #[test]
    fn test_current_contains_now() {
        let slots = SlotCalculator::new(SystemTime::now(), Duration::from_secs(60));
        let slot = slots.current();

        assert_eq!(slot.number(), 0);
        assert!(slot.time_window().is_active());
    }

    #[test]
    #[should_panic(expected = "slot duration must be positive")]
    fn test_zero_duration_panics() {
        SlotCalculator::new(SystemTime::now(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_times_in_window_map_back(number in 0u64..10_000_000, offset_ms in 0u64..12_000) {
            let slots = calculator();
            let slot = slots.from_number(number);
            let t = slot.time_window().start() + Duration::from_millis(offset_ms);

            prop_assert!(slot.time_window().contains(t));
            prop_assert_eq!(slots.from_time(t).number(), number);
        }

        #[test]
        fn prop_windows_are_contiguous(number in 0u64..u32::MAX as u64 * 4) {
            let slots = calculator();
            prop_assert_eq!(
                slots.from_number(number).time_window().end(),
                slots.from_number(number + 1).time_window().start()
            );
        }
    }
}
