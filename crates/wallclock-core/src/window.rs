//! Time windows for slots and epochs

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time Window - the half-open interval a slot or epoch occupies
/// TW = [start, end)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: SystemTime,
    end: SystemTime,
}

impl TimeWindow {
    /// Create a window. `start` must be strictly before `end`.
    pub fn new(start: SystemTime, end: SystemTime) -> Self {
        debug_assert!(start < end, "time window must not be empty");
        TimeWindow { start, end }
    }

    /// Inclusive lower bound
    #[inline]
    pub fn start(&self) -> SystemTime {
        self.start
    }

    /// Exclusive upper bound
    #[inline]
    pub fn end(&self) -> SystemTime {
        self.end
    }

    /// Length of the window
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start).unwrap_or_default()
    }

    /// Check if a time is within the window
    #[inline]
    pub fn contains(&self, t: SystemTime) -> bool {
        t >= self.start && t < self.end
    }

    /// Time left from `t` until the window ends.
    /// Zero once the window has elapsed.
    #[inline]
    pub fn remaining_from(&self, t: SystemTime) -> Duration {
        self.end.duration_since(t).unwrap_or_default()
    }

    /// Check if the window contains the current wall-clock time
    pub fn is_active(&self) -> bool {
        self.contains(SystemTime::now())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unix = |t: SystemTime| t.duration_since(UNIX_EPOCH).unwrap_or_default();
        write!(
            f,
            "[{:.3}s, {:.3}s)",
            unix(self.start).as_secs_f64(),
            unix(self.end).as_secs_f64()
        )
    }
}

/// `unit * count` without the u32 limit of `Duration * u32`
pub(crate) fn scale(unit: Duration, count: u64) -> Duration {
    let nanos = unit.as_nanos() * count as u128;
    Duration::new(
        (nanos / 1_000_000_000) as u64,
        (nanos % 1_000_000_000) as u32,
    )
}

/// Number of whole `unit`s in `elapsed`
pub(crate) fn whole_units(elapsed: Duration, unit: Duration) -> u64 {
    (elapsed.as_nanos() / unit.as_nanos()) as u64
}
