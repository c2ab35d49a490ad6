//! Error types for the wallclock

use std::time::Duration;

use thiserror::Error;

/// Wallclock errors
///
/// Slot and epoch conversions are total; these only come out of the checked
/// conversions and configuration validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WallClockError {
    #[error("Slot duration must be greater than zero")]
    ZeroSlotDuration,

    #[error("Slots per epoch must be greater than zero")]
    ZeroSlotsPerEpoch,

    #[error("Time is {by:?} before genesis")]
    BeforeGenesis { by: Duration },
}

/// Result type for wallclock operations
pub type WallClockResult<T> = Result<T, WallClockError>;
