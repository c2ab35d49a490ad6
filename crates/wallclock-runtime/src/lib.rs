//! Beacon Wallclock Runtime - Slot and epoch change notifications
//!
//! This crate runs the scheduler on top of `wallclock-core`:
//! 1. Resolve the current slot/epoch
//! 2. Sleep until its window ends (or until stopped)
//! 3. Re-resolve after waking, never trusting the nominal duration
//! 4. Snapshot the registered callbacks and dispatch them fire-and-forget
//!
//! Slot and epoch boundaries run on two independent Tokio tasks.

mod boundary;
pub mod clock;

pub use clock::*;
pub use wallclock_core::*;
