//! Beacon Wallclock Core - Slot and epoch arithmetic
//!
//! This crate defines the pure time model of a slot/epoch based chain:
//! - Half-open time windows (TimeWindow)
//! - Slots and the calculator mapping numbers and times to slots
//! - Epochs and the calculator mapping numbers, slots and times to epochs
//! - Chain configuration presets and validation
//!
//! Nothing in here sleeps, spawns or locks. The scheduler that turns this
//! model into change notifications lives in `wallclock-runtime`.

pub mod config;
pub mod epoch;
pub mod error;
pub mod slot;
pub mod window;

pub use config::*;
pub use epoch::*;
pub use error::*;
pub use slot::*;
pub use window::*;
