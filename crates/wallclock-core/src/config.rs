//! Chain timing configuration

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{EpochCalculator, SlotCalculator, WallClockError, WallClockResult};

/// Mainnet beacon chain genesis (seconds since the UNIX epoch)
pub const MAINNET_GENESIS_TIME: u64 = 1_606_824_023;
/// Sepolia beacon chain genesis
pub const SEPOLIA_GENESIS_TIME: u64 = 1_655_733_600;
/// Holesky beacon chain genesis
pub const HOLESKY_GENESIS_TIME: u64 = 1_695_902_400;

/// Beacon chain slot length
pub const SECONDS_PER_SLOT: u64 = 12;
/// Beacon chain epoch length in slots
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Chain timing parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Reference instant slot 0 starts at
    pub genesis: SystemTime,
    /// Length of one slot
    pub slot_duration: Duration,
    /// Slots in one epoch
    pub slots_per_epoch: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainConfig {
    pub fn new(genesis: SystemTime, slot_duration: Duration, slots_per_epoch: u64) -> Self {
        ChainConfig {
            genesis,
            slot_duration,
            slots_per_epoch,
        }
    }

    /// Ethereum mainnet beacon chain
    pub fn mainnet() -> Self {
        Self::beacon(MAINNET_GENESIS_TIME)
    }

    /// Sepolia testnet beacon chain
    pub fn sepolia() -> Self {
        Self::beacon(SEPOLIA_GENESIS_TIME)
    }

    /// Holesky testnet beacon chain
    pub fn holesky() -> Self {
        Self::beacon(HOLESKY_GENESIS_TIME)
    }

    fn beacon(genesis_secs: u64) -> Self {
        ChainConfig {
            genesis: UNIX_EPOCH + Duration::from_secs(genesis_secs),
            slot_duration: Duration::from_secs(SECONDS_PER_SLOT),
            slots_per_epoch: SLOTS_PER_EPOCH,
        }
    }

    /// Check the parameters the calculators require
    pub fn validate(&self) -> WallClockResult<()> {
        if self.slot_duration.is_zero() {
            return Err(WallClockError::ZeroSlotDuration);
        }
        if self.slots_per_epoch == 0 {
            return Err(WallClockError::ZeroSlotsPerEpoch);
        }
        Ok(())
    }

    pub fn slot_calculator(&self) -> WallClockResult<SlotCalculator> {
        self.validate()?;
        Ok(SlotCalculator::new(self.genesis, self.slot_duration))
    }

    pub fn epoch_calculator(&self) -> WallClockResult<EpochCalculator> {
        self.validate()?;
        Ok(EpochCalculator::new(
            self.genesis,
            self.slot_duration,
            self.slots_per_epoch,
        ))
    }
}
