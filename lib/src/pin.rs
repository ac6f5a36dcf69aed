// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{ChipsetId, Level, PinId, Result};
use nohash_hasher::{IntMap, IntSet};
use std::time::Duration;

/// Performs single pin accesses on the underlying device.
///
/// Implementations are shared between threads, so must provide their own
/// synchronisation.
pub trait PinWriter: Send + Sync {
    /// Drive a single pin to a level.
    fn write(&self, chipset: ChipsetId, pin: PinId, level: Level) -> Result<()>;

    /// Read the current level of a single pin.
    fn read(&self, chipset: ChipsetId, pin: PinId) -> Result<Level>;
}

/// Identifies the pins that exist on each chipset.
pub trait PinMap: Send + Sync {
    fn has_pin(&self, chipset: ChipsetId, pin: PinId) -> bool;
}

/// The delay primitive used between toggle steps.
pub trait Sleep: Send + Sync {
    fn sleep(&self, period: Duration);
}

/// Sleeps the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, period: Duration) {
        if !period.is_zero() {
            std::thread::sleep(period);
        }
    }
}

/// A fixed [`PinMap`] held in memory.
///
/// ```
/// use gpioseq::pin::{PinMap, StaticPinMap};
///
/// let pm = StaticPinMap::default()
///     .with_chipset(1, [81, 93])
///     .with_chipset(2, 0..8);
/// assert!(pm.has_pin(1, 93));
/// assert!(!pm.has_pin(2, 8));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticPinMap {
    chipsets: IntMap<ChipsetId, IntSet<PinId>>,
}

impl StaticPinMap {
    /// Add pins to a chipset, creating the chipset if necessary.
    pub fn with_chipset<I>(mut self, chipset: ChipsetId, pins: I) -> Self
    where
        I: IntoIterator<Item = PinId>,
    {
        self.chipsets.entry(chipset).or_default().extend(pins);
        self
    }
}

impl PinMap for StaticPinMap {
    fn has_pin(&self, chipset: ChipsetId, pin: PinId) -> bool {
        self.chipsets
            .get(&chipset)
            .is_some_and(|pins| pins.contains(&pin))
    }
}
