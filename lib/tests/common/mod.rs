// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(dead_code)]

use gpioseq::pin::{PinWriter, StaticPinMap};
use gpioseq::{ChipsetId, Error, Level, PinId, Result, StateCoordinator};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// time for a freshly spawned sequence to reach its first wait
const STARTUP_DELAY: Duration = Duration::from_millis(50);

pub fn wait_startup_delay() {
    std::thread::sleep(STARTUP_DELAY);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Write {
    pub chipset: ChipsetId,
    pub pin: PinId,
    pub level: Level,
}

/// A PinWriter that records every write, and can be made to fail for a chipset.
#[derive(Debug, Default)]
pub struct Recorder {
    writes: Mutex<Vec<Write>>,
    broken_chipset: Option<ChipsetId>,
}

impl Recorder {
    pub fn new() -> Arc<Recorder> {
        Arc::new(Recorder::default())
    }

    pub fn broken(chipset: ChipsetId) -> Arc<Recorder> {
        Arc::new(Recorder {
            broken_chipset: Some(chipset),
            ..Default::default()
        })
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn levels(&self, chipset: ChipsetId, pin: PinId) -> Vec<Level> {
        self.writes()
            .iter()
            .filter(|w| w.chipset == chipset && w.pin == pin)
            .map(|w| w.level)
            .collect()
    }

    pub fn last_level(&self, chipset: ChipsetId, pin: PinId) -> Option<Level> {
        self.levels(chipset, pin).last().copied()
    }
}

impl PinWriter for Recorder {
    fn write(&self, chipset: ChipsetId, pin: PinId, level: Level) -> Result<()> {
        if self.broken_chipset == Some(chipset) {
            return Err(Error::io(
                chipset,
                pin,
                std::io::Error::new(std::io::ErrorKind::Other, "device unavailable"),
            ));
        }
        self.writes.lock().unwrap().push(Write {
            chipset,
            pin,
            level,
        });
        Ok(())
    }

    fn read(&self, chipset: ChipsetId, pin: PinId) -> Result<Level> {
        Ok(self.last_level(chipset, pin).unwrap_or_default())
    }
}

pub fn pin_map() -> StaticPinMap {
    StaticPinMap::default()
        .with_chipset(1, [81, 93])
        .with_chipset(2, 0..8)
}

pub fn coordinator(rec: &Arc<Recorder>) -> StateCoordinator {
    StateCoordinator::new(rec.clone(), Arc::new(pin_map()))
}
