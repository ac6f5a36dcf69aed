// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::pin::{PinMap, PinWriter};
use crate::{ChipsetId, Error, Level, PinId, Result};
use gpiocdev::chip::Chip;
use gpiocdev::line::Value;
use gpiocdev::request::Request;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const DEFAULT_CHIP_DIR: &str = "/dev";
const DEFAULT_CONSUMER: &str = "gpioseq";

fn chip_path(dir: &Path, chipset: ChipsetId) -> PathBuf {
    dir.join(format!("gpiochip{chipset}"))
}

impl From<Level> for Value {
    fn from(l: Level) -> Value {
        match l {
            Level::Off => Value::Inactive,
            Level::On => Value::Active,
        }
    }
}

impl From<Value> for Level {
    fn from(v: Value) -> Level {
        match v {
            Value::Inactive => Level::Off,
            Value::Active => Level::On,
        }
    }
}

/// A [`PinWriter`] for Linux GPIO character devices.
///
/// Chipset N is the character device `gpiochipN` in the chip directory,
/// which is `/dev` by default.
///
/// Pins are requested as outputs on their first write, and the requests are
/// held so the pins remain driven between writes.  The pins are released when
/// the writer is dropped.
#[derive(Debug)]
pub struct ChardevWriter {
    chip_dir: PathBuf,
    consumer: String,
    outputs: Mutex<HashMap<(ChipsetId, PinId), Request>>,
}

impl ChardevWriter {
    pub fn new() -> ChardevWriter {
        ChardevWriter {
            chip_dir: PathBuf::from(DEFAULT_CHIP_DIR),
            consumer: DEFAULT_CONSUMER.into(),
            outputs: Mutex::default(),
        }
    }

    /// Set the directory containing the GPIO character devices.
    pub fn with_chip_dir<P: Into<PathBuf>>(mut self, dir: P) -> ChardevWriter {
        self.chip_dir = dir.into();
        self
    }

    /// Set the consumer label applied to requested pins.
    pub fn with_consumer<N: Into<String>>(mut self, consumer: N) -> ChardevWriter {
        self.consumer = consumer.into();
        self
    }

    fn outputs(&self) -> MutexGuard<'_, HashMap<(ChipsetId, PinId), Request>> {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ChardevWriter {
    fn default() -> Self {
        ChardevWriter::new()
    }
}

impl PinWriter for ChardevWriter {
    fn write(&self, chipset: ChipsetId, pin: PinId, level: Level) -> Result<()> {
        let mut outputs = self.outputs();
        if let Some(req) = outputs.get(&(chipset, pin)) {
            return req
                .set_value(pin, level.into())
                .map_err(|e| Error::io(chipset, pin, e));
        }
        let req = Request::builder()
            .on_chip(chip_path(&self.chip_dir, chipset))
            .with_consumer(&self.consumer)
            .with_line(pin)
            .as_output(level.into())
            .request()
            .map_err(|e| Error::io(chipset, pin, e))?;
        outputs.insert((chipset, pin), req);
        Ok(())
    }

    fn read(&self, chipset: ChipsetId, pin: PinId) -> Result<Level> {
        if let Some(req) = self.outputs().get(&(chipset, pin)) {
            return req
                .value(pin)
                .map(Level::from)
                .map_err(|e| Error::io(chipset, pin, e));
        }
        let req = Request::builder()
            .on_chip(chip_path(&self.chip_dir, chipset))
            .with_consumer(&self.consumer)
            .with_line(pin)
            .as_is()
            .request()
            .map_err(|e| Error::io(chipset, pin, e))?;
        req.value(pin)
            .map(Level::from)
            .map_err(|e| Error::io(chipset, pin, e))
    }
}

/// A [`PinMap`] drawn from the Linux GPIO character devices.
///
/// A pin exists if the chip for the chipset can be opened and the pin is
/// within the range of lines the chip provides.
#[derive(Clone, Debug)]
pub struct ChardevPinMap {
    chip_dir: PathBuf,
}

impl ChardevPinMap {
    pub fn new() -> ChardevPinMap {
        ChardevPinMap {
            chip_dir: PathBuf::from(DEFAULT_CHIP_DIR),
        }
    }

    /// Set the directory containing the GPIO character devices.
    pub fn with_chip_dir<P: Into<PathBuf>>(mut self, dir: P) -> ChardevPinMap {
        self.chip_dir = dir.into();
        self
    }

    /// The number of pins provided by the chipset.
    pub fn num_pins(&self, chipset: ChipsetId) -> Option<u32> {
        let chip = Chip::from_path(chip_path(&self.chip_dir, chipset)).ok()?;
        chip.info().ok().map(|info| info.num_lines)
    }
}

impl Default for ChardevPinMap {
    fn default() -> Self {
        ChardevPinMap::new()
    }
}

impl PinMap for ChardevPinMap {
    fn has_pin(&self, chipset: ChipsetId, pin: PinId) -> bool {
        self.num_pins(chipset).is_some_and(|n| pin < n)
    }
}
