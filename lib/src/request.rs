// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{ChipsetId, Error, Level, PinId, Result};
use std::time::Duration;

/// The repeat settings for a toggled request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Options {
    delay: Duration,
    repeat: u32,
}

impl Options {
    /// Create options that toggle `repeat` times, holding each level for `delay`.
    ///
    /// The repeat count must be at least 1.
    pub fn new(delay: Duration, repeat: u32) -> Result<Options> {
        if repeat == 0 {
            return Err(Error::InvalidRepeat);
        }
        Ok(Options { delay, repeat })
    }

    /// The period each level is held for.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The number of opposite/target cycles.
    pub fn repeat(&self) -> u32 {
        self.repeat
    }
}

/// A request to drive a set of pins on one chipset to a level.
///
/// Without [`Options`] the pins are written once.
/// With options the pins are toggled to the opposite level and back, `repeat` times,
/// so a full run always finishes at the requested state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetRequest {
    chipset: ChipsetId,
    pins: Vec<PinId>,
    state: Level,
    options: Option<Options>,
}

impl SetRequest {
    /// Create a single shot request.
    ///
    /// The pins are written in the order provided, and must not be empty.
    pub fn new(chipset: ChipsetId, pins: Vec<PinId>, state: Level) -> Result<SetRequest> {
        if pins.is_empty() {
            return Err(Error::NoPins(chipset));
        }
        Ok(SetRequest {
            chipset,
            pins,
            state,
            options: None,
        })
    }

    /// Create a request with the state provided as a text token, such as "on" or "0".
    pub fn parse(chipset: ChipsetId, pins: Vec<PinId>, state: &str) -> Result<SetRequest> {
        SetRequest::new(chipset, pins, state.parse()?)
    }

    /// Toggle the pins rather than write them once.
    pub fn with_options(mut self, options: Options) -> SetRequest {
        self.options = Some(options);
        self
    }

    pub fn chipset(&self) -> ChipsetId {
        self.chipset
    }

    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }

    pub fn state(&self) -> Level {
        self.state
    }

    pub fn options(&self) -> Option<&Options> {
        self.options.as_ref()
    }

    /// The request used to return the pins to rest after the sequence is cancelled.
    ///
    /// Drives the same pins to the opposite of the requested state, once.
    pub fn reversed(&self) -> SetRequest {
        SetRequest {
            chipset: self.chipset,
            pins: self.pins.clone(),
            state: self.state.not(),
            options: None,
        }
    }
}
