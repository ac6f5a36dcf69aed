// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// The logical level of a pin.
///
/// `Off` is the safe state a pin is expected to rest at.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Level {
    /// The pin is off.
    #[default]
    Off,
    /// The pin is on.
    On,
}

impl Level {
    /// The level opposite the current level.
    pub fn not(&self) -> Level {
        match self {
            Level::On => Level::Off,
            Level::Off => Level::On,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::On => "on",
            Level::Off => "off",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "off" | "inactive" | "false" | "low" => Ok(Level::Off),
            "1" | "on" | "active" | "true" | "high" => Ok(Level::On),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

impl From<Level> for bool {
    fn from(l: Level) -> bool {
        match l {
            Level::Off => false,
            Level::On => true,
        }
    }
}

impl From<bool> for Level {
    fn from(b: bool) -> Level {
        match b {
            false => Level::Off,
            true => Level::On,
        }
    }
}
