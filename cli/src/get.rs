// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, ChipOpts};
use anyhow::{Context, Result};
use clap::Parser;
use gpioseq::{ChipsetId, Level, PinId};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(alias("g"))]
pub struct Opts {
    /// The chipset containing the lines
    #[arg(short, long, value_name = "chip")]
    chip: ChipsetId,

    /// The offsets of the lines to read
    #[arg(value_name = "line", required = true)]
    lines: Vec<PinId>,

    /// Display line values as '0' (off) or '1' (on)
    #[arg(long)]
    numeric: bool,

    #[command(flatten)]
    chip_opts: ChipOpts,
}

pub fn cmd(opts: &Opts) -> Result<()> {
    // reads are never cancelled, so nothing to settle
    let coord = common::coordinator(&opts.chip_opts, Duration::ZERO);
    let mut print_values = Vec::new();
    for &pin in &opts.lines {
        let level = coord
            .read_pin(opts.chip, pin)
            .with_context(|| format!("unable to read line {} on chip {}", pin, opts.chip))?;
        print_values.push(format_value(pin, level, opts.numeric));
    }
    println!("{}", print_values.join(" "));
    Ok(())
}

fn format_value(pin: PinId, level: Level, numeric: bool) -> String {
    if numeric {
        let v: bool = level.into();
        format!("{}={}", pin, v as u8)
    } else {
        format!("{}={}", pin, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_value() {
        assert_eq!(super::format_value(81, Level::On, false), "81=on");
        assert_eq!(super::format_value(93, Level::Off, false), "93=off");
        assert_eq!(super::format_value(81, Level::On, true), "81=1");
        assert_eq!(super::format_value(93, Level::Off, true), "93=0");
    }
}
