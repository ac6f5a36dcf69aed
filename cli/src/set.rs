// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, ChipOpts, RepeatOpts, ShutdownOpts};
use anyhow::{bail, Context, Result};
use clap::Parser;
use gpioseq::{ChipsetId, PinId, SetRequest};
use std::sync::atomic::Ordering;

#[derive(Debug, Parser)]
#[command(alias("s"))]
pub struct Opts {
    /// The chipset containing the lines
    #[arg(short, long, value_name = "chip")]
    chip: ChipsetId,

    /// The level to finish at
    ///
    /// Levels may be off/inactive/low/false/0 or on/active/high/true/1.
    #[arg(value_name = "state")]
    state: String,

    /// The offsets of the lines to set, in the order they are to be written
    #[arg(value_name = "line", required = true)]
    lines: Vec<PinId>,

    #[command(flatten)]
    repeat_opts: RepeatOpts,

    #[command(flatten)]
    chip_opts: ChipOpts,

    #[command(flatten)]
    shutdown_opts: ShutdownOpts,
}

impl Opts {
    fn request(&self) -> gpioseq::Result<SetRequest> {
        let req = SetRequest::parse(self.chip, self.lines.clone(), &self.state)?;
        Ok(match self.repeat_opts.options()? {
            Some(options) => req.with_options(options),
            None => req,
        })
    }
}

pub fn cmd(opts: &Opts) -> Result<()> {
    let req = opts.request()?;
    let coord = common::coordinator(&opts.chip_opts, opts.shutdown_opts.settle_period);
    let interrupted = common::restore_on_signal(coord.registry().clone());
    coord
        .set_single(&req)
        .with_context(|| format!("unable to set lines {:?} on chip {}", opts.lines, opts.chip))?;
    if interrupted.load(Ordering::SeqCst) {
        bail!("interrupted - lines restored");
    }
    Ok(())
}
