// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, ChipOpts, RepeatOpts, ShutdownOpts};
use anyhow::{bail, Context, Result};
use clap::Parser;
use gpioseq::{ChipsetId, PinId, SetRequest};
use std::sync::atomic::Ordering;

#[derive(Debug, Parser)]
#[command(alias("b"))]
pub struct Opts {
    /// The sets of lines to drive concurrently
    ///
    /// Each set is specified in chip:line[,line...]=state format.
    ///
    /// Levels may be off/inactive/low/false/0 or on/active/high/true/1.
    /// e.g.
    ///     1:81,93=on 2:4=off
    ///
    /// Every set is validated before any is started.
    #[arg(name = "chip:lines=state", required = true, value_parser = parse_line_set, verbatim_doc_comment)]
    line_sets: Vec<LineSet>,

    #[command(flatten)]
    repeat_opts: RepeatOpts,

    #[command(flatten)]
    chip_opts: ChipOpts,

    #[command(flatten)]
    shutdown_opts: ShutdownOpts,
}

impl Opts {
    fn requests(&self) -> gpioseq::Result<Vec<SetRequest>> {
        let options = self.repeat_opts.options()?;
        self.line_sets
            .iter()
            .map(|ls| {
                let req = SetRequest::parse(ls.chip, ls.lines.clone(), &ls.state)?;
                Ok(match options {
                    Some(options) => req.with_options(options),
                    None => req,
                })
            })
            .collect()
    }
}

pub fn cmd(opts: &Opts) -> Result<()> {
    let reqs = opts.requests()?;
    let coord = common::coordinator(&opts.chip_opts, opts.shutdown_opts.settle_period);
    let interrupted = common::restore_on_signal(coord.registry().clone());
    let batch = coord
        .set_multiple(reqs)
        .context("unable to start line sets")?;
    let failed = batch.wait();
    if failed > 0 {
        bail!("{} of {} line sets failed", failed, opts.line_sets.len());
    }
    if interrupted.load(Ordering::SeqCst) {
        bail!("interrupted - lines restored");
    }
    Ok(())
}

/// The lines on one chip to be driven to a state.
#[derive(Clone, Debug, Eq, PartialEq)]
struct LineSet {
    chip: ChipsetId,
    lines: Vec<PinId>,
    state: String,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
enum ParseLineSetError {
    #[error("invalid chip:lines=state: no '{1}' found in '{0}'")]
    Missing(String, char),
    #[error("invalid chip in '{0}': {1}")]
    Chip(String, std::num::ParseIntError),
    #[error("invalid line in '{0}': {1}")]
    Line(String, std::num::ParseIntError),
}

fn parse_line_set(s: &str) -> std::result::Result<LineSet, ParseLineSetError> {
    let (chip_lines, state) = s
        .split_once('=')
        .ok_or_else(|| ParseLineSetError::Missing(s.into(), '='))?;
    let (chip, lines) = chip_lines
        .split_once(':')
        .ok_or_else(|| ParseLineSetError::Missing(s.into(), ':'))?;
    let chip = chip
        .parse()
        .map_err(|e| ParseLineSetError::Chip(s.into(), e))?;
    let lines = lines
        .split(',')
        .map(|l| l.parse().map_err(|e| ParseLineSetError::Line(s.into(), e)))
        .collect::<std::result::Result<Vec<PinId>, _>>()?;
    Ok(LineSet {
        chip,
        lines,
        state: state.into(),
    })
}
