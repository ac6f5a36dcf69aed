// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use clap::Parser;
use gpioseq::chardev::{ChardevPinMap, ChardevWriter};
use gpioseq::{Executor, Options, Registry, StateCoordinator};
use log::{LevelFilter, Metadata, Record};
use simple_signal::Signal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// common helper functions

/// Build a coordinator driving the character devices selected by the options.
pub fn coordinator(chip_opts: &ChipOpts, settle_period: Duration) -> StateCoordinator {
    let writer = ChardevWriter::new()
        .with_chip_dir(chip_opts.chip_dir.clone())
        .with_consumer(chip_opts.consumer.clone());
    let executor = Executor::new(Arc::new(writer));
    let registry = Registry::new(executor.clone()).with_settle_period(settle_period);
    let pin_map = ChardevPinMap::new().with_chip_dir(chip_opts.chip_dir.clone());
    StateCoordinator::from_parts(executor, Arc::new(registry), Arc::new(pin_map))
}

/// Cancel all running sequences, restoring their pins, on SIGINT or SIGTERM.
///
/// Returns a flag set once a signal has been caught.
pub fn restore_on_signal(registry: Arc<Registry>) -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let interrupted = interrupted.clone();
        move |_| {
            interrupted.store(true, Ordering::SeqCst);
            registry.cancel_all();
        }
    });
    interrupted
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseDurationError {
    #[error("'{0}' unknown units - use 's', 'ms' or 'us'.")]
    Units(String),
    #[error("'{0}' must start with a digit")]
    NoDigits(String),
    #[error("'{0}' {1}")]
    ParseDigits(String, std::num::ParseIntError),
    #[error("'{0}' is too large")]
    Overflow(String),
}

pub fn parse_duration(s: &str) -> std::result::Result<Duration, ParseDurationError> {
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    let t = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(0) => return Err(ParseDurationError::NoDigits(s.into())),
        Some(n) => {
            let (num, units) = s.split_at(n);
            let t = num
                .parse::<u64>()
                .map_err(|e| ParseDurationError::ParseDigits(num.into(), e))?;
            let scale = match units {
                "us" => 1000,
                "ms" => 1000000,
                "s" => 1000000000,
                _ => return Err(ParseDurationError::Units(s.into())),
            };
            t.checked_mul(scale)
        }
        None => s
            .parse::<u64>()
            .map_err(|e| ParseDurationError::ParseDigits(s.into(), e))?
            .checked_mul(1000000),
    };
    t.map(Duration::from_nanos)
        .ok_or_else(|| ParseDurationError::Overflow(s.into()))
}

pub fn format_error(verbose: bool, e: &anyhow::Error) -> String {
    if verbose {
        format!("{e:#}")
    } else {
        format!("{e}")
    }
}

// logging

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{} {:<5} {}",
                chrono::Local::now().format("%FT%T%.3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

pub fn log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Send log records to stderr, stamped with the local time.
pub fn init_logger(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log_level(verbose));
    }
}

// common command line parser options

#[derive(Debug, Parser)]
/// Options to locate the GPIO character devices.
pub struct ChipOpts {
    /// The directory containing the GPIO character devices
    ///
    /// Chipset N is the gpiochipN device in this directory.
    #[arg(long, value_name = "dir", env = "GPIOSEQ_CHIP_DIR", default_value = "/dev")]
    pub chip_dir: PathBuf,

    /// The consumer label applied to requested lines.
    #[arg(
        short = 'C',
        long,
        value_name = "name",
        env = "GPIOSEQ_CONSUMER",
        default_value = "gpioseq"
    )]
    pub consumer: String,
}

#[derive(Debug, Default, Parser)]
/// Options to toggle lines rather than set them once.
pub struct RepeatOpts {
    /// The period to hold each level while toggling
    ///
    /// The period is taken as milliseconds unless otherwise specified.
    #[arg(short = 'p', long, value_name = "period", value_parser = parse_duration)]
    pub period: Option<Duration>,

    /// Toggle the lines to the opposite level and back this many times
    ///
    /// The lines finish at the requested level.
    /// If only --period is provided the lines are toggled once.
    #[arg(short = 'r', long, value_name = "count")]
    pub repeat: Option<u32>,
}

impl RepeatOpts {
    pub fn options(&self) -> gpioseq::Result<Option<Options>> {
        match (self.period, self.repeat) {
            (None, None) => Ok(None),
            (period, repeat) => {
                Options::new(period.unwrap_or_default(), repeat.unwrap_or(1)).map(Some)
            }
        }
    }
}

#[derive(Debug, Parser)]
/// Options controlling the restoration of lines on interrupt.
pub struct ShutdownOpts {
    /// The time allowed for each line to settle after being restored
    ///
    /// The period is taken as milliseconds unless otherwise specified.
    #[arg(
        long,
        value_name = "period",
        env = "GPIOSEQ_SETTLE_PERIOD",
        default_value = "50ms",
        value_parser = parse_duration
    )]
    pub settle_period: Duration,
}
