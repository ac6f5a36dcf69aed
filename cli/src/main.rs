// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool for driving toggle sequences on GPIO lines.

use clap::Parser;
use std::process::ExitCode;

mod batch;
mod common;
mod get;
mod set;

fn main() -> ExitCode {
    match Opts::try_parse() {
        Ok(opt) => {
            common::init_logger(opt.verbose);
            let res = match opt.cmd {
                Command::Batch(cfg) => batch::cmd(&cfg),
                Command::Get(cfg) => get::cmd(&cfg),
                Command::Set(cfg) => set::cmd(&cfg),
            };
            return match res {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", common::format_error(opt.verbose, &e));
                    ExitCode::FAILURE
                }
            };
        }
        Err(e) => eprintln!("{e}"),
    }
    ExitCode::FAILURE
}

#[derive(Parser)]
#[command(
    name = "gpioseq",
    about = "A utility to toggle GPIO lines on Linux, restoring them on interrupt.",
    version,
    propagate_version = true
)]
struct Opts {
    /// Provide more detailed error messages and log each write.
    #[arg(short = 'v', long, global = true, display_order = 800)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
enum Command {
    /// Toggle several sets of lines concurrently.
    Batch(batch::Opts),

    /// Read the levels of GPIO lines.
    Get(get::Opts),

    /// Set, or toggle, the levels of GPIO lines on one chip.
    Set(set::Opts),
}
