// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::pin::{PinWriter, Sleep, ThreadSleep};
use crate::{CancellationHandle, Level, Result, SetRequest};
use std::sync::Arc;
use std::time::Duration;

/// The half of a toggle cycle being driven.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The pins are driven to the opposite of the requested state.
    Opposite,
    /// The pins are driven to the requested state.
    Target,
}

impl Phase {
    /// The level driven during the phase.
    pub fn level(&self, target: Level) -> Level {
        match self {
            Phase::Opposite => target.not(),
            Phase::Target => target,
        }
    }
}

/// A single step in a sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// Write every pin in the request to the level, in request order.
    Write(Level),
    /// Hold the pins at their current level for the period.
    Wait(Duration),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Write(Phase),
    Wait(Phase),
    Done,
}

/// The steps required to perform a request, in order.
///
/// A request without options is a single write of the target level.
/// A request with options cycles through the opposite and target phases,
/// each followed by a wait, `repeat` times.
#[derive(Clone, Debug)]
pub struct Steps {
    target: Level,
    delay: Duration,
    // cycles remaining, including the current one
    cycles: u32,
    state: State,
}

impl Steps {
    pub fn new(req: &SetRequest) -> Steps {
        match req.options() {
            None => Steps {
                target: req.state(),
                delay: Duration::ZERO,
                cycles: 0,
                state: State::Write(Phase::Target),
            },
            Some(opts) => Steps {
                target: req.state(),
                delay: opts.delay(),
                cycles: opts.repeat(),
                state: if opts.repeat() == 0 {
                    State::Done
                } else {
                    State::Write(Phase::Opposite)
                },
            },
        }
    }
}

impl Iterator for Steps {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        match self.state {
            State::Done => None,
            State::Write(phase) => {
                // single shot requests have no cycles and no waits
                self.state = if self.cycles == 0 {
                    State::Done
                } else {
                    State::Wait(phase)
                };
                Some(Step::Write(phase.level(self.target)))
            }
            State::Wait(phase) => {
                self.state = match phase {
                    Phase::Opposite => State::Write(Phase::Target),
                    Phase::Target => {
                        self.cycles -= 1;
                        if self.cycles == 0 {
                            State::Done
                        } else {
                            State::Write(Phase::Opposite)
                        }
                    }
                };
                Some(Step::Wait(self.delay))
            }
        }
    }
}

/// Performs requests as sequences of pin writes.
///
/// Cancellation is checked before every step.  A cancelled sequence stops
/// where it is and reports success, leaving the pins as they were.
#[derive(Clone)]
pub struct Executor {
    writer: Arc<dyn PinWriter>,
    sleep: Arc<dyn Sleep>,
}

impl Executor {
    /// Create an executor that waits by sleeping the calling thread.
    pub fn new(writer: Arc<dyn PinWriter>) -> Executor {
        Executor {
            writer,
            sleep: Arc::new(ThreadSleep),
        }
    }

    /// Replace the delay primitive.
    pub fn with_sleep(mut self, sleep: Arc<dyn Sleep>) -> Executor {
        self.sleep = sleep;
        self
    }

    pub fn writer(&self) -> &Arc<dyn PinWriter> {
        &self.writer
    }

    pub fn sleep(&self) -> &Arc<dyn Sleep> {
        &self.sleep
    }

    /// Perform the request, stopping early if the handle is cancelled.
    ///
    /// A write failure aborts the remainder of the sequence.
    pub fn execute(&self, req: &SetRequest, handle: &CancellationHandle) -> Result<()> {
        for step in Steps::new(req) {
            match step {
                Step::Write(level) => {
                    let Some(_step) = handle.begin_step() else {
                        return Ok(());
                    };
                    self.write_all(req, level)?;
                }
                Step::Wait(period) => {
                    if handle.is_cancelled() {
                        return Ok(());
                    }
                    self.sleep.sleep(period);
                }
            }
        }
        Ok(())
    }

    fn write_all(&self, req: &SetRequest, level: Level) -> Result<()> {
        for &pin in req.pins() {
            log::debug!("chipset {} pin {}={}", req.chipset(), pin, level);
            self.writer.write(req.chipset(), pin, level)?;
        }
        Ok(())
    }
}
