// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::pin::{PinMap, PinWriter};
use crate::registry::format_pins;
use crate::{
    CancelSummary, CancellationHandle, ChipsetId, Error, Executor, Level, PinId, Registry,
    Result, SetRequest,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// The entry point for reading and setting pins.
///
/// Requests are validated against the [`PinMap`] before any write is performed,
/// and every sequence is tracked by the [`Registry`] while it runs.
pub struct StateCoordinator {
    executor: Executor,
    registry: Arc<Registry>,
    pin_map: Arc<dyn PinMap>,
}

impl StateCoordinator {
    /// Create a coordinator, along with its executor and registry, for the writer.
    pub fn new(writer: Arc<dyn PinWriter>, pin_map: Arc<dyn PinMap>) -> StateCoordinator {
        let executor = Executor::new(writer);
        let registry = Arc::new(Registry::new(executor.clone()));
        StateCoordinator::from_parts(executor, registry, pin_map)
    }

    /// Create a coordinator from explicitly constructed parts.
    ///
    /// The registry may be shared with other components, such as a signal handler
    /// that calls [`Registry::cancel_all`] on termination.
    pub fn from_parts(
        executor: Executor,
        registry: Arc<Registry>,
        pin_map: Arc<dyn PinMap>,
    ) -> StateCoordinator {
        StateCoordinator {
            executor,
            registry,
            pin_map,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Read the level of a single pin.
    pub fn read_pin(&self, chipset: ChipsetId, pin: PinId) -> Result<Level> {
        self.validate_pin(chipset, pin)?;
        self.executor.writer().read(chipset, pin)
    }

    /// Perform a request on the calling thread, blocking until it completes
    /// or is cancelled.
    pub fn set_single(&self, req: &SetRequest) -> Result<()> {
        self.validate(req)?;
        let handle = self.registry.create_handle(req);
        let res = self.executor.execute(req, &handle);
        self.registry.remove_completed(&handle);
        res
    }

    /// Perform a batch of requests concurrently, each on its own thread.
    ///
    /// All requests are validated before any is started, so an invalid request
    /// prevents the whole batch.
    /// Returns once the requests are dispatched.  Failures in individual
    /// sequences are logged and do not affect the others.
    pub fn set_multiple(&self, reqs: Vec<SetRequest>) -> Result<Batch> {
        for req in &reqs {
            self.validate(req)?;
        }
        let mut batch = Batch::default();
        for req in reqs {
            let handle = self.registry.create_handle(&req);
            let executor = self.executor.clone();
            let registry = self.registry.clone();
            let worker_handle = handle.clone();
            let spawned = thread::Builder::new()
                .name(format!("gpioseq-{}", handle.id()))
                .spawn(move || {
                    let res = executor.execute(&req, &worker_handle);
                    registry.remove_completed(&worker_handle);
                    if let Err(e) = &res {
                        log::error!(
                            "sequence on chipset {} - pins {} failed: {}",
                            req.chipset(),
                            format_pins(req.pins()),
                            e
                        );
                    }
                    res
                });
            match spawned {
                Ok(worker) => {
                    batch.workers.push(worker);
                    batch.handles.push(handle);
                }
                Err(e) => {
                    log::error!("unable to start sequence {}: {}", handle.id(), e);
                    self.registry.remove_completed(&handle);
                    batch.unstarted += 1;
                }
            }
        }
        Ok(batch)
    }

    /// Cancel every running sequence and return its pins to rest.
    pub fn cancel_all(&self) -> CancelSummary {
        self.registry.cancel_all()
    }

    fn validate(&self, req: &SetRequest) -> Result<()> {
        for &pin in req.pins() {
            self.validate_pin(req.chipset(), pin)?;
        }
        Ok(())
    }

    fn validate_pin(&self, chipset: ChipsetId, pin: PinId) -> Result<()> {
        if !self.pin_map.has_pin(chipset, pin) {
            return Err(Error::PinNotFound { chipset, pin });
        }
        Ok(())
    }
}

/// The sequences dispatched by [`StateCoordinator::set_multiple`].
///
/// Dropping the batch leaves the sequences running in the background.
#[derive(Debug, Default)]
pub struct Batch {
    workers: Vec<JoinHandle<Result<()>>>,
    handles: Vec<CancellationHandle>,
    unstarted: usize,
}

impl Batch {
    /// The number of sequences running or finished.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// The cancellation handles of the started sequences, in request order.
    ///
    /// Cancelling a handle stops that sequence without restoring its pins.
    pub fn handles(&self) -> &[CancellationHandle] {
        &self.handles
    }

    /// Returns true once every sequence in the batch has finished.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|w| w.is_finished())
    }

    /// Block until every sequence in the batch has finished.
    ///
    /// Returns the number of sequences that failed, or could not be started.
    pub fn wait(self) -> usize {
        self.workers
            .into_iter()
            .map(|w| w.join())
            .filter(|res| !matches!(res, Ok(Ok(()))))
            .count()
            + self.unstarted
    }
}
