// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{CancellationHandle, Executor, SetRequest};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
struct ActiveSequence {
    handle: CancellationHandle,
    request: SetRequest,
}

/// The outcome of a [`Registry::cancel_all`] sweep.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CancelSummary {
    /// The number of sequences stopped and restored.
    pub stopped: usize,
    /// The number of sequences stopped but whose pins could not be restored.
    pub failed: usize,
}

/// Tracks the sequences in flight.
///
/// Every sequence is issued a [`CancellationHandle`] by the registry before it starts,
/// and is removed once it completes.
/// [`cancel_all`] stops every tracked sequence and drives its pins back to rest.
///
/// All changes to the set of tracked sequences are serialised by a single lock.
///
/// [`cancel_all`]: Registry::cancel_all
pub struct Registry {
    executor: Executor,
    active: Mutex<Vec<ActiveSequence>>,
    settle_period: Duration,
}

impl Registry {
    /// The default pause after each reversal, allowing the write to settle.
    pub const DEFAULT_SETTLE_PERIOD: Duration = Duration::from_millis(50);

    /// Create a registry that restores pins using the executor.
    pub fn new(executor: Executor) -> Registry {
        Registry {
            executor,
            active: Mutex::default(),
            settle_period: Self::DEFAULT_SETTLE_PERIOD,
        }
    }

    /// Set the pause following each reversal in [`cancel_all`].
    ///
    /// [`cancel_all`]: Registry::cancel_all
    pub fn with_settle_period(mut self, period: Duration) -> Registry {
        self.settle_period = period;
        self
    }

    /// Issue a handle for the request and start tracking it.
    ///
    /// Entries that have already been cancelled are pruned.
    pub fn create_handle(&self, req: &SetRequest) -> CancellationHandle {
        let handle = CancellationHandle::new();
        let mut active = self.lock();
        active.push(ActiveSequence {
            handle: handle.clone(),
            request: req.clone(),
        });
        active.retain(|seq| !seq.handle.is_cancelled());
        handle
    }

    /// Stop tracking a sequence that has finished.
    ///
    /// Has no effect if the entry is no longer tracked.
    pub fn remove_completed(&self, handle: &CancellationHandle) {
        self.lock().retain(|seq| seq.handle.id() != handle.id());
    }

    /// The number of sequences currently tracked.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Cancel every tracked sequence and return its pins to rest.
    ///
    /// Each sequence is stopped, then its pins are driven once to the opposite
    /// of its requested state.
    /// A failure to restore one sequence does not prevent restoring the others.
    ///
    /// The registry lock is held throughout, so sequences starting or finishing
    /// concurrently block until the sweep is complete.
    pub fn cancel_all(&self) -> CancelSummary {
        let mut active = self.lock();
        let mut summary = CancelSummary::default();
        for seq in active.iter().filter(|seq| !seq.handle.is_cancelled()) {
            // no write from the sequence can follow the reversal
            seq.handle.quiesce();
            let req = &seq.request;
            log::warn!(
                "cancelling actions for chipset {} - pins {}",
                req.chipset(),
                format_pins(req.pins())
            );
            match self
                .executor
                .execute(&req.reversed(), &CancellationHandle::new())
            {
                Ok(()) => summary.stopped += 1,
                Err(e) => {
                    log::error!(
                        "unable to restore chipset {} - pins {}: {}",
                        req.chipset(),
                        format_pins(req.pins()),
                        e
                    );
                    summary.failed += 1;
                }
            }
            self.executor.sleep().sleep(self.settle_period);
        }
        active.clear();
        if summary.stopped + summary.failed > 0 {
            log::warn!(
                "cancelled {} sequences, {} could not be restored",
                summary.stopped + summary.failed,
                summary.failed
            );
        }
        summary
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActiveSequence>> {
        // entries remain consistent even if a holder panicked
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn format_pins(pins: &[crate::PinId]) -> String {
    pins.iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{PinWriter, Sleep};
    use crate::{ChipsetId, Error, Level, Options, PinId, Result};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<(ChipsetId, PinId, Level)>>,
        broken_chipset: Option<ChipsetId>,
    }

    impl PinWriter for Recorder {
        fn write(&self, chipset: ChipsetId, pin: PinId, level: Level) -> Result<()> {
            if self.broken_chipset == Some(chipset) {
                return Err(Error::io(
                    chipset,
                    pin,
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ));
            }
            self.writes.lock().unwrap().push((chipset, pin, level));
            Ok(())
        }

        fn read(&self, _chipset: ChipsetId, _pin: PinId) -> Result<Level> {
            Ok(Level::Off)
        }
    }

    struct NoSleep;

    impl Sleep for NoSleep {
        fn sleep(&self, _period: Duration) {}
    }

    fn registry(rec: &Arc<Recorder>) -> Registry {
        Registry::new(Executor::new(rec.clone()).with_sleep(Arc::new(NoSleep)))
    }

    fn request(chipset: ChipsetId, pin: PinId) -> SetRequest {
        SetRequest::new(chipset, vec![pin], Level::On)
            .unwrap()
            .with_options(Options::new(Duration::from_millis(500), 3).unwrap())
    }

    #[test]
    fn create_handle() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        let h1 = r.create_handle(&request(1, 81));
        let h2 = r.create_handle(&request(1, 93));
        assert_ne!(h1.id(), h2.id());
        assert!(!h1.is_cancelled());
        assert_eq!(r.active_count(), 2);
    }

    #[test]
    fn create_handle_prunes_cancelled() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        let h1 = r.create_handle(&request(1, 81));
        r.create_handle(&request(1, 82));
        h1.cancel();
        assert_eq!(r.active_count(), 2);
        r.create_handle(&request(1, 83));
        assert_eq!(r.active_count(), 2);
    }

    #[test]
    fn create_handle_concurrently() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        std::thread::scope(|s| {
            for t in 0..8 {
                let r = &r;
                s.spawn(move || {
                    for i in 0..200 {
                        r.create_handle(&request(1, t * 200 + i));
                    }
                });
            }
        });
        assert_eq!(r.active_count(), 1600);
    }

    #[test]
    fn remove_completed() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        let h1 = r.create_handle(&request(1, 81));
        let h2 = r.create_handle(&request(1, 93));
        r.remove_completed(&h1);
        assert_eq!(r.active_count(), 1);
        // already removed
        r.remove_completed(&h1);
        assert_eq!(r.active_count(), 1);
        // never registered
        r.remove_completed(&CancellationHandle::new());
        assert_eq!(r.active_count(), 1);
        r.remove_completed(&h2);
        assert_eq!(r.active_count(), 0);
    }

    #[test]
    fn cancel_all() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        let handles: Vec<CancellationHandle> = (0..3)
            .map(|pin| r.create_handle(&request(1, pin)))
            .collect();
        let summary = r.cancel_all();
        assert_eq!(
            summary,
            CancelSummary {
                stopped: 3,
                failed: 0
            }
        );
        assert!(handles.iter().all(|h| h.is_cancelled()));
        assert_eq!(r.active_count(), 0);
        assert_eq!(
            *rec.writes.lock().unwrap(),
            vec![(1, 0, Level::Off), (1, 1, Level::Off), (1, 2, Level::Off)]
        );
    }

    #[test]
    fn cancel_all_skips_cancelled() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        r.create_handle(&request(1, 81));
        let h = r.create_handle(&request(1, 93));
        h.cancel();
        let summary = r.cancel_all();
        assert_eq!(summary.stopped, 1);
        assert_eq!(*rec.writes.lock().unwrap(), vec![(1, 81, Level::Off)]);
        assert_eq!(r.active_count(), 0);
    }

    #[test]
    fn cancel_all_continues_after_failure() {
        let rec = Arc::new(Recorder {
            broken_chipset: Some(2),
            ..Default::default()
        });
        let r = registry(&rec);
        r.create_handle(&request(2, 5));
        r.create_handle(&request(1, 81));
        let summary = r.cancel_all();
        assert_eq!(
            summary,
            CancelSummary {
                stopped: 1,
                failed: 1
            }
        );
        assert_eq!(*rec.writes.lock().unwrap(), vec![(1, 81, Level::Off)]);
        assert_eq!(r.active_count(), 0);
    }

    #[test]
    fn cancel_all_empty() {
        let rec = Arc::new(Recorder::default());
        let r = registry(&rec);
        assert_eq!(r.cancel_all(), CancelSummary::default());
        assert!(rec.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn format_pins() {
        assert_eq!(super::format_pins(&[81]), "81");
        assert_eq!(super::format_pins(&[81, 93]), "81,93");
    }
}
