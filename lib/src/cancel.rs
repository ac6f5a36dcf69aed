// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// Ids start at 1 so 0 can never match a registry entry.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A cooperative stop signal for a running sequence.
///
/// Clones share the same signal, so the executor and the [`Registry`] each hold one.
/// Once cancelled a handle stays cancelled.
///
/// Writes are performed under the handle's step lock, so once [`quiesce`]
/// returns no further write by the sequence can occur.
///
/// [`Registry`]: crate::Registry
/// [`quiesce`]: CancellationHandle::quiesce
#[derive(Clone, Debug)]
pub struct CancellationHandle {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: u64,
    cancelled: AtomicBool,
    step: Mutex<()>,
}

impl CancellationHandle {
    /// Create a handle that is not tracked by any registry.
    pub fn new() -> CancellationHandle {
        CancellationHandle {
            inner: Arc::new(Inner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                cancelled: AtomicBool::new(false),
                step: Mutex::new(()),
            }),
        }
    }

    /// The identifier of the sequence the handle was issued for.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Signal the sequence to stop.
    ///
    /// Subsequent calls have no effect.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the sequence and wait for any write step in progress to finish.
    pub fn quiesce(&self) {
        self.cancel();
        drop(self.lock_step());
    }

    /// Begin a write step, unless the handle has been cancelled.
    ///
    /// The step continues until the returned guard is dropped.
    pub(crate) fn begin_step(&self) -> Option<MutexGuard<'_, ()>> {
        let guard = self.lock_step();
        if self.is_cancelled() {
            return None;
        }
        Some(guard)
    }

    fn lock_step(&self) -> MutexGuard<'_, ()> {
        // the lock guards no data, so a poisoned lock is still usable
        self.inner
            .step
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        CancellationHandle::new()
    }
}
