// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A library for driving timed, cancellable toggle sequences on GPIO pins.
//!
//! A [`SetRequest`] describes the pins to drive, the level they should end up at,
//! and optionally how many times to toggle them and how long to hold each level.
//!
//! Requests are normally dispatched through a [`StateCoordinator`], which validates
//! them against a [`PinMap`], registers each running sequence with the [`Registry`],
//! and runs them via an [`Executor`] on top of a [`PinWriter`].
//!
//! The [`Registry`] tracks every sequence in flight and can stop them all with
//! [`Registry::cancel_all`], driving the affected pins back to rest.
//!
//! To blink two pins three times, blocking until done:
//! ```no_run
//! # use gpioseq::Result;
//! use gpioseq::chardev::{ChardevPinMap, ChardevWriter};
//! use gpioseq::{Level, Options, SetRequest, StateCoordinator};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let coord = StateCoordinator::new(
//!     Arc::new(ChardevWriter::default()),
//!     Arc::new(ChardevPinMap::default()),
//! );
//! let req = SetRequest::new(0, vec![17, 22], Level::On)?
//!     .with_options(Options::new(Duration::from_millis(50), 3)?);
//! coord.set_single(&req)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`PinMap`]: pin::PinMap
//! [`PinWriter`]: pin::PinWriter

/// Cooperative cancellation signals shared between sequences and the registry.
pub mod cancel;

/// PinWriter and PinMap implementations on Linux GPIO character devices.
#[cfg(feature = "chardev")]
pub mod chardev;

/// Request validation and dispatch.
pub mod coordinator;

/// Logical pin levels.
pub mod level;

/// The collaborator traits the core drives: pin writes, pin maps and sleeps.
pub mod pin;

/// Tracking of in-flight sequences and the safe-shutdown sweep.
pub mod registry;

/// The requests describing what to drive.
pub mod request;

/// Execution of a single request as a sequence of timed writes.
pub mod sequence;

pub use cancel::CancellationHandle;
pub use coordinator::{Batch, StateCoordinator};
pub use level::Level;
pub use registry::{CancelSummary, Registry};
pub use request::{Options, SetRequest};
pub use sequence::Executor;

use std::sync::Arc;

/// The identifier of a GPIO chipset.
pub type ChipsetId = u32;

/// The identifier of a pin within a chipset.
pub type PinId = u32;

/// Errors returned by [`gpioseq`] functions.
///
/// [`gpioseq`]: crate
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The pin does not exist on the chipset.
    #[error("pin {pin} not found on chipset {chipset}")]
    PinNotFound { chipset: ChipsetId, pin: PinId },

    /// The state token does not name a level.
    #[error("invalid state: '{0}'")]
    InvalidState(String),

    /// A request must contain at least one pin.
    #[error("request for chipset {0} contains no pins")]
    NoPins(ChipsetId),

    /// A repeated request must repeat at least once.
    #[error("repeat count must be at least 1")]
    InvalidRepeat,

    /// The underlying pin write or read failed.
    #[error("access to pin {pin} on chipset {chipset} failed: {source}")]
    Io {
        chipset: ChipsetId,
        pin: PinId,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wrap a backend failure accessing a pin.
    pub fn io<E>(chipset: ChipsetId, pin: PinId, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Io {
            chipset,
            pin,
            source: Arc::new(source),
        }
    }

    /// Returns true for errors raised while validating a request, before any write.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Error::Io { .. })
    }
}

/// The result for [`gpioseq`] functions.
///
/// [`gpioseq`]: crate
pub type Result<T> = std::result::Result<T, Error>;
