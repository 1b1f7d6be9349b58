// SPDX-License-Identifier: MPL-2.0

//! The contract with the transfer machinery.
//!
//! Everything below this layer (descriptor tables, page pinning, DMA
//! mapping, interrupts and completion waiting) sits behind
//! [`TransferSubmitter`].

use crate::{
    cdev::ioctl::PerformanceIoctl,
    engine::{Engine, TransferParams},
    prelude::*,
};

/// Performs transfers on behalf of the device files.
///
/// The methods that move data are only ever called while the engine's `BUSY`
/// flag is held, so at most one of them runs per engine at any instant.
/// They may block until the hardware completes; this layer imposes no
/// timeout of its own.
pub trait TransferSubmitter: Send + Sync + Debug {
    /// Moves data as described by `params`.
    ///
    /// Returns the number of bytes transferred, which may be less than
    /// `params.length`. All checks on the buffer, length and address are
    /// the submitter's responsibility.
    fn submit(&self, engine: &Engine, params: &TransferParams) -> Result<usize>;

    /// Runs a benchmark of `perf.transfer_size` bytes and fills in the result
    /// fields of `perf`.
    fn submit_performance(&self, engine: &Engine, perf: &mut PerformanceIoctl) -> Result<()>;

    /// Programs the hardware addressing mode of the engine.
    ///
    /// `fixed` disables the increment of the AXI address.
    fn set_address_mode(&self, engine: &Engine, fixed: bool);
}
