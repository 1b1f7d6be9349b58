// SPDX-License-Identifier: MPL-2.0

//! The admission flags of an engine.
//!
//! The flags are test-and-set bits, in the manner of Linux's
//! `test_and_set_bit`. Losing the race means being rejected on the spot; no
//! caller ever sleeps on a flag.

use core::sync::atomic::Ordering;

use bitflags::bitflags;

use super::Engine;
use crate::{error::ENGINE_BUSY, prelude::*};

bitflags! {
    pub struct EngineFlags: u32 {
        /// The engine is bound to an open file.
        const OPEN = 1 << 0;
        /// A transfer or an addressing-mode change is in progress.
        const BUSY = 1 << 1;
    }
}

impl Engine {
    /// Atomically sets `flag` and returns whether it was already set.
    ///
    /// `flag` must be a single flag.
    pub fn test_and_set(&self, flag: EngineFlags) -> bool {
        debug_assert_eq!(flag.bits().count_ones(), 1);

        let old = self.flags.fetch_or(flag.bits(), Ordering::AcqRel);
        old & flag.bits() != 0
    }

    /// Atomically clears `flag`.
    pub fn clear(&self, flag: EngineFlags) {
        self.flags.fetch_and(!flag.bits(), Ordering::Release);
    }

    /// Returns a snapshot of the flags.
    pub fn flags(&self) -> EngineFlags {
        EngineFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Returns whether a file is open on the engine.
    pub fn is_open(&self) -> bool {
        self.flags().contains(EngineFlags::OPEN)
    }

    /// Returns whether a transfer is in progress.
    pub fn is_busy(&self) -> bool {
        self.flags().contains(EngineFlags::BUSY)
    }

    /// Takes the `BUSY` flag, failing with `EBUSY` if someone else holds it.
    ///
    /// The flag is released when the returned guard is dropped.
    pub fn try_lock_busy(&self) -> Result<BusyGuard<'_>> {
        if self.test_and_set(EngineFlags::BUSY) {
            log::debug!(
                "[xdma] {} engine {} rejected a request: busy",
                self.direction.short_name(),
                self.channel
            );
            return Err(ENGINE_BUSY);
        }

        Ok(BusyGuard { engine: self })
    }
}

/// A held `BUSY` flag of an [`Engine`].
///
/// Every arbitrated operation runs under one of these, which makes the flag
/// released on each of its exit paths, errors included.
#[must_use]
#[derive(Debug)]
pub struct BusyGuard<'a> {
    engine: &'a Engine,
}

impl BusyGuard<'_> {
    pub fn engine(&self) -> &Engine {
        self.engine
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.engine.clear(EngineFlags::BUSY);
    }
}
