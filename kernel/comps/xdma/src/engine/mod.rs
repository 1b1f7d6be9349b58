// SPDX-License-Identifier: MPL-2.0

//! SG-DMA engines.
//!
//! An [`Engine`] is one DMA channel in one direction. It is created when the
//! device is enumerated and outlives every file opened on it. Its
//! configuration (direction, streaming, alignment) never changes afterwards;
//! what cycles per open and per transfer is the pair of admission flags
//! ([`EngineFlags`]) and the addressing mode.

mod flags;

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub use flags::{BusyGuard, EngineFlags};

use crate::{config::EngineConfig, prelude::*, user::Vaddr};

/// The direction of the data flow of a DMA engine.
///
/// The variants follow Linux's `enum dma_data_direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaDirection {
    /// From host memory to the card (H2C).
    ToDevice,
    /// From the card to host memory (C2H).
    FromDevice,
    /// Both ways.
    ///
    /// An SG-DMA engine moves data in exactly one direction, so an engine
    /// carrying this value is misconfigured and cannot be opened.
    Bidirectional,
}

impl DmaDirection {
    /// Returns whether an SG-DMA engine may run in this direction.
    pub fn is_engine_direction(&self) -> bool {
        matches!(self, Self::ToDevice | Self::FromDevice)
    }

    /// Returns the short name used in device file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::ToDevice => "h2c",
            Self::FromDevice => "c2h",
            Self::Bidirectional => "bidi",
        }
    }
}

/// The parameters of a single transfer.
///
/// They are filled in right before a submission, while the `BUSY` flag is
/// held, and are meaningless once the submission returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    /// The user buffer.
    pub buf: Vaddr,
    /// The number of bytes requested.
    pub length: usize,
    /// The card-side (AXI) address. Zero and ignored for streaming engines.
    pub ep_addr: u64,
    /// The direction of the transfer; always the engine's direction.
    pub dir: DmaDirection,
}

impl TransferParams {
    /// Creates empty parameters for an engine running in `dir`.
    pub const fn empty(dir: DmaDirection) -> Self {
        Self {
            buf: 0,
            length: 0,
            ep_addr: 0,
            dir,
        }
    }
}

/// An SG-DMA engine.
#[derive(Debug)]
pub struct Engine {
    direction: DmaDirection,
    streaming: bool,
    channel: u32,
    addr_align: u32,
    timeout_ms: u32,
    /// Bits of [`EngineFlags`].
    flags: AtomicU32,
    /// Fixed-address mode: the AXI address does not advance between transfers.
    non_incr_addr: AtomicBool,
    /// Whether a streaming C2H transfer completes at the end of a packet.
    eop_flush: AtomicBool,
}

impl Engine {
    /// Creates an engine that is neither open nor busy.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let EngineConfig {
            direction,
            streaming,
            channel,
            addr_align,
            timeout_ms,
        } = config;

        if addr_align == 0 || !addr_align.is_power_of_two() {
            return_errno_with_message!(
                Errno::EINVAL,
                "the address alignment must be a power of two"
            );
        }

        Ok(Self {
            direction,
            streaming,
            channel,
            addr_align,
            timeout_ms,
            flags: AtomicU32::new(0),
            non_incr_addr: AtomicBool::new(false),
            eop_flush: AtomicBool::new(false),
        })
    }

    pub fn direction(&self) -> DmaDirection {
        self.direction
    }

    /// Returns whether the engine is an AXI-Stream engine.
    ///
    /// Streaming engines have no addressable target, so file offsets are
    /// meaningless for them.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Returns the required alignment, in bytes, of transfer target addresses.
    pub fn addr_align(&self) -> u32 {
        self.addr_align
    }

    /// Returns the completion timeout the submitter should apply, in milliseconds.
    ///
    /// This layer never waits on it.
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Returns whether the engine is in fixed-address mode.
    pub fn is_non_incr_addr(&self) -> bool {
        self.non_incr_addr.load(Ordering::Relaxed)
    }

    /// Sets the addressing mode.
    ///
    /// Callers hold either the `BUSY` flag or a fresh `OPEN` flag, so no
    /// transfer can observe the change halfway.
    pub(crate) fn set_non_incr_addr(&self, fixed: bool) {
        self.non_incr_addr.store(fixed, Ordering::Relaxed);
    }

    /// Returns whether streaming transfers complete at the end of a packet.
    pub fn is_eop_flush(&self) -> bool {
        self.eop_flush.load(Ordering::Relaxed)
    }

    pub(crate) fn set_eop_flush(&self, eop_flush: bool) {
        self.eop_flush.store(eop_flush, Ordering::Relaxed);
    }
}
