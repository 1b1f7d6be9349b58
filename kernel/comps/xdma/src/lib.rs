// SPDX-License-Identifier: MPL-2.0

//! The character device front end of Xilinx XDMA scatter-gather engines.
//!
//! Each SG-DMA engine (one channel in one direction) is exposed as a device
//! file. This crate is the admission layer sitting on top of the transfer
//! machinery: it arbitrates exclusive access to an [`Engine`], validates the
//! transfer requests issued through `read`, `write` and `ioctl`, and hands
//! them to a [`TransferSubmitter`] that owns descriptor building, page
//! pinning and completion waiting.
//!
//! Two single-bit flags guard every engine:
//!
//! * `OPEN` admits at most one opener at a time;
//! * `BUSY` admits at most one transfer at a time.
//!
//! Both flags are taken with an atomic test-and-set. A caller that loses the
//! race is turned away with `EBUSY` immediately; nothing ever waits in a queue.
//!
//! [`Engine`]: engine::Engine
//! [`TransferSubmitter`]: submit::TransferSubmitter

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod cdev;
pub mod config;
pub mod engine;
pub mod error;
mod prelude;
pub mod submit;
pub mod user;

pub use cdev::{
    SgdmaCdev, SgdmaFile,
    file::{SeekFrom, read_write},
    ioctl::{PerformanceIoctl, TransferMode, TransferRequest, XdmaIoctl},
    open_flags::{AccessMode, CreationFlags, OpenFlags},
};
pub use config::{EngineConfig, XdmaConfig};
pub use engine::{BusyGuard, DmaDirection, Engine, EngineFlags, TransferParams};
pub use error::{Errno, Error};
pub use submit::TransferSubmitter;
pub use user::{Pod, UserSpace, Vaddr};
