// SPDX-License-Identifier: MPL-2.0

//! SG-DMA character devices.
//!
//! Every engine is exposed as one device file, named after the driver
//! instance, the direction and the channel, e.g. `xdma0_h2c_0`. An H2C file
//! can only be opened write-only and a C2H file read-only, and only one file
//! can be open on an engine at a time.

pub mod file;
pub mod ioctl;
pub mod open_flags;

use alloc::format;

pub use file::SgdmaFile;
use open_flags::{AccessMode, OpenFlags};

use crate::{
    engine::{DmaDirection, Engine, EngineFlags},
    error::ALREADY_OPEN,
    prelude::*,
    submit::TransferSubmitter,
};

/// The character device of one SG-DMA engine.
#[derive(Debug)]
pub struct SgdmaCdev {
    instance: u32,
    engine: Arc<Engine>,
    submitter: Arc<dyn TransferSubmitter>,
}

impl SgdmaCdev {
    pub fn new(instance: u32, engine: Arc<Engine>, submitter: Arc<dyn TransferSubmitter>) -> Self {
        Self {
            instance,
            engine,
            submitter,
        }
    }

    /// Returns the name of the device file, e.g. `xdma0_c2h_1`.
    pub fn devtmpfs_name(&self) -> String {
        format!(
            "xdma{}_{}_{}",
            self.instance,
            self.engine.direction().short_name(),
            self.engine.channel()
        )
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Opens the device file.
    ///
    /// Fails with `EBUSY` if a file is already open on the engine, and with
    /// `EACCES` if the access mode does not match the direction of the
    /// engine. `O_TRUNC` selects end-of-packet flushing on streaming engines
    /// and fixed-address mode on memory-mapped ones.
    pub fn open(&self, flags: OpenFlags) -> Result<Arc<SgdmaFile>> {
        if self.engine.test_and_set(EngineFlags::OPEN) {
            return Err(ALREADY_OPEN);
        }

        match self.init_open(flags) {
            Ok(seekable) => Ok(Arc::new(SgdmaFile::new(
                self.engine.clone(),
                self.submitter.clone(),
                flags.access_mode(),
                seekable,
            ))),
            Err(err) => {
                self.engine.clear(EngineFlags::OPEN);
                Err(err)
            }
        }
    }

    /// Checks the open request and sets up the per-open behavior of the
    /// engine. Returns whether the file is seekable.
    fn init_open(&self, flags: OpenFlags) -> Result<bool> {
        let engine = &self.engine;

        let required_mode = match engine.direction() {
            DmaDirection::ToDevice => AccessMode::O_WRONLY,
            DmaDirection::FromDevice => AccessMode::O_RDONLY,
            DmaDirection::Bidirectional => {
                log::error!(
                    "[xdma] {}: unexpected direction of XDMA engine",
                    self.devtmpfs_name()
                );
                return_errno_with_message!(Errno::ENODEV, "the engine has no valid direction");
            }
        };
        if flags.access_mode() != required_mode {
            log::warn!(
                "[xdma] {}: denied {:?}, the engine requires {:?}",
                self.devtmpfs_name(),
                flags.access_mode(),
                required_mode
            );
            return_errno_with_message!(
                Errno::EACCES,
                "the access mode does not match the engine direction"
            );
        }

        if engine.is_streaming() {
            engine.set_eop_flush(flags.is_trunc());
        } else {
            set_addr_mode(engine, self.submitter.as_ref(), flags.is_trunc());
        }

        log::debug!(
            "[xdma] {} opened {:?}, eop_flush = {}, non_incr_addr = {}",
            self.devtmpfs_name(),
            flags.access_mode(),
            engine.is_eop_flush(),
            engine.is_non_incr_addr()
        );
        Ok(!engine.is_streaming())
    }
}

/// Switches the engine between incrementing and fixed-address mode.
///
/// The caller must hold the `BUSY` flag, or the `OPEN` flag of a file that
/// is still being opened.
fn set_addr_mode(engine: &Engine, submitter: &dyn TransferSubmitter, fixed: bool) {
    engine.set_non_incr_addr(fixed);
    submitter.set_address_mode(engine, fixed);
}
