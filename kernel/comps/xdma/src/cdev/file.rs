// SPDX-License-Identifier: MPL-2.0

//! The data path and the open SG-DMA file.

use spin::Mutex;

use super::{ioctl, open_flags::AccessMode};
use crate::{
    engine::{Engine, EngineFlags, TransferParams},
    prelude::*,
    submit::TransferSubmitter,
    user::{UserSpace, Vaddr},
};

/// Moves `count` bytes between the user buffer at `buf` and the engine.
///
/// This is the common body of `read` and `write`; the direction is the
/// engine's. For memory-mapped engines `pos` is the AXI address of the
/// transfer, and it advances by the number of bytes transferred unless the
/// engine is in fixed-address mode. Streaming engines ignore `pos`.
///
/// A short transfer is a success. Fails with `EBUSY`, without waiting, if
/// another transfer is in flight on the engine.
///
/// Positions are file offsets and never exceed `isize::MAX`. On a
/// memory-mapped engine, a `pos` beyond that fails with `EINVAL` and a
/// transfer that could end beyond it fails with `EOVERFLOW`, both before
/// anything is submitted.
pub fn read_write(
    engine: &Engine,
    submitter: &dyn TransferSubmitter,
    buf: Vaddr,
    count: usize,
    pos: &mut usize,
) -> Result<usize> {
    if !engine.is_streaming() {
        check_pos_range(*pos, count)?;
    }

    let _busy = engine.try_lock_busy()?;

    // Only fill in the parameters; the submitter validates them.
    let mut params = TransferParams::empty(engine.direction());
    params.buf = buf;
    params.length = count;
    if !engine.is_streaming() {
        params.ep_addr = *pos as u64;
    }

    let transferred = submitter.submit(engine, &params)?;

    if !engine.is_streaming() && !engine.is_non_incr_addr() {
        *pos = pos
            .checked_add(transferred)
            .filter(|&end| end <= MAX_OFFSET)
            .ok_or_else(|| {
                log::warn!(
                    "[xdma] {} engine {} reported {} bytes for a {}-byte transfer",
                    engine.direction().short_name(),
                    engine.channel(),
                    transferred,
                    count
                );
                Error::with_message(Errno::EOVERFLOW, "file offset overflow")
            })?;
    }

    Ok(transferred)
}

/// The largest file offset, as for Linux's `loff_t`.
const MAX_OFFSET: usize = isize::MAX as usize;

fn check_pos_range(pos: usize, count: usize) -> Result<()> {
    if pos > MAX_OFFSET {
        return_errno_with_message!(Errno::EINVAL, "file offset is too large");
    }
    if count > MAX_OFFSET - pos {
        return_errno_with_message!(Errno::EOVERFLOW, "the transfer ends beyond the maximum offset");
    }
    Ok(())
}

/// The position argument of [`SgdmaFile::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(usize),
    End(isize),
    Current(isize),
}

/// An SG-DMA device file opened on an [`Engine`].
///
/// Dropping the last reference to the file closes it, which releases the
/// engine's `OPEN` flag. A transfer still in flight at that point keeps its
/// `BUSY` flag until it returns.
pub struct SgdmaFile {
    engine: Arc<Engine>,
    submitter: Arc<dyn TransferSubmitter>,
    access_mode: AccessMode,
    seekable: bool,
    offset: Mutex<usize>,
}

impl SgdmaFile {
    /// Wraps an engine whose `OPEN` flag the caller has just taken.
    pub(super) fn new(
        engine: Arc<Engine>,
        submitter: Arc<dyn TransferSubmitter>,
        access_mode: AccessMode,
        seekable: bool,
    ) -> Self {
        Self {
            engine,
            submitter,
            access_mode,
            seekable,
            offset: Mutex::new(0),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Returns whether the file has a position, i.e. the engine is memory-mapped.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    pub fn offset(&self) -> usize {
        *self.offset.lock()
    }

    /// Reads from a C2H engine into the user buffer at `buf`, at the file offset.
    pub fn read(&self, buf: Vaddr, count: usize) -> Result<usize> {
        if !self.access_mode.is_readable() {
            return_errno_with_message!(Errno::EBADF, "the file is not opened readable");
        }
        self.transfer_at_offset(buf, count)
    }

    /// Writes the user buffer at `buf` to an H2C engine, at the file offset.
    pub fn write(&self, buf: Vaddr, count: usize) -> Result<usize> {
        if !self.access_mode.is_writable() {
            return_errno_with_message!(Errno::EBADF, "the file is not opened writable");
        }
        self.transfer_at_offset(buf, count)
    }

    /// Reads at `offset` without moving the file offset, as `pread(2)` does.
    pub fn read_at(&self, offset: usize, buf: Vaddr, count: usize) -> Result<usize> {
        if !self.access_mode.is_readable() {
            return_errno_with_message!(Errno::EBADF, "the file is not opened readable");
        }
        self.transfer_at(offset, buf, count)
    }

    /// Writes at `offset` without moving the file offset, as `pwrite(2)` does.
    pub fn write_at(&self, offset: usize, buf: Vaddr, count: usize) -> Result<usize> {
        if !self.access_mode.is_writable() {
            return_errno_with_message!(Errno::EBADF, "the file is not opened writable");
        }
        self.transfer_at(offset, buf, count)
    }

    fn transfer_at_offset(&self, buf: Vaddr, count: usize) -> Result<usize> {
        // The offset lock must not be held across the submission: a second
        // caller has to hit the busy flag, not spin here.
        let start = self.offset();
        let mut pos = start;
        let transferred = read_write(&self.engine, self.submitter.as_ref(), buf, count, &mut pos)?;

        if pos != start {
            // A concurrent seek may have moved the offset meanwhile.
            let mut offset = self.offset.lock();
            *offset = offset.saturating_add(pos - start).min(MAX_OFFSET);
        }
        Ok(transferred)
    }

    fn transfer_at(&self, offset: usize, buf: Vaddr, count: usize) -> Result<usize> {
        if !self.seekable {
            return_errno_with_message!(Errno::ESPIPE, "the file is a stream");
        }
        let mut pos = offset;
        read_write(&self.engine, self.submitter.as_ref(), buf, count, &mut pos)
    }

    /// Repositions the file offset.
    ///
    /// The device has no size, so `SeekFrom::End` counts from zero.
    pub fn seek(&self, pos: SeekFrom) -> Result<usize> {
        if !self.seekable {
            return_errno_with_message!(Errno::ESPIPE, "the file is a stream");
        }

        let mut offset = self.offset.lock();
        let new_offset: isize = match pos {
            SeekFrom::Start(off) => isize::try_from(off)
                .map_err(|_| Error::with_message(Errno::EINVAL, "file offset is too large"))?,
            SeekFrom::End(off) => off,
            SeekFrom::Current(off) => isize::try_from(*offset)
                .ok()
                .and_then(|current| current.checked_add(off))
                .ok_or_else(|| Error::with_message(Errno::EOVERFLOW, "file offset overflow"))?,
        };
        if new_offset < 0 {
            return_errno_with_message!(Errno::EINVAL, "file offset must not be negative");
        }
        // Invariant: 0 <= new_offset <= isize::MAX
        let new_offset = new_offset as usize;
        *offset = new_offset;
        Ok(new_offset)
    }

    /// Handles an `ioctl` command; `arg` is an address in `user`.
    pub fn ioctl(&self, user: &dyn UserSpace, cmd: u32, arg: Vaddr) -> Result<i32> {
        ioctl::dispatch(&self.engine, self.submitter.as_ref(), user, cmd, arg)
    }
}

impl Debug for SgdmaFile {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("SgdmaFile")
            .field("engine", &self.engine)
            .field("access_mode", &self.access_mode)
            .field("seekable", &self.seekable)
            .finish_non_exhaustive()
    }
}

impl Drop for SgdmaFile {
    fn drop(&mut self) {
        self.engine.clear(EngineFlags::OPEN);
        log::debug!(
            "[xdma] {} engine {} closed",
            self.engine.direction().short_name(),
            self.engine.channel()
        );
    }
}
