// SPDX-License-Identifier: MPL-2.0

//! The control path: `ioctl` commands of SG-DMA files.

use core::mem::{offset_of, size_of};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::set_addr_mode;
use crate::{
    engine::{DmaDirection, Engine, TransferParams},
    prelude::*,
    submit::TransferSubmitter,
    user::{UserSpace, Vaddr},
};

const XDMA_IOC_MAGIC: u32 = b'q' as u32;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

/// Encodes an XDMA command number as Linux's `_IOC` does.
const fn xdma_ioc(dir: u32, nr: u32, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | (XDMA_IOC_MAGIC << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
}

/// The `ioctl` commands understood by SG-DMA files.
///
/// The commands taking a structure are declared with a pointer-sized
/// payload, as the userspace headers of the driver do.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdmaIoctl {
    /// Runs a performance benchmark, `_IOW('q', 1, struct xdma_performance_ioctl *)`.
    PerfTest = xdma_ioc(IOC_WRITE, 1, size_of::<usize>()),
    /// Sets the fixed-address mode, `_IOW('q', 4, int)`.
    AddrModeSet = xdma_ioc(IOC_WRITE, 4, size_of::<i32>()),
    /// Gets the fixed-address mode, `_IOR('q', 5, int)`.
    AddrModeGet = xdma_ioc(IOC_READ, 5, size_of::<i32>()),
    /// Gets the address alignment, `_IOR('q', 6, int)`.
    AlignGet = xdma_ioc(IOC_READ, 6, size_of::<i32>()),
    /// Submits a transfer, `_IOWR('q', 7, struct xdma_transfer_request *)`.
    SubmitTransfer = xdma_ioc(IOC_READ | IOC_WRITE, 7, size_of::<usize>()),
}

impl TryFrom<u32> for XdmaIoctl {
    type Error = Error;

    fn try_from(cmd: u32) -> Result<Self> {
        const PERF_TEST: u32 = XdmaIoctl::PerfTest as u32;
        const ADDR_MODE_SET: u32 = XdmaIoctl::AddrModeSet as u32;
        const ADDR_MODE_GET: u32 = XdmaIoctl::AddrModeGet as u32;
        const ALIGN_GET: u32 = XdmaIoctl::AlignGet as u32;
        const SUBMIT_TRANSFER: u32 = XdmaIoctl::SubmitTransfer as u32;

        match cmd {
            PERF_TEST => Ok(Self::PerfTest),
            ADDR_MODE_SET => Ok(Self::AddrModeSet),
            ADDR_MODE_GET => Ok(Self::AddrModeGet),
            ALIGN_GET => Ok(Self::AlignGet),
            SUBMIT_TRANSFER => Ok(Self::SubmitTransfer),
            _ => return_errno_with_message!(
                Errno::ENOTTY,
                "the ioctl command is not supported by SG-DMA files"
            ),
        }
    }
}

/// The payload of [`XdmaIoctl::PerfTest`].
///
/// `transfer_size` is the input; the remaining fields are filled in by the
/// benchmark.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PerformanceIoctl {
    pub version: u32,
    pub transfer_size: u32,
    pub stopped: u32,
    pub iterations: u32,
    pub clock_cycle_count: u64,
    pub data_cycle_count: u64,
    pub pending_count: u64,
}

/// The direction requested by a [`TransferRequest`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Host to card.
    H2C = 0,
    /// Card to host.
    C2H = 1,
}

impl TransferMode {
    pub fn direction(&self) -> DmaDirection {
        match self {
            Self::H2C => DmaDirection::ToDevice,
            Self::C2H => DmaDirection::FromDevice,
        }
    }
}

impl TryFrom<u32> for TransferMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::H2C),
            1 => Ok(Self::C2H),
            _ => return_errno_with_message!(Errno::EINVAL, "invalid transfer mode"),
        }
    }
}

/// The payload of [`XdmaIoctl::SubmitTransfer`].
///
/// On return, `length` holds the number of bytes transferred, or zero if the
/// transfer failed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TransferRequest {
    /// A [`TransferMode`] value.
    pub mode: u32,
    pub _pad: u32,
    pub buf: u64,
    pub length: u64,
    /// The AXI address, ignored by streaming engines.
    pub axi_address: u64,
}

impl TransferRequest {
    pub fn new(mode: TransferMode, buf: Vaddr, length: usize, axi_address: u64) -> Self {
        Self {
            mode: mode as u32,
            _pad: 0,
            buf: buf as u64,
            length: length as u64,
            axi_address,
        }
    }
}

/// Dispatches an `ioctl` command issued on an SG-DMA file.
pub(super) fn dispatch(
    engine: &Engine,
    submitter: &dyn TransferSubmitter,
    user: &dyn UserSpace,
    cmd: u32,
    arg: Vaddr,
) -> Result<i32> {
    let cmd = XdmaIoctl::try_from(cmd).inspect_err(|_| {
        log::debug!("[xdma] unsupported ioctl command {:#x}", cmd);
    })?;
    log::debug!("[xdma] ioctl {:?}", cmd);

    match cmd {
        XdmaIoctl::PerfTest => perf_test(engine, submitter, user, arg),
        XdmaIoctl::AddrModeSet => addr_mode_set(engine, submitter, user, arg),
        XdmaIoctl::AddrModeGet => addr_mode_get(engine, user, arg),
        XdmaIoctl::AlignGet => align_get(engine, user, arg),
        XdmaIoctl::SubmitTransfer => submit_transfer(engine, submitter, user, arg),
    }
}

fn perf_test(
    engine: &Engine,
    submitter: &dyn TransferSubmitter,
    user: &dyn UserSpace,
    arg: Vaddr,
) -> Result<i32> {
    let _busy = engine.try_lock_busy()?;

    let mut perf: PerformanceIoctl = user.read_val(arg).inspect_err(|_| {
        log::debug!("[xdma] failed to copy the performance request from {:#x}", arg);
    })?;
    log::debug!(
        "[xdma] performance test transfer_size = {}",
        perf.transfer_size
    );

    submitter.submit_performance(engine, &mut perf)?;

    user.write_val(arg, &perf).inspect_err(|_| {
        log::debug!("[xdma] failed to copy the performance result to user");
    })?;
    Ok(0)
}

fn addr_mode_set(
    engine: &Engine,
    submitter: &dyn TransferSubmitter,
    user: &dyn UserSpace,
    arg: Vaddr,
) -> Result<i32> {
    let fixed = user.read_val::<i32>(arg)? != 0;

    let _busy = engine.try_lock_busy()?;
    set_addr_mode(engine, submitter, fixed);
    Ok(0)
}

fn addr_mode_get(engine: &Engine, user: &dyn UserSpace, arg: Vaddr) -> Result<i32> {
    let fixed = engine.is_non_incr_addr() as i32;
    user.write_val(arg, &fixed)?;
    Ok(0)
}

fn align_get(engine: &Engine, user: &dyn UserSpace, arg: Vaddr) -> Result<i32> {
    let align = engine.addr_align() as i32;
    user.write_val(arg, &align)?;
    Ok(0)
}

fn submit_transfer(
    engine: &Engine,
    submitter: &dyn TransferSubmitter,
    user: &dyn UserSpace,
    arg: Vaddr,
) -> Result<i32> {
    user.check_access(arg, size_of::<TransferRequest>())?;

    // The access mode of the file already pins the direction. This only
    // confirms that the caller meant the same direction as the engine.
    let mode = user.read_val::<u32>(arg + offset_of!(TransferRequest, mode))?;
    let matches_engine = TransferMode::try_from(mode)
        .is_ok_and(|mode| mode.direction() == engine.direction());
    if !matches_engine {
        log::error!("[xdma] improper XDMA transfer mode {}", mode);
        return_errno_with_message!(
            Errno::ENOTSUPP,
            "the transfer mode does not match the engine direction"
        );
    }

    let _busy = engine.try_lock_busy()?;

    let request: TransferRequest = user.read_val(arg)?;
    let params = TransferParams {
        buf: to_vaddr(request.buf)?,
        length: to_vaddr(request.length)?,
        ep_addr: if engine.is_streaming() {
            0
        } else {
            request.axi_address
        },
        dir: engine.direction(),
    };
    user.check_access(params.buf, params.length)?;

    let length_addr = arg + offset_of!(TransferRequest, length);
    match submitter.submit(engine, &params) {
        Ok(transferred) => {
            user.write_val(length_addr, &(transferred as u64))?;
            Ok(0)
        }
        Err(err) => {
            user.write_val(length_addr, &0u64)?;
            Err(err)
        }
    }
}

fn to_vaddr(val: u64) -> Result<Vaddr> {
    Vaddr::try_from(val)
        .map_err(|_| Error::with_message(Errno::EFAULT, "the user range is not addressable"))
}
