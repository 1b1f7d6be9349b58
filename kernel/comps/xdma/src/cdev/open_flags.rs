// SPDX-License-Identifier: MPL-2.0

//! The flags given to `open(2)`.

use bitflags::bitflags;

use crate::prelude::*;

#[expect(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessMode {
    /// read only
    O_RDONLY = 0,
    /// write only
    O_WRONLY = 1,
    /// read write
    O_RDWR = 2,
}

impl AccessMode {
    pub fn is_readable(&self) -> bool {
        matches!(*self, AccessMode::O_RDONLY | AccessMode::O_RDWR)
    }

    pub fn is_writable(&self) -> bool {
        matches!(*self, AccessMode::O_WRONLY | AccessMode::O_RDWR)
    }
}

impl TryFrom<u32> for AccessMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value & ACCESS_MODE_MASK {
            0 => Ok(AccessMode::O_RDONLY),
            1 => Ok(AccessMode::O_WRONLY),
            2 => Ok(AccessMode::O_RDWR),
            _ => return_errno_with_message!(Errno::EINVAL, "invalid access mode"),
        }
    }
}

const ACCESS_MODE_MASK: u32 = 0b11;

bitflags! {
    pub struct CreationFlags: u32 {
        /// create file if it does not exist
        const O_CREAT = 1 << 6;
        /// error if CREATE and the file exists
        const O_EXCL = 1 << 7;
        /// not become the process's controlling terminal
        const O_NOCTTY = 1 << 8;
        /// truncate file upon open
        const O_TRUNC = 1 << 9;
        /// non block
        const O_NONBLOCK = 1 << 11;
        /// close on exec
        const O_CLOEXEC = 1 << 19;
    }
}

/// The decoded flags of an `open(2)` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenFlags {
    access_mode: AccessMode,
    creation_flags: CreationFlags,
}

impl OpenFlags {
    pub fn new(access_mode: AccessMode, creation_flags: CreationFlags) -> Self {
        Self {
            access_mode,
            creation_flags,
        }
    }

    /// Decodes the raw `flags` argument of `open(2)`.
    pub fn from_raw(flags: u32) -> Result<Self> {
        let access_mode = AccessMode::try_from(flags)?;
        let creation_flags = CreationFlags::from_bits_truncate(flags);
        Ok(Self::new(access_mode, creation_flags))
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn creation_flags(&self) -> CreationFlags {
        self.creation_flags
    }

    /// Returns whether `O_TRUNC` is given.
    ///
    /// SG-DMA files have no content to truncate; the flag is reused to select
    /// end-of-packet flushing (streaming engines) or fixed-address mode
    /// (memory-mapped engines).
    pub fn is_trunc(&self) -> bool {
        self.creation_flags.contains(CreationFlags::O_TRUNC)
    }
}

impl From<AccessMode> for OpenFlags {
    fn from(access_mode: AccessMode) -> Self {
        Self::new(access_mode, CreationFlags::empty())
    }
}
