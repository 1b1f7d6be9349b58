// SPDX-License-Identifier: MPL-2.0

//! Access to the memory of the calling process.

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::prelude::*;

/// A virtual address in the calling process.
pub type Vaddr = usize;

/// Plain-old-data types that can be copied from and to user memory as raw bytes.
pub trait Pod: FromBytes + IntoBytes + Immutable + Copy {}

impl<T: FromBytes + IntoBytes + Immutable + Copy> Pod for T {}

/// The address space of the calling process.
///
/// Implementations report inaccessible memory with `EFAULT`.
pub trait UserSpace: Send + Sync {
    /// Checks that `len` bytes starting at `addr` are accessible.
    fn check_access(&self, addr: Vaddr, len: usize) -> Result<()>;

    /// Reads `buf.len()` bytes starting at `addr`. No short reads.
    fn read_bytes(&self, addr: Vaddr, buf: &mut [u8]) -> Result<()>;

    /// Writes all of `buf` starting at `addr`. No short writes.
    fn write_bytes(&self, addr: Vaddr, buf: &[u8]) -> Result<()>;
}

impl dyn UserSpace + '_ {
    /// Reads a value of a specified type at a specified address.
    pub fn read_val<T: Pod>(&self, addr: Vaddr) -> Result<T> {
        let mut val = T::new_zeroed();
        self.read_bytes(addr, val.as_mut_bytes())?;
        Ok(val)
    }

    /// Writes a value of a specified type at a specified address.
    pub fn write_val<T: Pod>(&self, addr: Vaddr, val: &T) -> Result<()> {
        self.write_bytes(addr, val.as_bytes())
    }
}

