// SPDX-License-Identifier: MPL-2.0

pub(crate) use alloc::{string::String, sync::Arc, vec::Vec};
pub(crate) use core::fmt::Debug;

pub(crate) use crate::{
    error::{Errno, Error, Result},
    return_errno_with_message,
};
