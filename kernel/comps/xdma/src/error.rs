// SPDX-License-Identifier: MPL-2.0

/// Error number.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Errno {
    EIO = 5,        /* I/O error */
    EBADF = 9,      /* Bad file number */
    EACCES = 13,    /* Permission denied */
    EFAULT = 14,    /* Bad address */
    EBUSY = 16,     /* Device or resource busy */
    ENODEV = 19,    /* No such device */
    EINVAL = 22,    /* Invalid argument */
    ENOTTY = 25,    /* Not a typewriter */
    ESPIPE = 29,    /* Illegal seek */
    EOVERFLOW = 75, /* Value too large for defined data type */
    ETIMEDOUT = 110, /* Connection timed out */
    /*
     * Kernel-internal code, never meant to be seen by user space, yet Linux
     * drivers hand it out from ioctl handlers.
     */
    ENOTSUPP = 524, /* Operation is not supported */
}

pub type Result<T> = core::result::Result<T, Error>;

/// error used in this crate
#[derive(Debug, Clone, Copy)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    pub const fn error(&self) -> Errno {
        self.errno
    }

    pub const fn message(&self) -> Option<&'static str> {
        self.msg
    }

    /// Returns the value handed back to user space: the negated error number.
    pub const fn to_return_value(&self) -> isize {
        -(self.errno as isize)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.errno == other.errno && self.msg == other.msg
    }
}

impl Eq for Error {}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

impl AsRef<Error> for Error {
    fn as_ref(&self) -> &Error {
        self
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{:?}: {}", self.errno, msg),
            None => write!(f, "{:?}", self.errno),
        }
    }
}

/// A second transfer was attempted while one is in flight.
pub const ENGINE_BUSY: Error =
    Error::with_message(Errno::EBUSY, "the engine has a transfer in flight");

/// A second open was attempted while the engine is open.
pub const ALREADY_OPEN: Error = Error::with_message(Errno::EBUSY, "the engine is already open");

#[macro_export]
macro_rules! return_errno {
    ($errno: expr) => {
        return Err($crate::error::Error::new($errno))
    };
}

#[macro_export]
macro_rules! return_errno_with_message {
    ($errno: expr, $message: expr) => {
        return Err($crate::error::Error::with_message($errno, $message))
    };
}
