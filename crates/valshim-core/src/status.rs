//! Native status codes, passed through unmodified.
//!
//! Every boundary operation returns the engine's integer result as a
//! [`Status`]. Zero is success; every other value is an engine-defined
//! outcome. Nothing here maps codes onto richer kinds; callers compare
//! against the named constants and decide for themselves.

use std::ffi::CStr;
use std::fmt;

use libc::c_int;
use mdbx_sys as ffi;

/// An engine status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Status(c_int);

impl Status {
    /// Operation completed.
    pub const SUCCESS: Status = Status(ffi::MDBX_SUCCESS);
    /// Successful result with a special meaning (e.g. "nothing to list").
    pub const RESULT_TRUE: Status = Status(ffi::MDBX_RESULT_TRUE);
    /// key/data pair not found. A normal outcome for lookups and seeks.
    pub const NOT_FOUND: Status = Status(ffi::MDBX_NOTFOUND);
    /// key/data pair already exists (no-overwrite / no-dup-data requested).
    pub const KEY_EXIST: Status = Status(ffi::MDBX_KEYEXIST);
    /// Key or value size invalid for the table, including a bulk-insert
    /// stride that disagrees with the table's fixed value size.
    pub const BAD_VALSIZE: Status = Status(ffi::MDBX_BAD_VALSIZE);
    /// Environment map size reached.
    pub const MAP_FULL: Status = Status(ffi::MDBX_MAP_FULL);
    /// Reader slot table exhausted.
    pub const READERS_FULL: Status = Status(ffi::MDBX_READERS_FULL);
    /// Table flags incompatible with the requested operation.
    pub const INCOMPATIBLE: Status = Status(ffi::MDBX_INCOMPATIBLE);
    /// Transaction not valid for the requested operation.
    pub const BAD_TXN: Status = Status(ffi::MDBX_BAD_TXN);
    /// Table handle invalid or stale.
    pub const BAD_DBI: Status = Status(ffi::MDBX_BAD_DBI);
    /// Invalid argument.
    pub const EINVAL: Status = Status(ffi::MDBX_EINVAL);
    /// Unexpected internal error.
    pub const PROBLEM: Status = Status(ffi::MDBX_PROBLEM);

    /// Wrap a raw engine return value.
    #[inline]
    pub const fn from_raw(code: c_int) -> Self {
        Status(code)
    }

    /// The raw integer, exactly as the engine returned it.
    #[inline]
    pub const fn code(self) -> c_int {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == ffi::MDBX_SUCCESS
    }

    #[inline]
    pub const fn is_not_found(self) -> bool {
        self.0 == ffi::MDBX_NOTFOUND
    }

    /// `Ok(())` on success, otherwise the status itself as the error.
    #[inline]
    pub fn check(self) -> Result<(), Status> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// The engine's description of this code.
    pub fn message(self) -> String {
        // SAFETY: mdbx_strerror returns a pointer to a static or thread-local
        // NUL-terminated string for any input code, or null.
        unsafe {
            let ptr = ffi::mdbx_strerror(self.0);
            if ptr.is_null() {
                format!("code {}", self.0)
            } else {
                CStr::from_ptr(ptr).to_string_lossy().into_owned()
            }
        }
    }
}

impl From<c_int> for Status {
    fn from(code: c_int) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine status {}: {}", self.0, self.message())
    }
}

impl std::error::Error for Status {}
