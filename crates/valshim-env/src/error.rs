//! Error types for Valshim handle operations
//!
//! Engine failures keep the native status they came with; everything else
//! is a problem caught before the engine was called.

use std::ffi::NulError;

use thiserror::Error;
use valshim_core::Status;

/// Valshim error types with detailed context
#[derive(Debug, Error)]
pub enum Error {
    /// The engine returned a non-success status
    #[error("{op} failed: {status}")]
    Engine {
        /// Native entrypoint that failed
        op: &'static str,
        /// Status exactly as returned
        status: Status,
    },

    /// A path or table name contained an interior NUL byte
    #[error("invalid name: {0}")]
    InvalidName(#[from] NulError),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bulk data is empty or not a whole number of stride-sized values
    #[error("{len} bytes do not split into a non-zero number of {stride}-byte values")]
    InvalidStride {
        /// Length of the supplied data
        len: usize,
        /// Requested bytes per value
        stride: usize,
    },
}

impl Error {
    /// The native status, if the engine produced this error.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Engine { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Valshim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Turn a native return code into a `Result`, tagging failures with `op`.
pub(crate) fn check(op: &'static str, rc: libc::c_int) -> Result<()> {
    Status::from_raw(rc).check().map_err(|status| Error::Engine { op, status })
}
