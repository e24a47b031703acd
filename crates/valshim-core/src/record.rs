//! Single-key record operations: get, put, delete.
//!
//! Each call wraps the caller's bytes in views, makes one native call
//! against a transaction and table handle, and hands the engine's status
//! back untouched.
//!
//! # Safety
//!
//! All functions take raw engine handles. `txn` must be a live transaction
//! (read-write for mutations) used from its owning thread, and `dbi` a table
//! handle opened in its environment.

use mdbx_sys as ffi;

use crate::flags::PutFlags;
use crate::status::Status;
use crate::val::Val;

/// Point lookup.
///
/// The returned view aliases engine memory: read-only, valid until the
/// transaction ends or the record is modified. NOT_FOUND is a normal status;
/// the view is then absent.
///
/// # Safety
/// See the module documentation. The caller chooses `'txn` and must not let
/// the view outlive the transaction.
pub unsafe fn get<'txn>(
    txn: *const ffi::MDBX_txn,
    dbi: ffi::MDBX_dbi,
    key: &[u8],
) -> (Val<'txn>, Status) {
    let key = Val::new(key);
    let mut data = Val::absent();
    let rc = ffi::mdbx_get(txn, dbi, key.as_raw(), data.as_raw_mut());
    let status = Status::from_raw(rc);
    if !status.is_success() {
        data = Val::absent();
    }
    (data, status)
}

/// Store `value` under `key`, both supplied as raw bytes.
///
/// # Safety
/// See the module documentation.
pub unsafe fn put(
    txn: *mut ffi::MDBX_txn,
    dbi: ffi::MDBX_dbi,
    key: &[u8],
    value: &[u8],
    flags: PutFlags,
) -> Status {
    let mut value = Val::new(value);
    put_view(txn, dbi, key, &mut value, flags)
}

/// Store a pre-built value view under `key`.
///
/// With [`PutFlags::RESERVE`] pass [`Val::reserve`]; on success the engine
/// points `value` at the reserved region for the caller to fill before the
/// transaction ends.
///
/// # Safety
/// See the module documentation. `value` must satisfy the
/// [`Val::from_raw_parts`] contract for the duration of the call.
pub unsafe fn put_view(
    txn: *mut ffi::MDBX_txn,
    dbi: ffi::MDBX_dbi,
    key: &[u8],
    value: &mut Val<'_>,
    flags: PutFlags,
) -> Status {
    let key = Val::new(key);
    let rc = ffi::mdbx_put(txn, dbi, key.as_raw(), value.as_raw_mut(), flags.to_raw());
    Status::from_raw(rc)
}

/// Delete `key`.
///
/// With `Some(value)` only that duplicate is removed from a duplicate-keys
/// table; with `None` the engine receives a null value pointer and every
/// value of the key goes.
///
/// # Safety
/// See the module documentation.
pub unsafe fn del(
    txn: *mut ffi::MDBX_txn,
    dbi: ffi::MDBX_dbi,
    key: &[u8],
    value: Option<&[u8]>,
) -> Status {
    let key = Val::new(key);
    let rc = match value {
        Some(value) => {
            let value = Val::new(value);
            ffi::mdbx_del(txn, dbi, key.as_raw(), value.as_raw())
        }
        None => ffi::mdbx_del(txn, dbi, key.as_raw(), std::ptr::null()),
    };
    Status::from_raw(rc)
}
