//! Comparator bridge: the table's effective key and duplicate-value
//! ordering, callable from outside the engine.

use libc::c_int;
use mdbx_sys as ffi;

use crate::val::Val;

/// Native comparator signature, for registering a custom ordering when a
/// table is opened.
pub type Comparator = unsafe extern "C" fn(a: *const ffi::MDBX_val, b: *const ffi::MDBX_val) -> c_int;

/// Compare two keys with the table's key ordering.
///
/// Negative if `a < b`, zero if equal, positive if `a > b`. The magnitude
/// is whatever the comparator returned.
///
/// # Safety
/// `txn` must be live and `dbi` opened in its environment.
pub unsafe fn compare_keys(txn: *const ffi::MDBX_txn, dbi: ffi::MDBX_dbi, a: &[u8], b: &[u8]) -> c_int {
    let a = Val::new(a);
    let b = Val::new(b);
    ffi::mdbx_cmp(txn, dbi, a.as_raw(), b.as_raw())
}

/// Compare two values with the table's duplicate-value ordering.
///
/// # Safety
/// As [`compare_keys`].
pub unsafe fn compare_duplicate_values(
    txn: *const ffi::MDBX_txn,
    dbi: ffi::MDBX_dbi,
    a: &[u8],
    b: &[u8],
) -> c_int {
    let a = Val::new(a);
    let b = Val::new(b);
    ffi::mdbx_dcmp(txn, dbi, a.as_raw(), b.as_raw())
}
