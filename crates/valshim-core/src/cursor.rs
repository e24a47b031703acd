//! Cursor-scoped operations: positioned get/put, delete, count, and the
//! fixed-size-duplicates bulk insert.
//!
//! The cursor's position is the engine's business. Nothing here tracks
//! whether a cursor is positioned; the returned status is authoritative.
//!
//! # Safety
//!
//! `cursor` must be a live cursor bound to a live transaction, used from
//! that transaction's thread. Mutating calls need a read-write transaction.

use std::marker::PhantomData;

use mdbx_sys as ffi;

use crate::flags::{CursorOp, PutFlags};
use crate::status::Status;
use crate::val::Val;

/// Result of a cursor read: the engine's key and value views plus status.
///
/// On failure both views are absent and the cursor may be unpositioned.
/// RESULT_TRUE (a lower-bound seek that landed past the requested pair)
/// still carries the views.
#[derive(Debug, Clone, Copy)]
pub struct CursorGet<'a> {
    pub key: Val<'a>,
    pub value: Val<'a>,
    pub status: Status,
}

impl<'a> CursorGet<'a> {
    fn finish(key: Val<'a>, value: Val<'a>, rc: libc::c_int) -> Self {
        let status = Status::from_raw(rc);
        if status.is_success() || status == Status::RESULT_TRUE {
            CursorGet { key, value, status }
        } else {
            CursorGet {
                key: Val::absent(),
                value: Val::absent(),
                status,
            }
        }
    }
}

/// Move the cursor without input buffers (First, Next, Prev, Last,
/// GetCurrent, NextDup, ...).
///
/// # Safety
/// See the module documentation. Output views alias engine memory for `'a`.
pub unsafe fn cursor_step<'a>(cursor: *mut ffi::MDBX_cursor, op: CursorOp) -> CursorGet<'a> {
    let mut key = Val::absent();
    let mut value = Val::absent();
    let rc = ffi::mdbx_cursor_get(cursor, key.as_raw_mut(), value.as_raw_mut(), op.to_raw());
    CursorGet::finish(key, value, rc)
}

/// Seek by key only (Set, SetKey, SetRange). The engine fills both key and
/// value as outputs.
///
/// # Safety
/// See the module documentation. `key` must outlive `'a`, since the engine
/// may hand the input view back as the output key.
pub unsafe fn cursor_seek<'a>(
    cursor: *mut ffi::MDBX_cursor,
    key: &'a [u8],
    op: CursorOp,
) -> CursorGet<'a> {
    let mut key = Val::new(key);
    let mut value = Val::absent();
    let rc = ffi::mdbx_cursor_get(cursor, key.as_raw_mut(), value.as_raw_mut(), op.to_raw());
    CursorGet::finish(key, value, rc)
}

/// Seek where the value takes part in the match (GetBoth, GetBothRange,
/// SetLowerBound).
///
/// # Safety
/// See the module documentation. `key` and `value` must outlive `'a`.
pub unsafe fn cursor_seek_both<'a>(
    cursor: *mut ffi::MDBX_cursor,
    key: &'a [u8],
    value: &'a [u8],
    op: CursorOp,
) -> CursorGet<'a> {
    let mut key = Val::new(key);
    let mut value = Val::new(value);
    let rc = ffi::mdbx_cursor_get(cursor, key.as_raw_mut(), value.as_raw_mut(), op.to_raw());
    CursorGet::finish(key, value, rc)
}

/// Store raw bytes at `key`; the cursor lands on the record on success.
///
/// # Safety
/// See the module documentation.
pub unsafe fn cursor_put(
    cursor: *mut ffi::MDBX_cursor,
    key: &[u8],
    value: &[u8],
    flags: PutFlags,
) -> Status {
    let mut value = Val::new(value);
    cursor_put_view(cursor, key, &mut value, flags)
}

/// Store a pre-built value view at `key`. With [`PutFlags::RESERVE`] the
/// engine points `value` at the reserved region.
///
/// # Safety
/// See the module documentation.
pub unsafe fn cursor_put_view(
    cursor: *mut ffi::MDBX_cursor,
    key: &[u8],
    value: &mut Val<'_>,
    flags: PutFlags,
) -> Status {
    let key = Val::new(key);
    let rc = ffi::mdbx_cursor_put(cursor, key.as_raw(), value.as_raw_mut(), flags.to_raw());
    Status::from_raw(rc)
}

/// A bulk insert of `count` contiguous values of `stride` bytes each.
///
/// Only meaningful for fixed-size-duplicates tables; the stride must match
/// the table's value size or the engine answers BAD_VALSIZE.
#[derive(Debug, Clone, Copy)]
pub struct MultiValue<'a> {
    data: *const u8,
    stride: usize,
    count: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> MultiValue<'a> {
    /// Split `data` into `stride`-byte values.
    ///
    /// `None` when `data` is empty, when `stride` is zero, or when `stride`
    /// does not divide `data.len()`. The engine treats a zero count as a
    /// successful no-op, so it is refused here.
    pub fn new(data: &'a [u8], stride: usize) -> Option<Self> {
        if data.is_empty() || stride == 0 || data.len() % stride != 0 {
            return None;
        }
        Some(MultiValue {
            data: data.as_ptr(),
            stride,
            count: data.len() / stride,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Values requested, or after a put, values the engine actually wrote.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Wire form: `[{stride, data}, {count, null}]`. The second element's
    /// length field carries a count, not a byte length.
    fn encode(&self) -> [ffi::MDBX_val; 2] {
        // SAFETY: data/stride come from a live 'a slice; the second view
        // references no memory.
        unsafe {
            [
                Val::from_raw_parts(self.data, self.stride).into_raw(),
                Val::from_raw_parts(std::ptr::null(), self.count).into_raw(),
            ]
        }
    }
}

/// A page of fixed-size duplicates returned by a GetMultiple, NextMultiple
/// or PrevMultiple read, split into `stride`-byte values.
///
/// The engine hands back the page as one value view; the stride is the
/// table's value size, which the caller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiPage<'a> {
    page: &'a [u8],
    stride: usize,
}

impl<'a> MultiPage<'a> {
    /// `None` when `stride` is zero or does not divide the page length.
    pub fn new(page: &'a [u8], stride: usize) -> Option<Self> {
        if stride == 0 || page.len() % stride != 0 {
            return None;
        }
        Some(MultiPage { page, stride })
    }

    /// Wrap the value view of a multiple-read.
    ///
    /// # Safety
    /// `value` must be an engine output view that is still valid for `'a`.
    pub unsafe fn from_val(value: Val<'a>, stride: usize) -> Option<Self> {
        Self::new(value.as_slice(), stride)
    }

    /// Number of values on the page.
    #[inline]
    pub fn len(&self) -> usize {
        self.page.len() / self.stride
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Page size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.page.len()
    }

    /// The raw page.
    #[inline]
    pub fn page(&self) -> &'a [u8] {
        self.page
    }

    /// The `i`th value, if there is one.
    pub fn get(&self, i: usize) -> Option<&'a [u8]> {
        let start = i.checked_mul(self.stride)?;
        self.page.get(start..start + self.stride)
    }

    pub fn values(&self) -> std::slice::ChunksExact<'a, u8> {
        self.page.chunks_exact(self.stride)
    }
}

/// Insert every value of `values` under `key` in one call.
///
/// [`PutFlags::MULTIPLE`] is always added. On return `values.count()` holds
/// the number of values the engine wrote.
///
/// # Safety
/// See the module documentation.
pub unsafe fn cursor_put_multi(
    cursor: *mut ffi::MDBX_cursor,
    key: &[u8],
    values: &mut MultiValue<'_>,
    flags: PutFlags,
) -> Status {
    let key = Val::new(key);
    let mut wire = values.encode();
    let flags = flags | PutFlags::MULTIPLE;
    let rc = ffi::mdbx_cursor_put(cursor, key.as_raw(), wire.as_mut_ptr(), flags.to_raw());
    values.count = wire[1].iov_len;
    Status::from_raw(rc)
}

/// Delete the record under the cursor. [`PutFlags::ALL_DUPS`] removes every
/// value of the current key.
///
/// # Safety
/// See the module documentation.
pub unsafe fn cursor_del(cursor: *mut ffi::MDBX_cursor, flags: PutFlags) -> Status {
    Status::from_raw(ffi::mdbx_cursor_del(cursor, flags.to_raw()))
}

/// Number of values stored under the cursor's current key.
///
/// # Safety
/// See the module documentation.
pub unsafe fn cursor_count(cursor: *const ffi::MDBX_cursor) -> (usize, Status) {
    let mut count: usize = 0;
    let rc = ffi::mdbx_cursor_count(cursor, &mut count);
    (count, Status::from_raw(rc))
}
