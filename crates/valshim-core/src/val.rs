//! Borrowed key/value views.
//!
//! A [`Val`] is the engine's `{pointer, length}` pair with a lifetime
//! attached. It borrows; it never copies and never owns. Input views borrow
//! caller memory for the duration of one native call. Output views alias
//! engine pages and are only valid until the owning transaction ends or the
//! record is modified, which the caller expresses by picking `'a`.

use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use libc::c_void;
use mdbx_sys as ffi;

/// A borrowed `{pointer, length}` view over key or value bytes.
///
/// Layout-identical to the engine's `MDBX_val`, so `&mut Val` can be handed
/// to the engine wherever it expects a `MDBX_val *`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Val<'a> {
    raw: ffi::MDBX_val,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> Val<'a> {
    /// View over `bytes`. No copy.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        // SAFETY: a slice's pointer and length describe valid memory for 'a.
        unsafe { Self::from_raw_parts(bytes.as_ptr(), bytes.len()) }
    }

    /// View with exactly this pointer and length.
    ///
    /// # Safety
    /// `ptr` must reference `len` readable bytes that stay at a fixed address
    /// for as long as the view is in use by a native call. A null pointer is
    /// only meaningful with `len == 0`, unless the view is a reserve request.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Val {
            raw: ffi::MDBX_val {
                iov_base: ptr as *mut c_void,
                iov_len: len,
            },
            _marker: PhantomData,
        }
    }

    /// The explicitly empty/absent view: null pointer, zero length.
    #[inline]
    pub fn absent() -> Self {
        // SAFETY: null with zero length references no memory.
        unsafe { Self::from_raw_parts(ptr::null(), 0) }
    }

    /// A reserve request for `len` bytes.
    ///
    /// Passed to a put with [`PutFlags::RESERVE`](crate::PutFlags::RESERVE);
    /// on success the engine rewrites the pointer to the reserved region.
    #[inline]
    pub fn reserve(len: usize) -> Self {
        // SAFETY: the engine never reads through the pointer of a reserve request.
        unsafe { Self::from_raw_parts(ptr::null(), len) }
    }

    /// Wrap an engine-filled `MDBX_val`.
    ///
    /// # Safety
    /// The referenced memory must remain valid for `'a`.
    #[inline]
    pub unsafe fn from_raw(raw: ffi::MDBX_val) -> Self {
        Val {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.raw.iov_base as *const u8
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.iov_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.iov_len == 0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.raw.iov_base.is_null()
    }

    /// The viewed bytes.
    ///
    /// # Safety
    /// The view must reference `len()` initialized bytes that are still
    /// valid: for output views, the owning transaction must still be live
    /// and the record unmodified.
    #[inline]
    pub unsafe fn as_slice(&self) -> &'a [u8] {
        if self.raw.iov_base.is_null() {
            &[]
        } else {
            std::slice::from_raw_parts(self.raw.iov_base as *const u8, self.raw.iov_len)
        }
    }

    /// The viewed bytes, writable. Used for regions the engine reserved.
    ///
    /// # Safety
    /// As [`as_slice`](Self::as_slice), and the region must be writable and
    /// not aliased elsewhere.
    #[inline]
    pub unsafe fn as_mut_slice(&mut self) -> &'a mut [u8] {
        if self.raw.iov_base.is_null() {
            &mut []
        } else {
            std::slice::from_raw_parts_mut(self.raw.iov_base as *mut u8, self.raw.iov_len)
        }
    }

    #[inline]
    pub fn as_raw(&self) -> *const ffi::MDBX_val {
        &self.raw
    }

    #[inline]
    pub fn as_raw_mut(&mut self) -> *mut ffi::MDBX_val {
        &mut self.raw
    }

    #[inline]
    pub(crate) fn into_raw(self) -> ffi::MDBX_val {
        self.raw
    }
}

impl<'a> From<&'a [u8]> for Val<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Val::new(bytes)
    }
}

impl fmt::Debug for Val<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Val")
            .field("ptr", &self.raw.iov_base)
            .field("len", &self.raw.iov_len)
            .finish()
    }
}
