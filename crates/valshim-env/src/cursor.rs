//! Cursor implementations.
//!
//! `Cursor` reads; `CursorMut` wraps it and adds the write operations.
//! Every positioned read hands back slices that borrow the cursor, so the
//! next move invalidates them at compile time.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr;

use valshim_core::cursor::{self as raw_cursor, CursorGet};
use valshim_core::{ffi, CursorOp, MultiPage, MultiValue, PutFlags, Status, Val};

use crate::error::{check, Error, Result};
use crate::txn::Table;

/// A key/value pair borrowed from the engine.
pub type Pair<'a> = (&'a [u8], &'a [u8]);

/// Read cursor over one table.
pub struct Cursor<'txn> {
    cursor: *mut ffi::MDBX_cursor,
    table: Table,
    _txn: PhantomData<&'txn ffi::MDBX_txn>,
}

impl<'txn> Cursor<'txn> {
    pub(crate) fn open(txn: *mut ffi::MDBX_txn, table: Table) -> Result<Self> {
        let mut cursor: *mut ffi::MDBX_cursor = ptr::null_mut();
        check("mdbx_cursor_open", unsafe {
            ffi::mdbx_cursor_open(txn, table.dbi(), &mut cursor)
        })?;
        Ok(Cursor { cursor, table, _txn: PhantomData })
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Raw engine handle, for calling the boundary layer directly.
    pub fn raw(&self) -> *mut ffi::MDBX_cursor {
        self.cursor
    }

    /// General positioned read.
    ///
    /// `key` and `value` are the operation's inputs (a seek key, a value to
    /// match). Which of them reach the engine is decided by `op`: inputs the
    /// operation does not read are ignored, and a missing input it does read
    /// is sent as an empty view. `Ok(None)` means the engine reported
    /// NOT_FOUND.
    pub fn get<'a>(
        &'a mut self,
        op: CursorOp,
        key: Option<&'a [u8]>,
        value: Option<&'a [u8]>,
    ) -> Result<Option<Pair<'a>>> {
        let (key, value) = (key.unwrap_or(&[]), value.unwrap_or(&[]));
        let result: CursorGet<'a> = unsafe {
            if op.takes_value() {
                raw_cursor::cursor_seek_both(self.cursor, key, value, op)
            } else if op.takes_key() {
                raw_cursor::cursor_seek(self.cursor, key, op)
            } else {
                raw_cursor::cursor_step(self.cursor, op)
            }
        };
        if result.status.is_not_found() {
            return Ok(None);
        }
        // RESULT_TRUE: a lower-bound seek landed on a greater pair
        if result.status != Status::RESULT_TRUE {
            result
                .status
                .check()
                .map_err(|status| Error::Engine { op: "mdbx_cursor_get", status })?;
        }
        unsafe { Ok(Some((result.key.as_slice(), result.value.as_slice()))) }
    }

    pub fn first(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::First, None, None)
    }

    pub fn last(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::Last, None, None)
    }

    pub fn next(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::Next, None, None)
    }

    pub fn prev(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::Prev, None, None)
    }

    pub fn current(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::GetCurrent, None, None)
    }

    /// Next value of the current key in a duplicate-keys table.
    pub fn next_dup(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::NextDup, None, None)
    }

    /// First value of the next distinct key.
    pub fn next_nodup(&mut self) -> Result<Option<Pair<'_>>> {
        self.get(CursorOp::NextNoDup, None, None)
    }

    /// Position exactly at `key`.
    pub fn set<'a>(&'a mut self, key: &'a [u8]) -> Result<Option<Pair<'a>>> {
        self.get(CursorOp::SetKey, Some(key), None)
    }

    /// Position at the first key greater than or equal to `key`.
    pub fn set_range<'a>(&'a mut self, key: &'a [u8]) -> Result<Option<Pair<'a>>> {
        self.get(CursorOp::SetRange, Some(key), None)
    }

    /// Position exactly at `(key, value)` in a duplicate-keys table.
    pub fn get_both<'a>(&'a mut self, key: &'a [u8], value: &'a [u8]) -> Result<Option<Pair<'a>>> {
        self.get(CursorOp::GetBoth, Some(key), Some(value))
    }

    /// Position at `key` and its first value greater than or equal to `value`.
    pub fn get_both_range<'a>(&'a mut self, key: &'a [u8], value: &'a [u8]) -> Result<Option<Pair<'a>>> {
        self.get(CursorOp::GetBothRange, Some(key), Some(value))
    }

    /// Position at the first pair greater than or equal to `(key, value)`.
    pub fn lower_bound<'a>(&'a mut self, key: &'a [u8], value: &'a [u8]) -> Result<Option<Pair<'a>>> {
        self.get(CursorOp::SetLowerBound, Some(key), Some(value))
    }

    /// The page of fixed-size duplicates at the current position, split
    /// into `stride`-byte values.
    pub fn get_multiple(&mut self, stride: usize) -> Result<Option<MultiPage<'_>>> {
        self.multiple(CursorOp::GetMultiple, stride)
    }

    /// The next page of fixed-size duplicates of the current key.
    pub fn next_multiple(&mut self, stride: usize) -> Result<Option<MultiPage<'_>>> {
        self.multiple(CursorOp::NextMultiple, stride)
    }

    /// The previous page of fixed-size duplicates of the current key.
    pub fn prev_multiple(&mut self, stride: usize) -> Result<Option<MultiPage<'_>>> {
        self.multiple(CursorOp::PrevMultiple, stride)
    }

    fn multiple(&mut self, op: CursorOp, stride: usize) -> Result<Option<MultiPage<'_>>> {
        match self.get(op, None, None)? {
            Some((_, page)) => MultiPage::new(page, stride)
                .map(Some)
                .ok_or(Error::InvalidStride { len: page.len(), stride }),
            None => Ok(None),
        }
    }

    /// Number of values under the current key.
    pub fn count(&self) -> Result<usize> {
        let (count, status) = unsafe { raw_cursor::cursor_count(self.cursor) };
        status
            .check()
            .map_err(|status| Error::Engine { op: "mdbx_cursor_count", status })?;
        Ok(count)
    }

    /// Copy out every value stored under `key`, in table order.
    pub fn dup_values(&mut self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut values = Vec::new();
        match self.set(key)? {
            Some((_, value)) => values.push(value.to_vec()),
            None => return Ok(values),
        }
        while let Some((_, value)) = self.next_dup()? {
            values.push(value.to_vec());
        }
        Ok(values)
    }

    /// Copy out every record from the current table, in key order.
    pub fn collect_all(&mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut records = Vec::new();
        let mut step = self.first()?.map(|(k, v)| (k.to_vec(), v.to_vec()));
        while let Some(record) = step {
            records.push(record);
            step = self.next()?.map(|(k, v)| (k.to_vec(), v.to_vec()));
        }
        Ok(records)
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("table", &self.table)
            .finish()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        unsafe { ffi::mdbx_cursor_close(self.cursor) }
    }
}

/// Read-write cursor over one table.
pub struct CursorMut<'txn> {
    inner: Cursor<'txn>,
}

impl<'txn> CursorMut<'txn> {
    pub(crate) fn new(inner: Cursor<'txn>) -> Self {
        Self { inner }
    }

    /// Store `value` at `key`; the cursor lands on the new record.
    pub fn put(&mut self, key: &[u8], value: &[u8], flags: PutFlags) -> Result<()> {
        let status = unsafe { raw_cursor::cursor_put(self.inner.cursor, key, value, flags) };
        status.check().map_err(|status| Error::Engine { op: "mdbx_cursor_put", status })
    }

    /// Reserve `len` bytes at `key` and return them for the caller to fill.
    pub fn put_reserve(&mut self, key: &[u8], len: usize, flags: PutFlags) -> Result<&mut [u8]> {
        let mut value = Val::reserve(len);
        let status = unsafe {
            raw_cursor::cursor_put_view(self.inner.cursor, key, &mut value, flags | PutFlags::RESERVE)
        };
        status.check().map_err(|status| Error::Engine { op: "mdbx_cursor_put", status })?;
        Ok(unsafe { value.as_mut_slice() })
    }

    /// Bulk-insert `data`, split into `stride`-byte values, under `key`.
    ///
    /// The table must hold fixed-size duplicates of exactly `stride` bytes.
    /// Empty or ragged `data` is refused with [`Error::InvalidStride`]
    /// before the engine is called. Returns how many values the engine wrote.
    pub fn put_multi(&mut self, key: &[u8], data: &[u8], stride: usize, flags: PutFlags) -> Result<usize> {
        let mut values = MultiValue::new(data, stride).ok_or(Error::InvalidStride {
            len: data.len(),
            stride,
        })?;
        let status = unsafe { raw_cursor::cursor_put_multi(self.inner.cursor, key, &mut values, flags) };
        status.check().map_err(|status| Error::Engine { op: "mdbx_cursor_put", status })?;
        tracing::trace!(stride, written = values.count(), "bulk insert");
        Ok(values.count())
    }

    /// Delete the record under the cursor. [`PutFlags::ALL_DUPS`] removes
    /// every value of the current key.
    pub fn del(&mut self, flags: PutFlags) -> Result<()> {
        let status: Status = unsafe { raw_cursor::cursor_del(self.inner.cursor, flags) };
        status.check().map_err(|status| Error::Engine { op: "mdbx_cursor_del", status })
    }
}

impl<'txn> Deref for CursorMut<'txn> {
    type Target = Cursor<'txn>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for CursorMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl fmt::Debug for CursorMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("table", &self.inner.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Environment;
    use tempfile::TempDir;
    use valshim_core::TableFlags;

    fn test_env() -> (Environment, TempDir) {
        let dir = TempDir::new().unwrap();
        let env = Environment::open(dir.path(), Config::small()).unwrap();
        (env, dir)
    }

    #[test]
    fn test_walk_in_key_order() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        for key in [&b"c"[..], b"a", b"b"] {
            txn.put(table, key, key, PutFlags::empty()).unwrap();
        }

        let mut cursor = txn.cursor(table).unwrap();
        let keys: Vec<Vec<u8>> = cursor.collect_all().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        assert_eq!(cursor.last().unwrap(), Some((&b"c"[..], &b"c"[..])));
        assert_eq!(cursor.prev().unwrap(), Some((&b"b"[..], &b"b"[..])));
    }

    #[test]
    fn test_set_range_and_missing() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        txn.put(table, b"apple", b"1", PutFlags::empty()).unwrap();
        txn.put(table, b"cherry", b"3", PutFlags::empty()).unwrap();

        let mut cursor = txn.cursor(table).unwrap();
        assert_eq!(cursor.set_range(b"b").unwrap(), Some((&b"cherry"[..], &b"3"[..])));
        assert_eq!(cursor.set(b"banana").unwrap(), None);
        assert_eq!(cursor.set_range(b"d").unwrap(), None);
    }

    #[test]
    fn test_dup_values_and_count() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("dups"), TableFlags::DUP_SORT).unwrap();
        for value in [&b"x2"[..], b"x1", b"x3"] {
            txn.put(table, b"k", value, PutFlags::empty()).unwrap();
        }

        let mut cursor = txn.cursor(table).unwrap();
        let values = cursor.dup_values(b"k").unwrap();
        assert_eq!(values, vec![b"x1".to_vec(), b"x2".to_vec(), b"x3".to_vec()]);
        assert!(cursor.set(b"k").unwrap().is_some());
        assert_eq!(cursor.count().unwrap(), 3);
        assert_eq!(cursor.get_both(b"k", b"x2").unwrap(), Some((&b"k"[..], &b"x2"[..])));
        assert!(cursor.dup_values(b"none").unwrap().is_empty());
    }

    #[test]
    fn test_get_both_range() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("dups"), TableFlags::DUP_SORT).unwrap();
        for value in [&b"x1"[..], b"x3", b"x5"] {
            txn.put(table, b"k", value, PutFlags::empty()).unwrap();
        }

        let mut cursor = txn.cursor(table).unwrap();
        assert_eq!(cursor.get_both_range(b"k", b"x2").unwrap(), Some((&b"k"[..], &b"x3"[..])));
        assert_eq!(cursor.get_both_range(b"k", b"x5").unwrap(), Some((&b"k"[..], &b"x5"[..])));
        assert_eq!(cursor.get_both_range(b"k", b"x9").unwrap(), None);
        assert_eq!(cursor.get_both_range(b"j", b"x1").unwrap(), None);
    }

    #[test]
    fn test_lower_bound() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("dups"), TableFlags::DUP_SORT).unwrap();
        for value in [&b"x1"[..], b"x3"] {
            txn.put(table, b"k", value, PutFlags::empty()).unwrap();
        }

        let mut cursor = txn.cursor(table).unwrap();
        assert_eq!(cursor.lower_bound(b"k", b"x3").unwrap(), Some((&b"k"[..], &b"x3"[..])));
        assert_eq!(cursor.lower_bound(b"k", b"x2").unwrap(), Some((&b"k"[..], &b"x3"[..])));
        assert_eq!(cursor.lower_bound(b"k", b"x9").unwrap(), None);
    }

    #[test]
    fn test_get_ignores_inputs_the_op_does_not_read() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        txn.put(table, b"a", b"1", PutFlags::empty()).unwrap();
        txn.put(table, b"b", b"2", PutFlags::empty()).unwrap();

        let mut cursor = txn.cursor(table).unwrap();
        // First reads no key; the stray one is not used as a seek target
        let got = cursor.get(CursorOp::First, Some(&b"b"[..]), Some(&b"2"[..])).unwrap();
        assert_eq!(got, Some((&b"a"[..], &b"1"[..])));
        // SetRange reads only the key
        let got = cursor.get(CursorOp::SetRange, Some(&b"b"[..]), Some(&b"zzz"[..])).unwrap();
        assert_eq!(got, Some((&b"b"[..], &b"2"[..])));
    }

    #[test]
    fn test_cursor_put_and_del() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        {
            let mut cursor = txn.cursor_mut(table).unwrap();
            cursor.put(b"a", b"1", PutFlags::empty()).unwrap();
            cursor.put(b"b", b"2", PutFlags::empty()).unwrap();
            assert!(cursor.set(b"a").unwrap().is_some());
            cursor.del(PutFlags::empty()).unwrap();
        }
        assert_eq!(txn.get(table, b"a").unwrap(), None);
        assert_eq!(txn.get(table, b"b").unwrap(), Some(&b"2"[..]));
    }

    #[test]
    fn test_cursor_put_reserve() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        {
            let mut cursor = txn.cursor_mut(table).unwrap();
            cursor.put_reserve(b"r", 3, PutFlags::empty()).unwrap().copy_from_slice(b"abc");
        }
        assert_eq!(txn.get(table, b"r").unwrap(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_put_multi_empty_rejected_locally() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn
            .create_table(Some("fixed"), TableFlags::DUP_SORT | TableFlags::DUP_FIXED)
            .unwrap();
        {
            let mut cursor = txn.cursor_mut(table).unwrap();
            assert!(matches!(
                cursor.put_multi(b"k", b"", 8, PutFlags::empty()),
                Err(Error::InvalidStride { len: 0, stride: 8 })
            ));
        }
        assert_eq!(txn.get(table, b"k").unwrap(), None);
    }

    #[test]
    fn test_multiple_pages_and_stride_check() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn
            .create_table(Some("fixed"), TableFlags::DUP_SORT | TableFlags::DUP_FIXED)
            .unwrap();
        let data = b"AAAAAAAABBBBBBBBCCCCCCCC";
        {
            let mut cursor = txn.cursor_mut(table).unwrap();
            assert_eq!(cursor.put_multi(b"k", data, 8, PutFlags::empty()).unwrap(), 3);
        }

        let mut cursor = txn.cursor(table).unwrap();
        assert!(cursor.set(b"k").unwrap().is_some());
        let page = cursor.get_multiple(8).unwrap().unwrap();
        assert_eq!(page.page(), &data[..]);
        assert_eq!(page.len(), 3);
        assert_eq!(cursor.next_multiple(8).unwrap(), None);

        assert!(cursor.set(b"k").unwrap().is_some());
        match cursor.get_multiple(5) {
            Err(Error::InvalidStride { len, stride }) => {
                assert_eq!(len, 24);
                assert_eq!(stride, 5);
            }
            other => panic!("Expected InvalidStride, got {:?}", other),
        }
    }

    #[test]
    fn test_put_multi_ragged_rejected_locally() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn
            .create_table(Some("fixed"), TableFlags::DUP_SORT | TableFlags::DUP_FIXED)
            .unwrap();
        let mut cursor = txn.cursor_mut(table).unwrap();
        match cursor.put_multi(b"k", b"AAAAAAAABBB", 8, PutFlags::empty()) {
            Err(Error::InvalidStride { len, stride }) => {
                assert_eq!(len, 11);
                assert_eq!(stride, 8);
            }
            other => panic!("Expected InvalidStride, got {:?}", other),
        }
    }
}
