//! Transactions: `Transaction<RO>` (read) and `Transaction<RW>` (read-write).
//!
//! A transaction borrows its [`Environment`] and is pinned to the thread
//! that began it. Views returned by reads borrow the transaction, so the
//! borrow checker rules out using them after a write, commit or abort.
//! Dropping an uncommitted transaction aborts it.

use std::cmp::Ordering;
use std::ffi::CString;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use valshim_core::{compare, ffi, record, Comparator, PutFlags, Status, TableFlags, Val};

use crate::cursor::{Cursor, CursorMut};
use crate::env::{Environment, Stat};
use crate::error::{check, Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// Marker for the two transaction kinds.
pub trait TransactionKind: sealed::Sealed + 'static {
    #[doc(hidden)]
    const OPEN_FLAGS: ffi::MDBX_txn_flags_t;
    #[doc(hidden)]
    const NAME: &'static str;
}

/// Read-only transaction marker.
#[derive(Debug)]
pub struct RO;

/// Read-write transaction marker.
#[derive(Debug)]
pub struct RW;

impl sealed::Sealed for RO {}
impl sealed::Sealed for RW {}

impl TransactionKind for RO {
    const OPEN_FLAGS: ffi::MDBX_txn_flags_t = ffi::MDBX_TXN_RDONLY;
    const NAME: &'static str = "ro";
}

impl TransactionKind for RW {
    const OPEN_FLAGS: ffi::MDBX_txn_flags_t = ffi::MDBX_TXN_READWRITE;
    const NAME: &'static str = "rw";
}

/// An opened table handle. Valid for the life of the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table(ffi::MDBX_dbi);

impl Table {
    /// Native table handle.
    pub fn dbi(self) -> ffi::MDBX_dbi {
        self.0
    }
}

/// A transaction of kind `K` against an [`Environment`].
pub struct Transaction<'env, K: TransactionKind> {
    txn: *mut ffi::MDBX_txn,
    env: &'env Environment,
    _kind: PhantomData<K>,
}

impl<'env, K: TransactionKind> Transaction<'env, K> {
    pub(crate) fn begin(env: &'env Environment) -> Result<Self> {
        let mut txn: *mut ffi::MDBX_txn = ptr::null_mut();
        unsafe {
            check(
                "mdbx_txn_begin_ex",
                ffi::mdbx_txn_begin_ex(env.raw(), ptr::null_mut(), K::OPEN_FLAGS, &mut txn, ptr::null_mut()),
            )?;
        }
        let txn = Transaction { txn, env, _kind: PhantomData };
        tracing::trace!(kind = K::NAME, id = txn.id(), "began transaction");
        Ok(txn)
    }

    /// Engine transaction id (the snapshot a reader sees).
    pub fn id(&self) -> u64 {
        unsafe { ffi::mdbx_txn_id(self.txn) }
    }

    pub fn env(&self) -> &'env Environment {
        self.env
    }

    /// Raw engine handle, for calling the boundary layer directly.
    pub fn raw(&self) -> *mut ffi::MDBX_txn {
        self.txn
    }

    /// Open an existing table; `None` names the main table.
    pub fn open_table(&self, name: Option<&str>) -> Result<Table> {
        self.open_table_with_comparators(name, TableFlags::empty(), None, None)
    }

    /// Open a table with custom key and duplicate-value orderings.
    ///
    /// The same comparators must be supplied every time the table is
    /// opened; the engine does not persist them.
    pub fn open_table_with_comparators(
        &self,
        name: Option<&str>,
        flags: TableFlags,
        key_cmp: Option<Comparator>,
        value_cmp: Option<Comparator>,
    ) -> Result<Table> {
        let c_name = name.map(CString::new).transpose()?;
        let name_ptr = c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
        let mut dbi: ffi::MDBX_dbi = 0;
        unsafe {
            check(
                "mdbx_dbi_open_ex",
                ffi::mdbx_dbi_open_ex(self.txn, name_ptr, flags.to_raw(), &mut dbi, key_cmp, value_cmp),
            )?;
        }
        tracing::debug!(table = name.unwrap_or("<main>"), dbi, "opened table");
        Ok(Table(dbi))
    }

    /// Point lookup. `Ok(None)` when the key is absent.
    ///
    /// The slice aliases the engine's pages and lives as long as this
    /// borrow of the transaction.
    pub fn get<'txn>(&'txn self, table: Table, key: &[u8]) -> Result<Option<&'txn [u8]>> {
        let (view, status): (Val<'txn>, Status) = unsafe { record::get(self.txn, table.dbi(), key) };
        if status.is_not_found() {
            return Ok(None);
        }
        status.check().map_err(|status| Error::Engine { op: "mdbx_get", status })?;
        Ok(Some(unsafe { view.as_slice() }))
    }

    /// Order two keys by the table's key comparator.
    pub fn compare_keys(&self, table: Table, a: &[u8], b: &[u8]) -> Ordering {
        unsafe { compare::compare_keys(self.txn, table.dbi(), a, b) }.cmp(&0)
    }

    /// Order two values by the table's duplicate-value comparator.
    pub fn compare_values(&self, table: Table, a: &[u8], b: &[u8]) -> Ordering {
        unsafe { compare::compare_duplicate_values(self.txn, table.dbi(), a, b) }.cmp(&0)
    }

    pub fn table_stat(&self, table: Table) -> Result<Stat> {
        unsafe {
            let mut raw: ffi::MDBX_stat = mem::zeroed();
            check(
                "mdbx_dbi_stat",
                ffi::mdbx_dbi_stat(self.txn, table.dbi(), &mut raw, mem::size_of::<ffi::MDBX_stat>()),
            )?;
            Ok(raw.into())
        }
    }

    /// Open a read cursor on `table`.
    pub fn cursor(&self, table: Table) -> Result<Cursor<'_>> {
        Cursor::open(self.txn, table)
    }

    /// Commit. For a read-only transaction this releases the snapshot.
    pub fn commit(mut self) -> Result<()> {
        let txn = mem::replace(&mut self.txn, ptr::null_mut());
        let id = unsafe { ffi::mdbx_txn_id(txn) };
        check("mdbx_txn_commit_ex", unsafe { ffi::mdbx_txn_commit_ex(txn, ptr::null_mut()) })?;
        tracing::trace!(kind = K::NAME, id, "committed transaction");
        Ok(())
    }

    /// Discard all changes. Same as dropping the transaction.
    pub fn abort(self) {}
}

impl<'env> Transaction<'env, RW> {
    /// Open `name`, creating it with `flags` if it does not exist.
    pub fn create_table(&self, name: Option<&str>, flags: TableFlags) -> Result<Table> {
        self.open_table_with_comparators(name, flags | TableFlags::CREATE, None, None)
    }

    /// Store `value` under `key`.
    pub fn put(&mut self, table: Table, key: &[u8], value: &[u8], flags: PutFlags) -> Result<()> {
        let status = unsafe { record::put(self.txn, table.dbi(), key, value, flags) };
        status.check().map_err(|status| Error::Engine { op: "mdbx_put", status })
    }

    /// Reserve `len` bytes under `key` and return them for the caller to
    /// fill. The region is written back at commit.
    pub fn put_reserve(&mut self, table: Table, key: &[u8], len: usize, flags: PutFlags) -> Result<&mut [u8]> {
        let mut value = Val::reserve(len);
        let status = unsafe { record::put_view(self.txn, table.dbi(), key, &mut value, flags | PutFlags::RESERVE) };
        status.check().map_err(|status| Error::Engine { op: "mdbx_put", status })?;
        Ok(unsafe { value.as_mut_slice() })
    }

    /// Delete `key`, or only `(key, value)` in a duplicate-keys table.
    /// Returns whether anything was removed.
    pub fn del(&mut self, table: Table, key: &[u8], value: Option<&[u8]>) -> Result<bool> {
        let status = unsafe { record::del(self.txn, table.dbi(), key, value) };
        if status.is_not_found() {
            return Ok(false);
        }
        status.check().map_err(|status| Error::Engine { op: "mdbx_del", status })?;
        Ok(true)
    }

    /// Read the table's sequence and advance it by `increment`. Returns the
    /// value before the increment.
    pub fn sequence(&mut self, table: Table, increment: u64) -> Result<u64> {
        let mut value: u64 = 0;
        check("mdbx_dbi_sequence", unsafe {
            ffi::mdbx_dbi_sequence(self.txn, table.dbi(), &mut value, increment)
        })?;
        Ok(value)
    }

    /// Remove every record but keep the table.
    pub fn clear_table(&mut self, table: Table) -> Result<()> {
        check("mdbx_drop", unsafe { ffi::mdbx_drop(self.txn, table.dbi(), false) })
    }

    /// Delete the table itself. The handle is closed by the engine.
    pub fn drop_table(&mut self, table: Table) -> Result<()> {
        check("mdbx_drop", unsafe { ffi::mdbx_drop(self.txn, table.dbi(), true) })?;
        tracing::debug!(dbi = table.dbi(), "dropped table");
        Ok(())
    }

    /// Open a cursor that can also write to `table`.
    pub fn cursor_mut(&mut self, table: Table) -> Result<CursorMut<'_>> {
        Cursor::open(self.txn, table).map(CursorMut::new)
    }
}

impl<K: TransactionKind> fmt::Debug for Transaction<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("kind", &K::NAME)
            .field("id", &self.id())
            .finish()
    }
}

impl<K: TransactionKind> Drop for Transaction<'_, K> {
    fn drop(&mut self) {
        if self.txn.is_null() {
            return;
        }
        let rc = unsafe { ffi::mdbx_txn_abort(self.txn) };
        if rc != 0 {
            tracing::warn!(kind = K::NAME, status = %Status::from_raw(rc), "transaction abort failed");
        } else {
            tracing::trace!(kind = K::NAME, "aborted transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn test_env() -> (Environment, TempDir) {
        let dir = TempDir::new().unwrap();
        let env = Environment::open(dir.path(), Config::small()).unwrap();
        (env, dir)
    }

    #[test]
    fn test_put_get_commit() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("plain"), TableFlags::empty()).unwrap();
        txn.put(table, b"key", b"value", PutFlags::empty()).unwrap();
        assert_eq!(txn.get(table, b"key").unwrap(), Some(&b"value"[..]));
        txn.commit().unwrap();

        let txn = env.begin_ro_txn().unwrap();
        let table = txn.open_table(Some("plain")).unwrap();
        assert_eq!(txn.get(table, b"key").unwrap(), Some(&b"value"[..]));
        assert_eq!(txn.get(table, b"other").unwrap(), None);
    }

    #[test]
    fn test_drop_aborts() {
        let (env, _dir) = test_env();
        {
            let mut txn = env.begin_rw_txn().unwrap();
            let table = txn.create_table(None, TableFlags::empty()).unwrap();
            txn.put(table, b"gone", b"1", PutFlags::empty()).unwrap();
        }
        let txn = env.begin_ro_txn().unwrap();
        let table = txn.open_table(None).unwrap();
        assert_eq!(txn.get(table, b"gone").unwrap(), None);
    }

    #[test]
    fn test_missing_table_not_found() {
        let (env, _dir) = test_env();
        let txn = env.begin_ro_txn().unwrap();
        let err = txn.open_table(Some("absent")).unwrap_err();
        assert_eq!(err.status(), Some(Status::NOT_FOUND));
    }

    #[test]
    fn test_table_name_with_nul() {
        let (env, _dir) = test_env();
        let txn = env.begin_rw_txn().unwrap();
        assert!(matches!(
            txn.create_table(Some("bad\0name"), TableFlags::empty()),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_no_overwrite_reports_key_exist() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        txn.put(table, b"k", b"first", PutFlags::empty()).unwrap();
        let err = txn.put(table, b"k", b"second", PutFlags::NO_OVERWRITE).unwrap_err();
        assert_eq!(err.status(), Some(Status::KEY_EXIST));
        assert_eq!(txn.get(table, b"k").unwrap(), Some(&b"first"[..]));
    }

    #[test]
    fn test_put_reserve() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        let region = txn.put_reserve(table, b"r", 4, PutFlags::empty()).unwrap();
        assert_eq!(region.len(), 4);
        region.copy_from_slice(b"fill");
        assert_eq!(txn.get(table, b"r").unwrap(), Some(&b"fill"[..]));
    }

    #[test]
    fn test_del_reports_presence() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        txn.put(table, b"k", b"v", PutFlags::empty()).unwrap();
        assert!(txn.del(table, b"k", None).unwrap());
        assert!(!txn.del(table, b"k", None).unwrap());
        assert_eq!(txn.get(table, b"k").unwrap(), None);
    }

    #[test]
    fn test_compare_keys_ordering() {
        let (env, _dir) = test_env();
        let txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(None, TableFlags::empty()).unwrap();
        assert_eq!(txn.compare_keys(table, b"a", b"b"), Ordering::Less);
        assert_eq!(txn.compare_keys(table, b"b", b"a"), Ordering::Greater);
        assert_eq!(txn.compare_keys(table, b"same", b"same"), Ordering::Equal);
    }

    #[test]
    fn test_sequence_and_stat() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("seq"), TableFlags::empty()).unwrap();
        assert_eq!(txn.sequence(table, 5).unwrap(), 0);
        assert_eq!(txn.sequence(table, 0).unwrap(), 5);

        txn.put(table, b"a", b"1", PutFlags::empty()).unwrap();
        txn.put(table, b"b", b"2", PutFlags::empty()).unwrap();
        assert_eq!(txn.table_stat(table).unwrap().entries, 2);

        txn.clear_table(table).unwrap();
        assert_eq!(txn.table_stat(table).unwrap().entries, 0);
    }

    #[test]
    fn test_drop_table() {
        let (env, _dir) = test_env();
        let mut txn = env.begin_rw_txn().unwrap();
        let table = txn.create_table(Some("doomed"), TableFlags::empty()).unwrap();
        txn.drop_table(table).unwrap();
        txn.commit().unwrap();

        let txn = env.begin_ro_txn().unwrap();
        assert!(txn.open_table(Some("doomed")).is_err());
    }

    #[test]
    fn test_debug_shows_kind() {
        let (env, _dir) = test_env();
        let txn = env.begin_ro_txn().unwrap();
        assert!(format!("{:?}", txn).contains("ro"));
    }
}
