//! Scratch engine environments for the boundary layer's own tests.

use std::ffi::CString;
use std::ptr;

use mdbx_sys as ffi;
use tempfile::TempDir;

use crate::flags::TableFlags;

pub(crate) struct TestEnv {
    pub env: *mut ffi::MDBX_env,
    _dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = CString::new(dir.path().to_str().unwrap()).unwrap();
        let mut env: *mut ffi::MDBX_env = ptr::null_mut();
        unsafe {
            assert_eq!(ffi::mdbx_env_create(&mut env), 0);
            assert_eq!(ffi::mdbx_env_set_option(env, ffi::MDBX_opt_max_db, 8), 0);
            assert_eq!(
                ffi::mdbx_env_set_geometry(env, -1, -1, 64 * 1024 * 1024, -1, -1, -1),
                0
            );
            assert_eq!(ffi::mdbx_env_open(env, path.as_ptr(), 0, 0o644), 0);
        }
        Self { env, _dir: dir }
    }

    pub fn begin_rw(&self) -> *mut ffi::MDBX_txn {
        self.begin(ffi::MDBX_TXN_READWRITE)
    }

    pub fn begin_ro(&self) -> *mut ffi::MDBX_txn {
        self.begin(ffi::MDBX_TXN_RDONLY)
    }

    fn begin(&self, flags: ffi::MDBX_txn_flags_t) -> *mut ffi::MDBX_txn {
        let mut txn: *mut ffi::MDBX_txn = ptr::null_mut();
        let rc = unsafe {
            ffi::mdbx_txn_begin_ex(self.env, ptr::null_mut(), flags, &mut txn, ptr::null_mut())
        };
        assert_eq!(rc, 0);
        txn
    }

    pub fn open_table(&self, txn: *mut ffi::MDBX_txn, name: &str, flags: TableFlags) -> ffi::MDBX_dbi {
        let name = CString::new(name).unwrap();
        let mut dbi: ffi::MDBX_dbi = 0;
        let rc = unsafe {
            ffi::mdbx_dbi_open(txn, name.as_ptr(), (flags | TableFlags::CREATE).to_raw(), &mut dbi)
        };
        assert_eq!(rc, 0);
        dbi
    }

    pub fn open_cursor(&self, txn: *mut ffi::MDBX_txn, dbi: ffi::MDBX_dbi) -> *mut ffi::MDBX_cursor {
        let mut cursor: *mut ffi::MDBX_cursor = ptr::null_mut();
        assert_eq!(unsafe { ffi::mdbx_cursor_open(txn, dbi, &mut cursor) }, 0);
        cursor
    }

    pub fn commit(&self, txn: *mut ffi::MDBX_txn) {
        assert_eq!(unsafe { ffi::mdbx_txn_commit_ex(txn, ptr::null_mut()) }, 0);
    }

    pub fn abort(&self, txn: *mut ffi::MDBX_txn) {
        unsafe {
            ffi::mdbx_txn_abort(txn);
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        unsafe {
            ffi::mdbx_env_close_ex(self.env, false);
        }
    }
}
