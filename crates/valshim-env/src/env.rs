//! Environment handle: owns the memory-mapped storage file.
//!
//! Opening applies the [`Config`] (table and reader limits, geometry)
//! before the file is mapped. Dropping the handle closes the environment;
//! the borrow checker keeps every transaction from outliving it.

use std::ffi::CString;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::ptr;

use libc::{c_int, c_void};
use valshim_core::{callback, ffi, Status};

use crate::config::{Config, DEFAULT_GEOMETRY};
use crate::error::{check, Error, Result};
use crate::txn::{Transaction, RO, RW};

/// Page and record counts for a table or the whole environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub page_size: u32,
    pub depth: u32,
    pub branch_pages: u64,
    pub leaf_pages: u64,
    pub entries: u64,
}

impl From<ffi::MDBX_stat> for Stat {
    fn from(raw: ffi::MDBX_stat) -> Self {
        Stat {
            page_size: raw.ms_psize as u32,
            depth: raw.ms_depth as u32,
            branch_pages: raw.ms_branch_pages as u64,
            leaf_pages: raw.ms_leaf_pages as u64,
            entries: raw.ms_entries as u64,
        }
    }
}

/// An open storage environment.
///
/// The engine's environment object is safe to share across threads;
/// transactions are not, and stay on the thread that began them.
pub struct Environment {
    env: *mut ffi::MDBX_env,
    path: PathBuf,
}

// SAFETY: MDBX_env is internally synchronized. Per-thread objects
// (transactions, cursors) borrow it and are neither Send nor Sync.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl Environment {
    /// Open or create an environment at the given directory.
    pub fn open<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let path = path.as_ref().to_path_buf();
        let c_path = path_to_cstring(&path)?;

        let mut raw: *mut ffi::MDBX_env = ptr::null_mut();
        check("mdbx_env_create", unsafe { ffi::mdbx_env_create(&mut raw) })?;
        // From here on Drop releases the handle on any early return.
        let env = Environment { env: raw, path };

        unsafe {
            check(
                "mdbx_env_set_option",
                ffi::mdbx_env_set_option(env.env, ffi::MDBX_opt_max_db, config.max_tables),
            )?;
            check(
                "mdbx_env_set_option",
                ffi::mdbx_env_set_option(env.env, ffi::MDBX_opt_max_readers, config.max_readers),
            )?;
            check(
                "mdbx_env_set_geometry",
                ffi::mdbx_env_set_geometry(
                    env.env,
                    config.size_lower,
                    DEFAULT_GEOMETRY,
                    config.size_upper,
                    config.growth_step,
                    config.shrink_threshold,
                    config.page_size,
                ),
            )?;
            check(
                "mdbx_env_open",
                ffi::mdbx_env_open(
                    env.env,
                    c_path.as_ptr(),
                    config.flags.to_raw(),
                    config.file_mode as ffi::mdbx_mode_t,
                ),
            )?;
        }

        tracing::debug!(path = %env.path.display(), max_tables = config.max_tables, "opened environment");
        Ok(env)
    }

    /// Directory (or file, with `NO_SUB_DIR`) this environment maps.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw engine handle, for calling the boundary layer directly.
    pub fn raw(&self) -> *mut ffi::MDBX_env {
        self.env
    }

    /// Begin a read-only transaction on the calling thread.
    pub fn begin_ro_txn(&self) -> Result<Transaction<'_, RO>> {
        Transaction::begin(self)
    }

    /// Begin the read-write transaction. Blocks while another writer is active.
    pub fn begin_rw_txn(&self) -> Result<Transaction<'_, RW>> {
        Transaction::begin(self)
    }

    /// Statistics for the whole environment.
    pub fn stat(&self) -> Result<Stat> {
        unsafe {
            let mut raw: ffi::MDBX_stat = mem::zeroed();
            check(
                "mdbx_env_stat_ex",
                ffi::mdbx_env_stat_ex(self.env, ptr::null(), &mut raw, mem::size_of::<ffi::MDBX_stat>()),
            )?;
            Ok(raw.into())
        }
    }

    /// Flush buffers to disk. `force` syncs even if the flags say otherwise.
    pub fn sync(&self, force: bool) -> Result<()> {
        let rc = unsafe { ffi::mdbx_env_sync_ex(self.env, force, false) };
        // RESULT_TRUE: nothing needed flushing
        if rc == Status::RESULT_TRUE.code() {
            return Ok(());
        }
        check("mdbx_env_sync_ex", rc)
    }

    /// Clear stale reader slots left by dead processes; returns how many.
    pub fn reader_check(&self) -> Result<usize> {
        let mut dead: c_int = 0;
        let rc = unsafe { ffi::mdbx_reader_check(self.env, &mut dead) };
        if rc != Status::RESULT_TRUE.code() {
            check("mdbx_reader_check", rc)?;
        }
        Ok(dead.max(0) as usize)
    }

    /// Enumerate reader slots, one text line per slot, through `handler`.
    ///
    /// The handler is registered with the callback bridge for the duration
    /// of the call; its non-zero return stops the enumeration. The engine's
    /// status comes back as-is: success, RESULT_TRUE for an empty reader
    /// table, or the code the handler stopped with.
    pub fn reader_list<F>(&self, handler: F) -> Status
    where
        F: FnMut(&str) -> c_int + Send + 'static,
    {
        let registration = callback::register(handler);
        let rc = unsafe { ffi::mdbx_reader_list(self.env, Some(reader_line_proxy), registration.context()) };
        Status::from_raw(rc)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let rc = unsafe { ffi::mdbx_env_close_ex(self.env, false) };
        if rc != 0 {
            tracing::warn!(path = %self.path.display(), status = %Status::from_raw(rc), "environment close failed");
        } else {
            tracing::debug!(path = %self.path.display(), "closed environment");
        }
    }
}

/// Adapts the engine's per-slot reader callback onto the string callback
/// bridge: each slot becomes one line.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn reader_line_proxy(
    ctx: *mut c_void,
    num: c_int,
    slot: c_int,
    pid: ffi::mdbx_pid_t,
    thread: ffi::mdbx_tid_t,
    txnid: u64,
    lag: u64,
    bytes_used: usize,
    bytes_retained: usize,
) -> c_int {
    let line = format!(
        "{} slot={} pid={} thread={:?} txnid={} lag={} used={} retained={}",
        num, slot, pid, thread, txnid, lag, bytes_used, bytes_retained
    );
    let Ok(line) = CString::new(line) else {
        return callback::UNKNOWN_HANDLE;
    };
    callback::msg_func_proxy(line.as_ptr(), ctx)
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    Ok(CString::new(path.to_string_lossy().into_owned())?)
}
