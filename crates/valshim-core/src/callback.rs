//! Callback bridge: engine-driven string callbacks routed to registered
//! handlers through an integer context handle.
//!
//! The engine only ever sees the integer. Handlers live in a process-wide
//! registry keyed by that integer, so nothing the engine holds can dangle
//! or move underneath it. Handle 0 is never issued and means "no callback".
//!
//! Faults stay on this side of the boundary: an unknown handle, a
//! re-entered handler or a panicking handler turns into a defined non-zero
//! status.

use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use libc::{c_char, c_int, c_void};
use mdbx_sys as ffi;
use parking_lot::Mutex;

/// Returned to the engine when the context handle has no registered handler.
pub const UNKNOWN_HANDLE: c_int = ffi::MDBX_EINVAL;

/// Returned to the engine when the handler panicked.
pub const HANDLER_PANICKED: c_int = ffi::MDBX_PROBLEM;

/// Returned to the engine when the handler is already running further up
/// the call stack (it re-entered its own handle).
pub const HANDLER_BUSY: c_int = ffi::MDBX_BUSY;

type Handler = Arc<Mutex<Box<dyn FnMut(&str) -> c_int + Send>>>;

struct Registry {
    next: AtomicUsize,
    handlers: Mutex<HashMap<usize, Handler>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        next: AtomicUsize::new(1),
        handlers: Mutex::new(HashMap::new()),
    })
}

/// A live handler registration. Dropping it unregisters the handler.
#[derive(Debug)]
pub struct Registration {
    handle: usize,
}

impl Registration {
    /// The integer handle the engine is given.
    #[inline]
    pub fn handle(&self) -> usize {
        self.handle
    }

    /// The handle encoded as the engine's opaque context pointer. It is
    /// never dereferenced.
    #[inline]
    pub fn context(&self) -> *mut c_void {
        self.handle as *mut c_void
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        registry().handlers.lock().remove(&self.handle);
    }
}

/// Register `handler` and get its handle.
///
/// The handler receives each message and returns the code forwarded to the
/// engine; non-zero asks the engine to stop.
pub fn register<F>(handler: F) -> Registration
where
    F: FnMut(&str) -> c_int + Send + 'static,
{
    let reg = registry();
    let handle = reg.next.fetch_add(1, Ordering::Relaxed);
    let handler: Handler = Arc::new(Mutex::new(Box::new(handler)));
    reg.handlers.lock().insert(handle, handler);
    Registration { handle }
}

/// Route `msg` to the handler registered under `handle`.
pub fn dispatch(msg: &CStr, handle: usize) -> c_int {
    // Release the registry lock before the handler runs.
    let handler = match registry().handlers.lock().get(&handle) {
        Some(handler) => Arc::clone(handler),
        None => {
            tracing::warn!(handle, "callback for unregistered handle");
            return UNKNOWN_HANDLE;
        }
    };

    let text = msg.to_string_lossy();
    let Some(mut guard) = handler.try_lock() else {
        tracing::warn!(handle, "callback handler re-entered");
        return HANDLER_BUSY;
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let handler = &mut *guard;
        handler(&*text)
    }));
    match result {
        Ok(code) => code,
        Err(_) => {
            tracing::error!(handle, "callback handler panicked");
            HANDLER_PANICKED
        }
    }
}

/// Native entrypoint: `int (*)(const char *msg, void *ctx)`.
///
/// `ctx` carries a handle from [`Registration::context`]. A null `msg`
/// is delivered as an empty string.
///
/// # Safety
/// `msg` must be null or point to a NUL-terminated string valid for the
/// duration of the call.
pub unsafe extern "C" fn msg_func_proxy(msg: *const c_char, ctx: *mut c_void) -> c_int {
    let msg = if msg.is_null() {
        CStr::from_bytes_with_nul_unchecked(b"\0")
    } else {
        CStr::from_ptr(msg)
    };
    dispatch(msg, ctx as usize)
}
