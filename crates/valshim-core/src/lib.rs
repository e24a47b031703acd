//! Valshim Core: zero-copy key/value views across the libmdbx boundary
//!
//! The engine represents every key and value as a borrowed `{pointer, length}`
//! pair into caller memory. This crate builds those views and hands them to
//! the engine's fixed operation set, one synchronous call at a time.
//!
//! # Architecture
//!
//! - **Views** ([`Val`]): borrow caller bytes for one native call; never copy
//! - **Records** ([`record`]): get / put / delete against a transaction and table
//! - **Cursors** ([`cursor`]): positioned get / put, and the fixed-stride bulk
//!   insert modelled as a [`MultiValue`] request, read back a page at a time
//!   as a [`MultiPage`]
//! - **Comparators** ([`compare`]): the table's effective key and value ordering
//! - **Callbacks** ([`callback`]): engine string callbacks routed to registered
//!   handlers by integer handle
//!
//! # Pass-through
//!
//! The layer holds no state beyond the callback registry. Every operation
//! returns the engine's [`Status`] unmodified; interpreting it, and owning the
//! environment, transactions and cursors, is the caller's job
//! (see the `valshim-env` crate).

pub mod callback;
pub mod compare;
pub mod cursor;
pub mod flags;
pub mod record;
pub mod status;
pub mod val;

#[cfg(test)]
mod test_env;

// Re-export the engine bindings so callers name the same handle types
pub use mdbx_sys as ffi;

pub use callback::{register, Registration};
pub use compare::Comparator;
pub use cursor::{CursorGet, MultiPage, MultiValue};
pub use flags::{CursorOp, EnvFlags, PutFlags, TableFlags};
pub use status::Status;
pub use val::Val;
