//! Valshim environment handles
//!
//! Owning wrappers over the engine's environment, transaction and cursor
//! objects, built on the `valshim-core` boundary layer.
//!
//! # Architecture
//!
//! - [`Environment`] opens the storage file with a [`Config`] and closes it
//!   on drop
//! - [`Transaction`] is either [`RO`] or [`RW`]; reads return slices that
//!   borrow the transaction, writes need `&mut`
//! - [`Cursor`] walks a table and reads fixed-size duplicates a page at a
//!   time; [`CursorMut`] adds put, delete and the fixed-stride bulk insert
//!
//! Engine failures surface as [`Error::Engine`] carrying the native
//! [`Status`]. NOT_FOUND on a lookup is `Ok(None)`, not an error.

pub mod config;
pub mod cursor;
pub mod env;
pub mod error;
pub mod txn;

pub use config::Config;
pub use cursor::{Cursor, CursorMut, Pair};
pub use env::{Environment, Stat};
pub use error::{Error, Result};
pub use txn::{Table, Transaction, TransactionKind, RO, RW};

pub use valshim_core::{Comparator, CursorOp, EnvFlags, MultiPage, PutFlags, Status, TableFlags};
