//! Engine flag bitsets and cursor operations.
//!
//! Every constant is the engine's own bit value; the boundary layer defines
//! no flags of its own and passes these through unmodified.

use mdbx_sys as ffi;

bitflags::bitflags! {
    /// Insert semantics for record and cursor puts.
    ///
    /// An empty set is the engine's plain upsert.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PutFlags: ffi::MDBX_put_flags_t {
        /// Store only if the key is not present.
        const NO_OVERWRITE = ffi::MDBX_NOOVERWRITE;
        /// Duplicate-keys tables: store only if the key/value pair is not present.
        const NO_DUP_DATA = ffi::MDBX_NODUPDATA;
        /// Replace the record at the cursor's current position.
        const CURRENT = ffi::MDBX_CURRENT;
        /// Duplicate-keys tables: replace or delete all values of the key.
        const ALL_DUPS = ffi::MDBX_ALLDUPS;
        /// Reserve space for the value; the engine hands back a writable view.
        const RESERVE = ffi::MDBX_RESERVE;
        /// Append at the end of the table; keys must arrive in order.
        const APPEND = ffi::MDBX_APPEND;
        /// Append a duplicate at the end of the key's values.
        const APPEND_DUP = ffi::MDBX_APPENDDUP;
        /// Fixed-size-duplicates bulk insert.
        const MULTIPLE = ffi::MDBX_MULTIPLE;
    }
}

impl PutFlags {
    #[inline]
    pub(crate) fn to_raw(self) -> ffi::MDBX_put_flags_t {
        self.bits()
    }
}

bitflags::bitflags! {
    /// Table (key space) configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TableFlags: ffi::MDBX_db_flags_t {
        const REVERSE_KEY = ffi::MDBX_REVERSEKEY;
        const DUP_SORT = ffi::MDBX_DUPSORT;
        const INTEGER_KEY = ffi::MDBX_INTEGERKEY;
        const DUP_FIXED = ffi::MDBX_DUPFIXED;
        const INTEGER_DUP = ffi::MDBX_INTEGERDUP;
        const REVERSE_DUP = ffi::MDBX_REVERSEDUP;
        const CREATE = ffi::MDBX_CREATE;
    }
}

impl TableFlags {
    #[inline]
    pub fn to_raw(self) -> ffi::MDBX_db_flags_t {
        self.bits()
    }
}

bitflags::bitflags! {
    /// Environment open flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EnvFlags: ffi::MDBX_env_flags_t {
        const NO_SUB_DIR = ffi::MDBX_NOSUBDIR;
        const READ_ONLY = ffi::MDBX_RDONLY;
        const EXCLUSIVE = ffi::MDBX_EXCLUSIVE;
        const WRITE_MAP = ffi::MDBX_WRITEMAP;
        const NO_READAHEAD = ffi::MDBX_NORDAHEAD;
        const NO_MEM_INIT = ffi::MDBX_NOMEMINIT;
        const LIFO_RECLAIM = ffi::MDBX_LIFORECLAIM;
        const NO_META_SYNC = ffi::MDBX_NOMETASYNC;
        const SAFE_NO_SYNC = ffi::MDBX_SAFE_NOSYNC;
        const UTTERLY_NO_SYNC = ffi::MDBX_UTTERLY_NOSYNC;
    }
}

impl EnvFlags {
    #[inline]
    pub fn to_raw(self) -> ffi::MDBX_env_flags_t {
        self.bits()
    }
}

/// Cursor positioning operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorOp {
    /// First key/value.
    First,
    /// Duplicate-keys: first value of the current key.
    FirstDup,
    /// Duplicate-keys: exact key and value.
    GetBoth,
    /// Duplicate-keys: exact key, first value >= the given value.
    GetBothRange,
    /// Key/value at the current position.
    GetCurrent,
    /// Fixed-size-duplicates: up to a page of values at the current position.
    GetMultiple,
    /// Last key/value.
    Last,
    /// Duplicate-keys: last value of the current key.
    LastDup,
    /// Next key/value.
    Next,
    /// Duplicate-keys: next value of the current key.
    NextDup,
    /// Fixed-size-duplicates: next page of values.
    NextMultiple,
    /// First value of the next key.
    NextNoDup,
    /// Previous key/value.
    Prev,
    /// Duplicate-keys: previous value of the current key.
    PrevDup,
    /// Last value of the previous key.
    PrevNoDup,
    /// Fixed-size-duplicates: previous page of values.
    PrevMultiple,
    /// Exact key; the returned key view is the input.
    Set,
    /// Exact key; the engine returns its own key view.
    SetKey,
    /// First key >= the given key.
    SetRange,
    /// First key/value pair >= the given pair.
    SetLowerBound,
}

impl CursorOp {
    pub fn to_raw(self) -> ffi::MDBX_cursor_op {
        match self {
            CursorOp::First => ffi::MDBX_FIRST,
            CursorOp::FirstDup => ffi::MDBX_FIRST_DUP,
            CursorOp::GetBoth => ffi::MDBX_GET_BOTH,
            CursorOp::GetBothRange => ffi::MDBX_GET_BOTH_RANGE,
            CursorOp::GetCurrent => ffi::MDBX_GET_CURRENT,
            CursorOp::GetMultiple => ffi::MDBX_GET_MULTIPLE,
            CursorOp::Last => ffi::MDBX_LAST,
            CursorOp::LastDup => ffi::MDBX_LAST_DUP,
            CursorOp::Next => ffi::MDBX_NEXT,
            CursorOp::NextDup => ffi::MDBX_NEXT_DUP,
            CursorOp::NextMultiple => ffi::MDBX_NEXT_MULTIPLE,
            CursorOp::NextNoDup => ffi::MDBX_NEXT_NODUP,
            CursorOp::Prev => ffi::MDBX_PREV,
            CursorOp::PrevDup => ffi::MDBX_PREV_DUP,
            CursorOp::PrevNoDup => ffi::MDBX_PREV_NODUP,
            CursorOp::PrevMultiple => ffi::MDBX_PREV_MULTIPLE,
            CursorOp::Set => ffi::MDBX_SET,
            CursorOp::SetKey => ffi::MDBX_SET_KEY,
            CursorOp::SetRange => ffi::MDBX_SET_RANGE,
            CursorOp::SetLowerBound => ffi::MDBX_SET_LOWERBOUND,
        }
    }

    /// Whether the operation reads a caller-supplied key.
    pub fn takes_key(self) -> bool {
        matches!(
            self,
            CursorOp::Set
                | CursorOp::SetKey
                | CursorOp::SetRange
                | CursorOp::SetLowerBound
                | CursorOp::GetBoth
                | CursorOp::GetBothRange
        )
    }

    /// Whether the operation also matches on a caller-supplied value.
    pub fn takes_value(self) -> bool {
        matches!(
            self,
            CursorOp::GetBoth | CursorOp::GetBothRange | CursorOp::SetLowerBound
        )
    }
}
