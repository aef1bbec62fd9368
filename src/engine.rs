//! The engine contract consumed by the cursor layer.
//!
//! The storage engine itself (B-tree layout, MVCC, durability) is an external
//! collaborator. This module defines the handle-based surface the cursor
//! layer calls into: buffer descriptors, opaque resource tokens, the closed
//! positioning vocabulary, and the numeric status codes the engine reports.

use crate::flags::WriteFlags;
use std::{ffi::c_void, fmt, ptr, slice};

/// Engine status codes.
///
/// `SUCCESS` and `NOT_FOUND` are the two non-error outcomes; every other
/// code surfaces as [`CursorError::Engine`](crate::CursorError::Engine).
pub mod status {
    /// The operation completed.
    pub const SUCCESS: i32 = 0;
    /// No record matches. An expected outcome, never an error.
    pub const NOT_FOUND: i32 = -30798;
    /// The key (or key/value pair) already exists and the write flags forbid
    /// overwriting it.
    pub const KEY_EXIST: i32 = -30799;
    /// The operation is not supported by the database's configuration, e.g.
    /// a duplicate count on a database without sorted duplicates.
    pub const INCOMPATIBLE: i32 = -30784;
    /// The cursor is not positioned at a record.
    pub const NO_DATA: i32 = -30780;
    /// An append-mode write supplied a key that sorts before the last key.
    pub const KEY_MISMATCH: i32 = -30418;
    /// The supplied handle does not name a live resource.
    pub const BAD_HANDLE: i32 = -30787;
    /// A required argument was missing or malformed.
    pub const EINVAL: i32 = 22;
}

/// A buffer descriptor: an `(address, length)` view over a byte region.
///
/// A null `base` is the "no data" sentinel and is distinct from a non-null
/// zero-length descriptor. Ownership is positional: descriptors built by the
/// cursor layer point at caller-owned marshal buffers; descriptors rewritten
/// by the engine point at engine-owned memory that stays valid only until the
/// next operation on the same cursor, and must never be freed here.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct RawVal {
    /// Start of the byte region, or null.
    pub base: *mut c_void,
    /// Length of the byte region in bytes.
    pub len: usize,
}

impl RawVal {
    /// The null descriptor.
    pub const fn null() -> Self {
        Self { base: ptr::null_mut(), len: 0 }
    }

    /// Whether this is the null descriptor.
    pub const fn is_null(&self) -> bool {
        self.base.is_null()
    }

    /// Views the described region as a byte slice, or `None` for the null
    /// descriptor.
    ///
    /// # Safety
    ///
    /// A non-null `base` must point at `len` readable bytes that outlive
    /// `'a`. For engine-rewritten descriptors that means no intervening
    /// operation on the owning cursor.
    pub unsafe fn as_slice<'a>(&self) -> Option<&'a [u8]> {
        if self.is_null() {
            return None;
        }
        // SAFETY: non-null per the check above; validity is the caller's
        // contract.
        Some(unsafe { slice::from_raw_parts(self.base as *const u8, self.len) })
    }
}

impl fmt::Debug for RawVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawVal").field("base", &self.base).field("len", &self.len).finish()
    }
}

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw engine token.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw engine token.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle! {
    /// Opaque token for a live transaction. The cursor layer never owns the
    /// transaction; the token is a back-reference whose liveness is the
    /// caller's contract.
    TxnHandle
}

handle! {
    /// Opaque token for an opened database within a transaction's
    /// environment.
    DbHandle
}

handle! {
    /// Opaque token for an open engine cursor. Owned by exactly one
    /// [`Cursor`](crate::Cursor) and released exactly once.
    CursorHandle
}

/// How the engine interprets the key/value descriptors of a positioned read.
///
/// This is the engine-defined vocabulary; it is closed and not
/// user-extensible. Variants that mention duplicates require a database
/// opened with [`DatabaseFlags::DUP_SORT`](crate::DatabaseFlags::DUP_SORT);
/// using them elsewhere yields [`status::INCOMPATIBLE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CursorOp {
    /// Position at the first record.
    First = 0,
    /// Position at the first duplicate of the current key.
    FirstDup = 1,
    /// Position at the exact key/value pair.
    GetBoth = 2,
    /// Position at the given key, at the first duplicate >= the given value.
    GetBothRange = 3,
    /// Read the record at the current position without moving.
    GetCurrent = 4,
    /// Position at the last record.
    Last = 5,
    /// Position at the last duplicate of the current key.
    LastDup = 6,
    /// Position at the next record.
    Next = 7,
    /// Position at the next duplicate of the current key.
    NextDup = 8,
    /// Position at the first duplicate of the next key.
    NextNoDup = 9,
    /// Position at the previous record.
    Prev = 10,
    /// Position at the previous duplicate of the current key.
    PrevDup = 11,
    /// Position at the last duplicate of the previous key.
    PrevNoDup = 12,
    /// Position at the record matching the given key exactly.
    Set = 13,
    /// Like [`Self::Set`], but also report the stored key.
    SetKey = 14,
    /// Position at the smallest record whose key is >= the given key.
    SetRange = 15,
}

/// The cursor surface of the storage engine.
///
/// The cursor layer treats implementations as opaque: it forwards operation
/// codes and buffer descriptors, and interprets nothing but the returned
/// status. Implementations must uphold the descriptor ownership contract of
/// [`RawVal`]: memory they install in a descriptor stays valid until the next
/// operation on the same cursor, and they never free caller-supplied memory.
pub trait Engine {
    /// Opens a cursor over `db` within the live transaction `txn`.
    fn cursor_open(&self, txn: TxnHandle, db: DbHandle) -> Result<CursorHandle, i32>;

    /// Releases an open cursor. Closing is infallible from the caller's
    /// perspective; a stale handle is ignored.
    fn cursor_close(&self, cursor: CursorHandle);

    /// Positioned read. `key` and `value` are in-out descriptors: inputs for
    /// keyed operations, rewritten to the record the cursor landed on.
    ///
    /// # Safety
    ///
    /// Non-null input descriptors must point at readable memory of the
    /// declared length for the duration of the call.
    unsafe fn cursor_get(
        &self,
        cursor: CursorHandle,
        key: &mut RawVal,
        value: &mut RawVal,
        op: CursorOp,
    ) -> i32;

    /// Positioned write. On success the cursor points at the written record;
    /// on failure it is usually near it.
    ///
    /// # Safety
    ///
    /// Non-null descriptors must point at readable memory of the declared
    /// length for the duration of the call.
    unsafe fn cursor_put(
        &self,
        cursor: CursorHandle,
        key: RawVal,
        value: RawVal,
        flags: WriteFlags,
    ) -> i32;

    /// Deletes the record at the current position.
    /// [`WriteFlags::ALL_DUPS`] removes every duplicate of the current key.
    fn cursor_del(&self, cursor: CursorHandle, flags: WriteFlags) -> i32;

    /// Number of duplicate values stored under the current key.
    fn cursor_count(&self, cursor: CursorHandle) -> Result<u64, i32>;

    /// Human-readable description of a status code.
    fn message(&self, code: i32) -> String;
}
