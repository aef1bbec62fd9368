//! Typed, memory-safe cursors over ordered key-value engines.
//!
//! # Overview
//!
//! Embedded ordered stores in the LMDB family expose cursors through a
//! byte-oriented, handle-based C-style API: positioning operation codes,
//! `(address, length)` buffer descriptors, and numeric status codes that mix
//! "nothing there" with real failures. This crate is the safe layer on top:
//!
//! - Navigating and mutating the records of one database within one
//!   transaction through a [`Cursor`]: absolute moves (`first`, `last`),
//!   relative moves (`next`, `prev`, and their duplicate-aware variants),
//!   keyed seeks (`set`, `set_key`, `set_range`), and reads at the current
//!   position.
//! - Typed access via the [`Encodable`] and [`Decodable`] traits, so keys
//!   and values cross the boundary as ordinary Rust types.
//! - Scoped marshal buffers that are released on every exit path, and
//!   copy-out handling of engine-owned memory.
//! - The engine's not-found sentinel reported as typed absence
//!   (`Ok(None)`), distinct from engine errors and from usage errors in the
//!   calling code.
//!
//! The storage engine itself is a collaborator, not part of this crate: any
//! implementation of the [`Engine`] trait will do. [`MemEngine`] ships as an
//! ordered in-memory reference engine and backs the crate's own tests.
//!
//! # Quick Start
//!
//! ```
//! use ordkv_cursor::{Cursor, CursorResult, DatabaseFlags, MemEngine, WriteFlags};
//!
//! fn main() -> CursorResult<()> {
//!     let engine = MemEngine::new();
//!     let db = engine.create_db(DatabaseFlags::empty());
//!     let txn = engine.begin_txn();
//!
//!     let mut cursor = Cursor::open(&engine, txn, db)?;
//!     cursor.put(b"hello", b"world", WriteFlags::empty())?;
//!
//!     let value: Option<Vec<u8>> = cursor.set(b"hello".as_slice())?;
//!     assert_eq!(value.as_deref(), Some(b"world".as_slice()));
//!
//!     cursor.close();
//!     Ok(())
//! }
//! ```
//!
//! # Key Concepts
//!
//! - [`Engine`] - The handle-based cursor surface a storage engine must
//!   provide. Handles are opaque tokens; buffers cross as [`RawVal`]
//!   descriptors; outcomes are numeric status codes.
//! - [`Cursor`] - One live traversal context for one (transaction, database)
//!   pair. Owns its engine cursor handle and nothing else; enforces the
//!   close-once protocol.
//! - [`CursorOp`] - The closed positioning vocabulary the engine interprets.
//! - [`Encodable`] / [`Decodable`] - Static codec capabilities. A type
//!   without a codec fails to compile; there is no runtime registry to
//!   misconfigure.
//!
//! # Error Model
//!
//! Expected absence is a value: positioned reads return `Ok(None)` when the
//! engine reports its not-found sentinel. [`CursorError`] covers everything
//! else and keeps three situations apart: the engine rejected the operation
//! (`Engine`), the calling code or its codecs are wrong (`Closed`,
//! `DecodeLenDiff`, `Codec` - see [`CursorError::is_usage`]), and native
//! allocation failed (`Alloc`). This layer never retries; retry policy
//! belongs to whoever owns the transaction.
//!
//! # Ownership
//!
//! A cursor references, but never owns, its transaction and database:
//! closing or dropping a cursor releases only the engine cursor handle.
//! A cursor must not outlive its transaction; for write transactions the
//! engine's single-writer rule additionally means cursors of one write
//! transaction must be used from one thread at a time.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

pub mod buffer;
pub use buffer::live_allocations;

pub mod codec;
pub use codec::{Decodable, Encodable, Encoded, ObjectLength};

mod cursor;
pub use cursor::{Cursor, Entry};

pub mod engine;
pub use engine::{CursorHandle, CursorOp, DbHandle, Engine, RawVal, TxnHandle};

mod error;
pub use error::{CursorError, CursorResult};

mod flags;
pub use flags::{DatabaseFlags, WriteFlags};

pub mod iter;
pub use iter::Iter;

pub mod mem;
pub use mem::MemEngine;
