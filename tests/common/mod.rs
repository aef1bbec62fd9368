//! Shared test fixtures: an in-memory engine with a database ready for
//! cursors.
#![allow(dead_code)]

use ordkv_cursor::{
    Cursor, CursorResult, DatabaseFlags, DbHandle, MemEngine, TxnHandle, WriteFlags,
};

/// A fresh engine with one database created under `flags`.
pub fn setup(flags: DatabaseFlags) -> (MemEngine, TxnHandle, DbHandle) {
    let engine = MemEngine::new();
    let db = engine.create_db(flags);
    let txn = engine.begin_txn();
    (engine, txn, db)
}

/// Writes `pairs` through a scratch cursor.
pub fn populate(
    engine: &MemEngine,
    txn: TxnHandle,
    db: DbHandle,
    pairs: &[(&[u8], &[u8])],
) -> CursorResult<()> {
    let mut cursor = Cursor::open(engine, txn, db)?;
    for (key, value) in pairs {
        cursor.put_raw(key, Some(value), WriteFlags::empty())?;
    }
    Ok(())
}
