//! Utility functions for benchmarks.
#![allow(dead_code, unreachable_pub)]

use ordkv_cursor::{Cursor, DatabaseFlags, DbHandle, MemEngine, TxnHandle, WriteFlags};

/// Generate a DB key string for testing.
pub fn get_key(n: u32) -> String {
    format!("key{n}")
}

/// Generate a DB data string for testing.
pub fn get_data(n: u32) -> String {
    format!("data{n}")
}

/// Create an engine with one database holding `n` sequential entries.
pub fn setup_bench_db(n: u32) -> (MemEngine, TxnHandle, DbHandle) {
    let engine = MemEngine::new();
    let db = engine.create_db(DatabaseFlags::empty());
    let txn = engine.begin_txn();
    {
        let mut cursor = Cursor::open(&engine, txn, db).unwrap();
        for i in 0..n {
            cursor.put(&get_key(i), &get_data(i), WriteFlags::empty()).unwrap();
        }
    }
    (engine, txn, db)
}
