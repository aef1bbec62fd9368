#![allow(missing_docs)]
mod common;

use common::{populate, setup};
use ordkv_cursor::{
    Cursor, CursorError, CursorOp, CursorResult, DatabaseFlags, Entry, ObjectLength, WriteFlags,
    engine::status,
};

/// Convenience
type Result<T> = CursorResult<T>;

#[test]
fn test_get() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());

    assert_eq!(None, Cursor::open(&engine, txn, db).unwrap().first::<(), ()>().unwrap());

    populate(&engine, txn, db, &[(b"key1", b"val1"), (b"key2", b"val2"), (b"key3", b"val3")])
        .unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    assert_eq!(cursor.first().unwrap(), Some((*b"key1", *b"val1")));
    assert_eq!(cursor.get_current().unwrap(), Some((*b"key1", *b"val1")));
    assert_eq!(cursor.next().unwrap(), Some((*b"key2", *b"val2")));
    assert_eq!(cursor.prev().unwrap(), Some((*b"key1", *b"val1")));
    assert_eq!(cursor.last().unwrap(), Some((*b"key3", *b"val3")));
    assert_eq!(cursor.set(b"key1").unwrap(), Some(*b"val1"));
    assert_eq!(cursor.set_key(b"key3").unwrap(), Some((*b"key3", *b"val3")));
    assert_eq!(cursor.set_range(b"key2\0").unwrap(), Some((*b"key3", *b"val3")));
    assert_eq!(cursor.set::<_, ()>(b"key6").unwrap(), None);
    assert_eq!(cursor.set_range::<_, (), ()>(b"key6").unwrap(), None);
}

#[test]
fn test_get_dup() {
    let (engine, txn, db) = setup(DatabaseFlags::DUP_SORT);
    populate(
        &engine,
        txn,
        db,
        &[
            (b"key1", b"val1"),
            (b"key1", b"val2"),
            (b"key1", b"val3"),
            (b"key2", b"val1"),
            (b"key2", b"val2"),
            (b"key2", b"val3"),
        ],
    )
    .unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    assert_eq!(cursor.first().unwrap(), Some((*b"key1", *b"val1")));
    assert_eq!(cursor.first_dup().unwrap(), Some(*b"val1"));
    assert_eq!(cursor.get_current().unwrap(), Some((*b"key1", *b"val1")));
    assert_eq!(cursor.next_nodup().unwrap(), Some((*b"key2", *b"val1")));
    assert_eq!(cursor.next().unwrap(), Some((*b"key2", *b"val2")));
    assert_eq!(cursor.prev().unwrap(), Some((*b"key2", *b"val1")));
    assert_eq!(cursor.next_dup().unwrap(), Some((*b"key2", *b"val2")));
    assert_eq!(cursor.next_dup().unwrap(), Some((*b"key2", *b"val3")));
    assert_eq!(cursor.next_dup::<(), ()>().unwrap(), None);
    assert_eq!(cursor.prev_dup().unwrap(), Some((*b"key2", *b"val2")));
    assert_eq!(cursor.last_dup().unwrap(), Some(*b"val3"));
    assert_eq!(cursor.prev_nodup().unwrap(), Some((*b"key1", *b"val3")));
    assert_eq!(cursor.set(b"key1").unwrap(), Some(*b"val1"));
    assert_eq!(cursor.set(b"key2").unwrap(), Some(*b"val1"));
    assert_eq!(cursor.set_range(b"key1\0").unwrap(), Some((*b"key2", *b"val1")));
    assert_eq!(cursor.get_both(b"key1", b"val3").unwrap(), Some(*b"val3"));
    assert_eq!(cursor.get_both_range::<_, _, ()>(b"key1", b"val4").unwrap(), None);
    assert_eq!(cursor.get_both_range(b"key2", b"val").unwrap(), Some(*b"val1"));

    assert_eq!(cursor.last().unwrap(), Some((*b"key2", *b"val3")));
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.last().unwrap(), Some((*b"key2", *b"val2")));
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.last().unwrap(), Some((*b"key2", *b"val1")));
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.last().unwrap(), Some((*b"key1", *b"val3")));
}

#[test]
fn test_count() {
    let (engine, txn, db) = setup(DatabaseFlags::DUP_SORT);
    populate(
        &engine,
        txn,
        db,
        &[(b"key1", b"val1"), (b"key1", b"val2"), (b"key1", b"val3"), (b"key2", b"val1")],
    )
    .unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // Unpositioned count is an engine error, not a default.
    assert_eq!(cursor.count().unwrap_err().engine_code(), Some(status::NO_DATA));

    cursor.set::<_, ()>(b"key1").unwrap();
    assert_eq!(cursor.count().unwrap(), 3);
    cursor.set::<_, ()>(b"key2").unwrap();
    assert_eq!(cursor.count().unwrap(), 1);
}

#[test]
fn test_count_requires_dup_sort() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    populate(&engine, txn, db, &[(b"key1", b"val1")]).unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    cursor.set::<_, ()>(b"key1").unwrap();

    let err = cursor.count().unwrap_err();
    assert_eq!(err.engine_code(), Some(status::INCOMPATIBLE));
    assert!(!err.is_usage());
}

#[test]
fn test_delete_then_get_current() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    populate(&engine, txn, db, &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]).unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // Deleting the middle record leaves the cursor on its successor.
    cursor.set::<_, ()>(b"b").unwrap();
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.get_current().unwrap(), Some((*b"c", *b"3")));
    assert_eq!(cursor.next::<(), ()>().unwrap(), None);

    // Deleting the last record leaves nothing at the position.
    cursor.set::<_, ()>(b"c").unwrap();
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.get_current::<(), ()>().unwrap(), None);

    // Relative moves still work after deletes.
    assert_eq!(cursor.prev().unwrap(), Some((*b"a", *b"1")));
}

#[test]
fn test_delete_duplicates() {
    let (engine, txn, db) = setup(DatabaseFlags::DUP_SORT);
    populate(
        &engine,
        txn,
        db,
        &[(b"key1", b"val1"), (b"key1", b"val2"), (b"key1", b"val3"), (b"key2", b"val9")],
    )
    .unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // Deleting one duplicate slides the next one into the position.
    cursor.get_both::<_, _, ()>(b"key1", b"val2").unwrap();
    cursor.del(WriteFlags::empty()).unwrap();
    assert_eq!(cursor.get_current().unwrap(), Some((*b"key1", *b"val3")));
    assert_eq!(cursor.count().unwrap(), 2);

    // ALL_DUPS removes the whole key.
    cursor.set::<_, ()>(b"key1").unwrap();
    cursor.del(WriteFlags::ALL_DUPS).unwrap();
    assert_eq!(cursor.get_current().unwrap(), Some((*b"key2", *b"val9")));
    assert_eq!(engine.record_count(db), 1);
}

#[test]
fn test_put_flags() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    cursor.put(b"key1", b"val1", WriteFlags::empty()).unwrap();
    let err = cursor.put(b"key1", b"other", WriteFlags::NO_OVERWRITE).unwrap_err();
    assert_eq!(err.engine_code(), Some(status::KEY_EXIST));
    // The failed put did not disturb the stored value.
    assert_eq!(cursor.set(b"key1").unwrap(), Some(*b"val1"));

    // Default put overwrites.
    cursor.put(b"key1", b"val2", WriteFlags::empty()).unwrap();
    assert_eq!(cursor.set(b"key1").unwrap(), Some(*b"val2"));

    // Replace at the current position.
    cursor.put(b"key1", b"val3", WriteFlags::CURRENT).unwrap();
    assert_eq!(cursor.get_current().unwrap(), Some((*b"key1", *b"val3")));

    // Append refuses keys that sort before the current end.
    cursor.put(b"key5", b"val5", WriteFlags::APPEND).unwrap();
    let err = cursor.put(b"key0", b"val0", WriteFlags::APPEND).unwrap_err();
    assert_eq!(err.engine_code(), Some(status::KEY_MISMATCH));
}

#[test]
fn test_put_no_dup_data() {
    let (engine, txn, db) = setup(DatabaseFlags::DUP_SORT);
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    cursor.put(b"key1", b"val1", WriteFlags::empty()).unwrap();
    cursor.put(b"key1", b"val2", WriteFlags::empty()).unwrap();
    let err = cursor.put(b"key1", b"val1", WriteFlags::NO_DUP_DATA).unwrap_err();
    assert_eq!(err.engine_code(), Some(status::KEY_EXIST));
    cursor.put(b"key1", b"val3", WriteFlags::NO_DUP_DATA).unwrap();
    assert_eq!(cursor.count().unwrap(), 3);
}

#[test]
fn test_ordering_scenario() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // Inserted out of order; traversal comes back sorted.
    cursor.put(b"b", b"2", WriteFlags::empty()).unwrap();
    cursor.put(b"a", b"1", WriteFlags::empty()).unwrap();

    assert_eq!(cursor.first().unwrap(), Some((*b"a", *b"1")));
    assert_eq!(cursor.next().unwrap(), Some((*b"b", *b"2")));
    assert_eq!(cursor.next::<(), ()>().unwrap(), None);
}

#[test]
fn test_seek_on_empty_database() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    assert_eq!(cursor.set::<_, ()>(b"anything").unwrap(), None);
    assert_eq!(cursor.set_range::<_, (), ()>(b"anything").unwrap(), None);
    assert_eq!(cursor.first::<(), ()>().unwrap(), None);
    assert_eq!(cursor.last::<(), ()>().unwrap(), None);
}

#[test]
fn test_close_is_idempotent_and_terminal() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    populate(&engine, txn, db, &[(b"key1", b"val1")]).unwrap();
    assert_eq!(engine.open_cursors(), 0);

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    assert_eq!(engine.open_cursors(), 1);
    assert!(!cursor.is_closed());

    cursor.close();
    assert!(cursor.is_closed());
    assert_eq!(engine.open_cursors(), 0);

    // Closed cursors never reach the engine again.
    assert_eq!(cursor.first::<(), ()>().unwrap_err(), CursorError::Closed);
    assert_eq!(cursor.put(b"k", b"v", WriteFlags::empty()).unwrap_err(), CursorError::Closed);
    assert_eq!(cursor.del(WriteFlags::empty()).unwrap_err(), CursorError::Closed);
    assert_eq!(cursor.count().unwrap_err(), CursorError::Closed);
    assert!(CursorError::Closed.is_usage());

    // A second close is a no-op, and so is the drop that follows.
    cursor.close();
    drop(cursor);
    assert_eq!(engine.open_cursors(), 0);
}

#[test]
fn test_drop_closes() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    {
        let _cursor = Cursor::open(&engine, txn, db).unwrap();
        assert_eq!(engine.open_cursors(), 1);
    }
    assert_eq!(engine.open_cursors(), 0);
}

#[test]
fn test_typed_round_trip() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    cursor.put(&10u64, &"ten".to_owned(), WriteFlags::empty()).unwrap();
    cursor.put(&2u64, &"two".to_owned(), WriteFlags::empty()).unwrap();
    cursor.put(&1u64, &"one".to_owned(), WriteFlags::empty()).unwrap();

    assert_eq!(cursor.set(&2u64).unwrap(), Some("two".to_owned()));

    // Big-endian keys keep numeric order under byte comparison.
    let keys: Vec<u64> = cursor
        .iter_start::<u64, ()>()
        .unwrap()
        .map(|item| item.map(|(k, ())| k))
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(keys, vec![1, 2, 10]);

    // Lengths without the payload.
    assert_eq!(cursor.set(&10u64).unwrap(), Some(ObjectLength(3)));
}

#[test]
fn test_decode_len_mismatch_is_usage_error() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    cursor.put(b"key1", b"toolong", WriteFlags::empty()).unwrap();

    let err = cursor.set::<_, u64>(b"key1").unwrap_err();
    assert_eq!(err, CursorError::DecodeLenDiff);
    assert!(err.is_usage());
}

#[test]
fn test_raw_entries() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // A missing value stores as a zero-length value, which reads back as
    // present-but-empty rather than absent.
    cursor.put_raw(b"empty", None, WriteFlags::empty()).unwrap();
    let entry = cursor.get_raw(Some(b"empty"), None, CursorOp::Set).unwrap().unwrap();
    assert_eq!(entry.value.as_deref(), Some(&[][..]));

    cursor.put_raw(b"key1", Some(b"val1"), WriteFlags::empty()).unwrap();

    // Exact seeks echo the sought key back through the entry.
    let entry = cursor.get_raw(Some(b"key1"), None, CursorOp::Set).unwrap().unwrap();
    assert_eq!(entry.key.as_deref(), Some(b"key1".as_slice()));
    assert_eq!(entry.value.as_deref(), Some(b"val1".as_slice()));

    // Not-found leaves the output entry untouched.
    let mut out = entry.clone();
    assert!(!cursor.get_raw_into(Some(b"nope"), None, CursorOp::Set, &mut out).unwrap());
    assert_eq!(out, entry);

    // A matching-length destination buffer is reused in place.
    let mut out = Entry { key: None, value: Some(vec![0u8; 4]) };
    let before = out.value.as_ref().unwrap().as_ptr();
    assert!(cursor.get_raw_into(Some(b"key1"), None, CursorOp::Set, &mut out).unwrap());
    assert_eq!(out.value.as_deref(), Some(b"val1".as_slice()));
    assert_eq!(out.value.as_ref().unwrap().as_ptr(), before);
}

#[test]
fn test_iter() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let items: Vec<(_, _)> = vec![
        (*b"key1", *b"val1"),
        (*b"key2", *b"val2"),
        (*b"key3", *b"val3"),
        (*b"key5", *b"val5"),
    ];
    for (key, data) in &items {
        populate(&engine, txn, db, &[(key, data)]).unwrap();
    }

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    // A fresh cursor iterates from the first record.
    assert_eq!(items, cursor.iter().collect::<Result<Vec<_>>>().unwrap());

    assert_eq!(items, cursor.iter_start().unwrap().collect::<Result<Vec<_>>>().unwrap());

    // iter() continues from wherever the cursor points.
    cursor.set::<_, ()>(b"key2").unwrap();
    assert_eq!(
        items.clone().into_iter().skip(2).collect::<Vec<_>>(),
        cursor.iter().collect::<Result<Vec<_>>>().unwrap()
    );

    assert_eq!(
        items.clone().into_iter().skip(1).collect::<Vec<_>>(),
        cursor.iter_from(b"key2").unwrap().collect::<Result<Vec<_>>>().unwrap()
    );

    assert_eq!(
        items.into_iter().skip(3).collect::<Vec<_>>(),
        cursor.iter_from(b"key4").unwrap().collect::<Result<Vec<_>>>().unwrap()
    );

    assert_eq!(
        Vec::<((), ())>::new(),
        cursor.iter_from(b"key6").unwrap().collect::<Result<Vec<_>>>().unwrap()
    );
}

#[test]
fn test_iter_empty_database() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    assert!(cursor.iter::<(), ()>().next().is_none());
    assert!(cursor.iter_start::<(), ()>().unwrap().next().is_none());
    assert!(cursor.iter_from::<_, (), ()>(b"foo").unwrap().next().is_none());
}

#[test]
fn test_iter_yields_duplicates_in_order() {
    let (engine, txn, db) = setup(DatabaseFlags::DUP_SORT);
    populate(
        &engine,
        txn,
        db,
        &[(b"a", b"2"), (b"a", b"1"), (b"b", b"1"), (b"a", b"3")],
    )
    .unwrap();

    let mut cursor = Cursor::open(&engine, txn, db).unwrap();
    let all: Vec<([u8; 1], [u8; 1])> =
        cursor.iter_start().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(all, vec![(*b"a", *b"1"), (*b"a", *b"2"), (*b"a", *b"3"), (*b"b", *b"1")]);
}

#[test]
fn test_engine_error_carries_code_and_message() {
    let (engine, txn, db) = setup(DatabaseFlags::empty());
    let mut cursor = Cursor::open(&engine, txn, db).unwrap();

    let err = cursor.del(WriteFlags::empty()).unwrap_err();
    match &err {
        CursorError::Engine { code, message } => {
            assert_eq!(*code, status::NO_DATA);
            assert!(!message.is_empty());
        }
        other => panic!("expected engine error, got {other:?}"),
    }
    assert!(!err.is_usage());
}
