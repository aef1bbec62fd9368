use crate::{
    buffer::{self, MarshalBuf},
    codec::{Decodable, Encodable},
    engine::{CursorHandle, CursorOp, DbHandle, Engine, TxnHandle},
    error::{CursorError, CursorResult, engine_check, engine_ok},
    flags::WriteFlags,
    iter::Iter,
};
use std::{fmt, mem};
use tracing::trace;

/// A raw record as read back from the engine.
///
/// Either side may be `None`: the engine reported no bytes for it (a null
/// descriptor), which is distinct from a present zero-length sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    /// The record's key bytes, if the engine reported them.
    pub key: Option<Vec<u8>>,
    /// The record's value bytes, if the engine reported them.
    pub value: Option<Vec<u8>>,
}

/// A cursor for navigating the records of one database within one
/// transaction.
///
/// The cursor owns exactly one engine resource, its [`CursorHandle`]. The
/// transaction and database it works over are back-references only: dropping
/// or closing the cursor never touches them. Conversely the cursor is valid
/// only while its transaction is live; a cursor bound to a write transaction
/// must be closed no later than the transaction's end, and using one past
/// that point is a usage-contract violation whose detection is delegated to
/// the engine.
///
/// Every operation fails with [`CursorError::Closed`] after [`Cursor::close`]
/// without reaching the engine. `close` itself is idempotent, and `Drop`
/// closes an open cursor.
///
/// A cursor is single-threaded state: operations take `&mut self`, and the
/// type is `Send` (when the engine is `Sync`) but could only be shared across
/// threads behind external synchronization.
pub struct Cursor<'e, E: Engine> {
    engine: &'e E,
    txn: TxnHandle,
    db: DbHandle,
    handle: CursorHandle,
    closed: bool,
}

impl<'e, E: Engine> Cursor<'e, E> {
    /// Opens a cursor over `db` within the live transaction `txn`.
    pub fn open(engine: &'e E, txn: TxnHandle, db: DbHandle) -> CursorResult<Self> {
        let handle =
            engine.cursor_open(txn, db).map_err(|code| CursorError::engine(engine, code))?;
        trace!(target: "ordkv_cursor", cursor = handle.raw(), txn = txn.raw(), db = db.raw(), "cursor opened");
        Ok(Self { engine, txn, db, handle, closed: false })
    }

    /// The transaction this cursor is bound to.
    pub const fn txn(&self) -> TxnHandle {
        self.txn
    }

    /// The database this cursor navigates.
    pub const fn db(&self) -> DbHandle {
        self.db
    }

    /// Whether [`Cursor::close`] has been called.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the engine cursor. Safe to call more than once; only the
    /// first call reaches the engine.
    pub fn close(&mut self) {
        if !mem::replace(&mut self.closed, true) {
            self.engine.cursor_close(self.handle);
            trace!(target: "ordkv_cursor", cursor = self.handle.raw(), "cursor closed");
        }
    }

    const fn ensure_open(&self) -> CursorResult<()> {
        if self.closed {
            return Err(CursorError::Closed);
        }
        Ok(())
    }

    /// Positioned read into a caller-provided [`Entry`].
    ///
    /// Returns `Ok(false)` on the engine's not-found sentinel, leaving `out`
    /// untouched. On success, `out` reflects whatever the engine positioned
    /// to; buffers already held by `out` are reused when their length
    /// matches the returned data. Side effect: the cursor moves as dictated
    /// by `op`.
    pub fn get_raw_into(
        &mut self,
        key: Option<&[u8]>,
        value: Option<&[u8]>,
        op: CursorOp,
        out: &mut Entry,
    ) -> CursorResult<bool> {
        self.ensure_open()?;
        let key_buf = MarshalBuf::marshal(key)?;
        let value_buf = MarshalBuf::marshal(value)?;
        let mut key_val = key_buf.raw();
        let mut value_val = value_buf.raw();
        // SAFETY: the descriptors point at live marshal buffers (or the null
        // sentinel) for the duration of the call.
        let code =
            unsafe { self.engine.cursor_get(self.handle, &mut key_val, &mut value_val, op) };
        if !engine_check(self.engine, code)? {
            return Ok(false);
        }
        // SAFETY: no further operation has been issued on this cursor, so
        // any engine-rewritten descriptor is still valid. Descriptors the
        // engine left alone still point at the marshal buffers, which
        // outlive these calls.
        unsafe {
            buffer::read_back(key_val, &mut out.key);
            buffer::read_back(value_val, &mut out.value);
        }
        Ok(true)
    }

    /// Positioned read returning a fresh [`Entry`], or `None` on the
    /// engine's not-found sentinel.
    pub fn get_raw(
        &mut self,
        key: Option<&[u8]>,
        value: Option<&[u8]>,
        op: CursorOp,
    ) -> CursorResult<Option<Entry>> {
        let mut entry = Entry::default();
        Ok(self.get_raw_into(key, value, op, &mut entry)?.then_some(entry))
    }

    fn get_full<Key, Value>(
        &mut self,
        key: Option<&[u8]>,
        data: Option<&[u8]>,
        op: CursorOp,
    ) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        let Some(entry) = self.get_raw(key, data, op)? else {
            return Ok(None);
        };
        let key = match &entry.key {
            Some(bytes) => Key::decode(bytes)?,
            None => Key::decode_absent()?,
        };
        let value = match &entry.value {
            Some(bytes) => Value::decode(bytes)?,
            None => Value::decode_absent()?,
        };
        Ok(Some((key, value)))
    }

    fn get_value<Value>(
        &mut self,
        key: Option<&[u8]>,
        data: Option<&[u8]>,
        op: CursorOp,
    ) -> CursorResult<Option<Value>>
    where
        Value: Decodable,
    {
        Ok(self.get_full::<(), Value>(key, data, op)?.map(|((), value)| value))
    }

    /// Position at the first record.
    pub fn first<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::First)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the first duplicate of
    /// the current key.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn first_dup<Value>(&mut self) -> CursorResult<Option<Value>>
    where
        Value: Decodable,
    {
        self.get_value(None, None, CursorOp::FirstDup)
    }

    /// Position at the last record.
    pub fn last<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::Last)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the last duplicate of
    /// the current key.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn last_dup<Value>(&mut self) -> CursorResult<Option<Value>>
    where
        Value: Decodable,
    {
        self.get_value(None, None, CursorOp::LastDup)
    }

    /// Position at the next record.
    #[expect(clippy::should_implement_trait)]
    pub fn next<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::Next)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the next duplicate of
    /// the current key.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn next_dup<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::NextDup)
    }

    /// Position at the first duplicate of the next key.
    pub fn next_nodup<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::NextNoDup)
    }

    /// Position at the previous record.
    pub fn prev<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::Prev)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the previous duplicate
    /// of the current key.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn prev_dup<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::PrevDup)
    }

    /// Position at the last duplicate of the previous key.
    pub fn prev_nodup<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::PrevNoDup)
    }

    /// Read the record at the current position without moving.
    pub fn get_current<Key, Value>(&mut self) -> CursorResult<Option<(Key, Value)>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        self.get_full(None, None, CursorOp::GetCurrent)
    }

    /// Position at the record matching `key` exactly.
    pub fn set<K, Value>(&mut self, key: &K) -> CursorResult<Option<Value>>
    where
        K: Encodable + ?Sized,
        Value: Decodable,
    {
        let key = key.encode()?;
        self.get_value(Some(key.as_ref()), None, CursorOp::Set)
    }

    /// Position at the record matching `key` exactly, returning the stored
    /// key alongside the value.
    pub fn set_key<K, Key, Value>(&mut self, key: &K) -> CursorResult<Option<(Key, Value)>>
    where
        K: Encodable + ?Sized,
        Key: Decodable,
        Value: Decodable,
    {
        let key = key.encode()?;
        self.get_full(Some(key.as_ref()), None, CursorOp::SetKey)
    }

    /// Position at the first record whose key is greater than or equal to
    /// `key`.
    pub fn set_range<K, Key, Value>(&mut self, key: &K) -> CursorResult<Option<(Key, Value)>>
    where
        K: Encodable + ?Sized,
        Key: Decodable,
        Value: Decodable,
    {
        let key = key.encode()?;
        self.get_full(Some(key.as_ref()), None, CursorOp::SetRange)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the exact key/value
    /// pair.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn get_both<K, V, Value>(&mut self, k: &K, v: &V) -> CursorResult<Option<Value>>
    where
        K: Encodable + ?Sized,
        V: Encodable + ?Sized,
        Value: Decodable,
    {
        let k = k.encode()?;
        let v = v.encode()?;
        self.get_value(Some(k.as_ref()), Some(v.as_ref()), CursorOp::GetBoth)
    }

    /// [`DatabaseFlags::DUP_SORT`]-only: position at the given key, at the
    /// first duplicate greater than or equal to the given value.
    ///
    /// [`DatabaseFlags::DUP_SORT`]: crate::DatabaseFlags::DUP_SORT
    pub fn get_both_range<K, V, Value>(&mut self, k: &K, v: &V) -> CursorResult<Option<Value>>
    where
        K: Encodable + ?Sized,
        V: Encodable + ?Sized,
        Value: Decodable,
    {
        let k = k.encode()?;
        let v = v.encode()?;
        self.get_value(Some(k.as_ref()), Some(v.as_ref()), CursorOp::GetBothRange)
    }

    /// Writes a key/value pair through the cursor. On success the cursor is
    /// positioned at the new record; on failure it is usually near it.
    pub fn put<K, V>(&mut self, key: &K, value: &V, flags: WriteFlags) -> CursorResult<()>
    where
        K: Encodable + ?Sized,
        V: Encodable + ?Sized,
    {
        let key = key.encode()?;
        let value = value.encode()?;
        self.put_raw(key.as_ref(), Some(value.as_ref()), flags)
    }

    /// Raw-byte write. A `None` value stores a zero-length value.
    ///
    /// Engine rejections (e.g. the key-exists status under
    /// [`WriteFlags::NO_OVERWRITE`]) propagate verbatim.
    pub fn put_raw(
        &mut self,
        key: &[u8],
        value: Option<&[u8]>,
        flags: WriteFlags,
    ) -> CursorResult<()> {
        self.ensure_open()?;
        let key_buf = MarshalBuf::marshal(Some(key))?;
        let value_buf = MarshalBuf::marshal(value)?;
        // SAFETY: the descriptors point at live marshal buffers (or the null
        // sentinel) for the duration of the call.
        let code =
            unsafe { self.engine.cursor_put(self.handle, key_buf.raw(), value_buf.raw(), flags) };
        engine_ok(self.engine, code)?;
        trace!(target: "ordkv_cursor", cursor = self.handle.raw(), key_len = key.len(), "cursor put");
        Ok(())
    }

    /// Deletes the record at the current position.
    ///
    /// The cursor stays usable: relative moves continue to work, and an
    /// immediate [`Cursor::get_current`] reads whatever record now occupies
    /// the position, per the engine's semantics.
    /// [`WriteFlags::ALL_DUPS`] removes every duplicate of the current key.
    pub fn del(&mut self, flags: WriteFlags) -> CursorResult<()> {
        self.ensure_open()?;
        engine_ok(self.engine, self.engine.cursor_del(self.handle, flags))?;
        trace!(target: "ordkv_cursor", cursor = self.handle.raw(), "cursor del");
        Ok(())
    }

    /// Number of duplicate values stored under the current key.
    ///
    /// Only meaningful on databases opened with sorted duplicates; on any
    /// other database the engine's incompatibility error surfaces unchanged
    /// rather than defaulting to 1.
    pub fn count(&mut self) -> CursorResult<u64> {
        self.ensure_open()?;
        self.engine.cursor_count(self.handle).map_err(|code| CursorError::engine(self.engine, code))
    }

    /// Returns an iterator over records, starting with the record after the
    /// cursor's current position. A fresh cursor iterates from the first
    /// record.
    pub fn iter<'cur, Key, Value>(&'cur mut self) -> Iter<'e, 'cur, E, Key, Value>
    where
        Key: Decodable,
        Value: Decodable,
    {
        Iter::from_ref(self)
    }

    /// Iterate over records from the beginning of the database.
    pub fn iter_start<'cur, Key, Value>(
        &'cur mut self,
    ) -> CursorResult<Iter<'e, 'cur, E, Key, Value>>
    where
        Key: Decodable,
        Value: Decodable,
    {
        let Some(first) = self.first()? else {
            return Ok(Iter::end_from_ref(self));
        };
        Ok(Iter::from_ref_with(self, first))
    }

    /// Iterate over records starting from the first key greater than or
    /// equal to `key`.
    pub fn iter_from<'cur, K, Key, Value>(
        &'cur mut self,
        key: &K,
    ) -> CursorResult<Iter<'e, 'cur, E, Key, Value>>
    where
        K: Encodable + ?Sized,
        Key: Decodable,
        Value: Decodable,
    {
        let Some(first) = self.set_range(key)? else {
            return Ok(Iter::end_from_ref(self));
        };
        Ok(Iter::from_ref_with(self, first))
    }
}

impl<E: Engine> fmt::Debug for Cursor<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("txn", &self.txn)
            .field("db", &self.db)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Drop for Cursor<'_, E> {
    fn drop(&mut self) {
        self.close();
    }
}
