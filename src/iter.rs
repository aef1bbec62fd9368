//! Iteration over cursor records.

use crate::{
    codec::Decodable,
    cursor::Cursor,
    engine::Engine,
    error::CursorResult,
};
use std::iter::FusedIterator;

/// An iterator over the records of a database, driven by a cursor.
///
/// Each step issues a relative "next" move, so iteration continues from
/// wherever the cursor currently points. Created via [`Cursor::iter`],
/// [`Cursor::iter_start`], or [`Cursor::iter_from`], which may pre-position
/// the cursor and stash the record it landed on as the first item.
///
/// An error ends iteration: it is yielded once, and the iterator is fused
/// afterwards.
pub struct Iter<'e, 'cur, E, Key = Vec<u8>, Value = Vec<u8>>
where
    E: Engine,
{
    cursor: &'cur mut Cursor<'e, E>,
    /// Record produced by cursor positioning, yielded before the first
    /// relative move.
    pending: Option<(Key, Value)>,
    exhausted: bool,
}

impl<'e: 'cur, 'cur, E, Key, Value> Iter<'e, 'cur, E, Key, Value>
where
    E: Engine,
{
    /// Iterator continuing from the cursor's current position.
    pub(crate) fn from_ref(cursor: &'cur mut Cursor<'e, E>) -> Self {
        Self { cursor, pending: None, exhausted: false }
    }

    /// Iterator whose first item is an already-fetched record.
    pub(crate) fn from_ref_with(cursor: &'cur mut Cursor<'e, E>, first: (Key, Value)) -> Self {
        Self { cursor, pending: Some(first), exhausted: false }
    }

    /// Iterator that is exhausted from the start.
    pub(crate) fn end_from_ref(cursor: &'cur mut Cursor<'e, E>) -> Self {
        Self { cursor, pending: None, exhausted: true }
    }
}

impl<E, Key, Value> Iterator for Iter<'_, '_, E, Key, Value>
where
    E: Engine,
    Key: Decodable,
    Value: Decodable,
{
    type Item = CursorResult<(Key, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if let Some(pending) = self.pending.take() {
            return Some(Ok(pending));
        }
        match self.cursor.next() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

impl<E, Key, Value> FusedIterator for Iter<'_, '_, E, Key, Value>
where
    E: Engine,
    Key: Decodable,
    Value: Decodable,
{
}

impl<E, Key, Value> core::fmt::Debug for Iter<'_, '_, E, Key, Value>
where
    E: Engine,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iter").field("exhausted", &self.exhausted).finish_non_exhaustive()
    }
}
