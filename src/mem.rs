//! An ordered, duplicate-aware in-memory engine.
//!
//! [`MemEngine`] implements the [`Engine`] contract over a `BTreeMap` of
//! sorted duplicate lists. It exists so the cursor layer can be exercised
//! without a native storage engine: the crate's own tests, benches, and
//! examples run against it. It applies writes directly and provides no
//! isolation or durability; transaction handles are plain tokens.
//!
//! Returned descriptors point into per-cursor stash buffers, so like a real
//! engine the memory behind a read is only valid until the next operation on
//! the same cursor. Keys must be non-empty; an empty or null key on a keyed
//! operation yields [`status::EINVAL`].

use crate::{
    engine::{CursorHandle, CursorOp, DbHandle, Engine, RawVal, TxnHandle, status},
    flags::{DatabaseFlags, WriteFlags},
};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
};

/// In-memory reference implementation of the [`Engine`] contract.
#[derive(Debug, Default)]
pub struct MemEngine {
    inner: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    tables: Vec<Table>,
    cursors: HashMap<u64, CursorState>,
    next_txn: u64,
    next_cursor: u64,
}

#[derive(Debug, Default)]
struct Table {
    flags: DatabaseFlags,
    map: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

/// Position of a cursor within its table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pos {
    /// Never positioned.
    Unset,
    /// At the `dup`-th value of `key`.
    At { key: Vec<u8>, dup: usize },
    /// Past the last record.
    Eof,
}

#[derive(Debug)]
struct CursorState {
    table: usize,
    pos: Pos,
    /// Set by a delete: `pos` already names the record that replaced the
    /// deleted one, so the next relative move yields it instead of stepping
    /// past it.
    at_successor: bool,
    stash_key: Vec<u8>,
    stash_val: Vec<u8>,
}

impl Table {
    fn dup_sort(&self) -> bool {
        self.flags.contains(DatabaseFlags::DUP_SORT)
    }

    fn first(&self) -> Option<(Vec<u8>, usize)> {
        self.map.keys().next().map(|k| (k.clone(), 0))
    }

    fn last(&self) -> Option<(Vec<u8>, usize)> {
        self.map.iter().next_back().map(|(k, d)| (k.clone(), d.len() - 1))
    }

    fn value(&self, key: &[u8], dup: usize) -> Option<&[u8]> {
        self.map.get(key).and_then(|d| d.get(dup)).map(Vec::as_slice)
    }

    fn next_key(&self, key: &[u8]) -> Option<(Vec<u8>, usize)> {
        self.map
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| (k.clone(), 0))
    }

    fn prev_key_last(&self, key: &[u8]) -> Option<(Vec<u8>, usize)> {
        self.map
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
            .map(|(k, d)| (k.clone(), d.len() - 1))
    }
}

/// Where a positioning operation landed, and whether the engine reports the
/// stored key back through the key descriptor.
struct Landing {
    key: Vec<u8>,
    dup: usize,
    report_key: bool,
}

impl Landing {
    fn keyed(pos: Option<(Vec<u8>, usize)>) -> Result<Self, i32> {
        let (key, dup) = pos.ok_or(status::NOT_FOUND)?;
        Ok(Self { key, dup, report_key: true })
    }
}

/// Computes the record a positioning operation lands on, without mutating
/// anything. Errors are raw status codes.
fn position(
    table: &Table,
    pos: &Pos,
    at_successor: bool,
    key_in: Option<&[u8]>,
    val_in: Option<&[u8]>,
    op: CursorOp,
) -> Result<Landing, i32> {
    let require_dup = || if table.dup_sort() { Ok(()) } else { Err(status::INCOMPATIBLE) };
    let landing = match op {
        CursorOp::First => Landing::keyed(table.first())?,
        CursorOp::Last => Landing::keyed(table.last())?,
        CursorOp::Next => match pos {
            Pos::Unset => Landing::keyed(table.first())?,
            Pos::Eof => return Err(status::NOT_FOUND),
            Pos::At { key, dup } => {
                if at_successor {
                    Landing { key: key.clone(), dup: *dup, report_key: true }
                } else if table.value(key, dup + 1).is_some() {
                    Landing { key: key.clone(), dup: dup + 1, report_key: true }
                } else {
                    Landing::keyed(table.next_key(key))?
                }
            }
        },
        CursorOp::NextDup => {
            require_dup()?;
            match pos {
                Pos::At { key, dup } if at_successor => {
                    Landing { key: key.clone(), dup: *dup, report_key: true }
                }
                Pos::At { key, dup } if table.value(key, dup + 1).is_some() => {
                    Landing { key: key.clone(), dup: dup + 1, report_key: true }
                }
                _ => return Err(status::NOT_FOUND),
            }
        }
        CursorOp::NextNoDup => match pos {
            Pos::Unset => Landing::keyed(table.first())?,
            Pos::Eof => return Err(status::NOT_FOUND),
            Pos::At { key, .. } => Landing::keyed(table.next_key(key))?,
        },
        CursorOp::Prev => match pos {
            Pos::Unset | Pos::Eof => Landing::keyed(table.last())?,
            Pos::At { key, dup } => {
                if *dup > 0 && table.value(key, dup - 1).is_some() {
                    Landing { key: key.clone(), dup: dup - 1, report_key: true }
                } else {
                    Landing::keyed(table.prev_key_last(key))?
                }
            }
        },
        CursorOp::PrevDup => {
            require_dup()?;
            match pos {
                Pos::At { key, dup } if *dup > 0 => {
                    Landing { key: key.clone(), dup: dup - 1, report_key: true }
                }
                _ => return Err(status::NOT_FOUND),
            }
        }
        CursorOp::PrevNoDup => match pos {
            Pos::Unset | Pos::Eof => Landing::keyed(table.last())?,
            Pos::At { key, .. } => Landing::keyed(table.prev_key_last(key))?,
        },
        CursorOp::FirstDup => {
            require_dup()?;
            match pos {
                Pos::At { key, .. } => Landing { key: key.clone(), dup: 0, report_key: false },
                _ => return Err(status::NOT_FOUND),
            }
        }
        CursorOp::LastDup => {
            require_dup()?;
            match pos {
                Pos::At { key, .. } => {
                    let len = table.map.get(key).map_or(0, Vec::len);
                    if len == 0 {
                        return Err(status::NOT_FOUND);
                    }
                    Landing { key: key.clone(), dup: len - 1, report_key: false }
                }
                _ => return Err(status::NOT_FOUND),
            }
        }
        CursorOp::GetCurrent => match pos {
            Pos::At { key, dup } => Landing { key: key.clone(), dup: *dup, report_key: true },
            Pos::Unset | Pos::Eof => return Err(status::NOT_FOUND),
        },
        CursorOp::Set | CursorOp::SetKey => {
            let key = key_in.filter(|k| !k.is_empty()).ok_or(status::EINVAL)?;
            let (key, _) = table.map.get_key_value(key).ok_or(status::NOT_FOUND)?;
            Landing { key: key.clone(), dup: 0, report_key: op == CursorOp::SetKey }
        }
        CursorOp::SetRange => {
            let key = key_in.filter(|k| !k.is_empty()).ok_or(status::EINVAL)?;
            Landing::keyed(
                table
                    .map
                    .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
                    .next()
                    .map(|(k, _)| (k.clone(), 0)),
            )?
        }
        CursorOp::GetBoth => {
            require_dup()?;
            let key = key_in.filter(|k| !k.is_empty()).ok_or(status::EINVAL)?;
            let val = val_in.ok_or(status::EINVAL)?;
            let (key, dups) = table.map.get_key_value(key).ok_or(status::NOT_FOUND)?;
            let dup = dups
                .binary_search_by(|d| d.as_slice().cmp(val))
                .map_err(|_| status::NOT_FOUND)?;
            Landing { key: key.clone(), dup, report_key: false }
        }
        CursorOp::GetBothRange => {
            require_dup()?;
            let key = key_in.filter(|k| !k.is_empty()).ok_or(status::EINVAL)?;
            let val = val_in.ok_or(status::EINVAL)?;
            let (key, dups) = table.map.get_key_value(key).ok_or(status::NOT_FOUND)?;
            let dup = dups.partition_point(|d| d.as_slice() < val);
            if dup == dups.len() {
                return Err(status::NOT_FOUND);
            }
            Landing { key: key.clone(), dup, report_key: false }
        }
    };
    // The landing must name a live record.
    if table.value(&landing.key, landing.dup).is_none() {
        return Err(status::NOT_FOUND);
    }
    Ok(landing)
}

impl MemEngine {
    /// Creates an empty engine with no databases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a database and returns its handle.
    pub fn create_db(&self, flags: DatabaseFlags) -> DbHandle {
        let mut state = self.inner.lock();
        state.tables.push(Table { flags, map: BTreeMap::new() });
        DbHandle::new(state.tables.len() as u64 - 1)
    }

    /// Hands out a transaction token. The reference engine applies writes
    /// directly, so the token carries no isolation; it exists to satisfy the
    /// handle contract.
    pub fn begin_txn(&self) -> TxnHandle {
        let mut state = self.inner.lock();
        let txn = TxnHandle::new(state.next_txn);
        state.next_txn += 1;
        txn
    }

    /// Total number of records (duplicates included) in a database.
    pub fn record_count(&self, db: DbHandle) -> usize {
        let state = self.inner.lock();
        state
            .tables
            .get(db.raw() as usize)
            .map_or(0, |t| t.map.values().map(Vec::len).sum())
    }

    /// Number of cursors currently open across all databases.
    pub fn open_cursors(&self) -> usize {
        self.inner.lock().cursors.len()
    }
}

impl Engine for MemEngine {
    fn cursor_open(&self, txn: TxnHandle, db: DbHandle) -> Result<CursorHandle, i32> {
        let mut state = self.inner.lock();
        if txn.raw() >= state.next_txn {
            return Err(status::BAD_HANDLE);
        }
        let table = db.raw() as usize;
        if table >= state.tables.len() {
            return Err(status::BAD_HANDLE);
        }
        let handle = CursorHandle::new(state.next_cursor);
        state.next_cursor += 1;
        state.cursors.insert(
            handle.raw(),
            CursorState {
                table,
                pos: Pos::Unset,
                at_successor: false,
                stash_key: Vec::new(),
                stash_val: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn cursor_close(&self, cursor: CursorHandle) {
        self.inner.lock().cursors.remove(&cursor.raw());
    }

    unsafe fn cursor_get(
        &self,
        cursor: CursorHandle,
        key: &mut RawVal,
        value: &mut RawVal,
        op: CursorOp,
    ) -> i32 {
        // SAFETY: input descriptors point at the caller's live marshal
        // buffers for the duration of this call.
        let key_in = unsafe { key.as_slice() };
        let val_in = unsafe { value.as_slice() };

        let mut guard = self.inner.lock();
        let State { tables, cursors, .. } = &mut *guard;
        let Some(cur) = cursors.get_mut(&cursor.raw()) else {
            return status::BAD_HANDLE;
        };
        let Some(table) = tables.get(cur.table) else {
            return status::BAD_HANDLE;
        };

        let landing = match position(table, &cur.pos, cur.at_successor, key_in, val_in, op) {
            Ok(landing) => landing,
            Err(code) => return code,
        };
        let Some(out_val) = table.value(&landing.key, landing.dup) else {
            return status::NOT_FOUND;
        };

        cur.stash_val.clear();
        cur.stash_val.extend_from_slice(out_val);
        *value = RawVal { base: cur.stash_val.as_mut_ptr().cast(), len: cur.stash_val.len() };
        if landing.report_key {
            cur.stash_key.clear();
            cur.stash_key.extend_from_slice(&landing.key);
            *key = RawVal { base: cur.stash_key.as_mut_ptr().cast(), len: cur.stash_key.len() };
        }
        cur.pos = Pos::At { key: landing.key, dup: landing.dup };
        cur.at_successor = false;
        status::SUCCESS
    }

    unsafe fn cursor_put(
        &self,
        cursor: CursorHandle,
        key: RawVal,
        value: RawVal,
        flags: WriteFlags,
    ) -> i32 {
        // SAFETY: descriptors point at the caller's live marshal buffers for
        // the duration of this call.
        let key_in = unsafe { key.as_slice() };
        let val_in = unsafe { value.as_slice() };
        let Some(key) = key_in.filter(|k| !k.is_empty()) else {
            return status::EINVAL;
        };
        let value = val_in.unwrap_or(&[]).to_vec();

        let mut guard = self.inner.lock();
        let State { tables, cursors, .. } = &mut *guard;
        let Some(cur) = cursors.get_mut(&cursor.raw()) else {
            return status::BAD_HANDLE;
        };
        let Some(table) = tables.get_mut(cur.table) else {
            return status::BAD_HANDLE;
        };
        let dup_sort = table.dup_sort();

        if flags.contains(WriteFlags::CURRENT) {
            // Replace the value at the current position.
            let Pos::At { key: cur_key, dup } = cur.pos.clone() else {
                return status::NO_DATA;
            };
            let Some(dups) = table.map.get_mut(&cur_key) else {
                return status::NO_DATA;
            };
            if dup >= dups.len() {
                return status::NO_DATA;
            }
            if dup_sort {
                dups.remove(dup);
                let at = dups.partition_point(|d| d.as_slice() < value.as_slice());
                dups.insert(at, value);
                cur.pos = Pos::At { key: cur_key, dup: at };
            } else {
                dups[0] = value;
            }
            cur.at_successor = false;
            return status::SUCCESS;
        }

        if flags.contains(WriteFlags::APPEND)
            && let Some(last) = table.map.keys().next_back()
            && key < last.as_slice()
        {
            return status::KEY_MISMATCH;
        }

        let dup = if let Some(dups) = table.map.get_mut(key) {
            if flags.contains(WriteFlags::NO_OVERWRITE) {
                return status::KEY_EXIST;
            }
            if dup_sort {
                match dups.binary_search_by(|d| d.as_slice().cmp(&value)) {
                    Ok(at) => {
                        if flags.contains(WriteFlags::NO_DUP_DATA) {
                            return status::KEY_EXIST;
                        }
                        // Exact pair already present; nothing to write.
                        at
                    }
                    Err(at) => {
                        dups.insert(at, value);
                        at
                    }
                }
            } else {
                dups[0] = value;
                0
            }
        } else {
            table.map.insert(key.to_vec(), vec![value]);
            0
        };
        cur.pos = Pos::At { key: key.to_vec(), dup };
        cur.at_successor = false;
        status::SUCCESS
    }

    fn cursor_del(&self, cursor: CursorHandle, flags: WriteFlags) -> i32 {
        let mut guard = self.inner.lock();
        let State { tables, cursors, .. } = &mut *guard;
        let Some(cur) = cursors.get_mut(&cursor.raw()) else {
            return status::BAD_HANDLE;
        };
        let Some(table) = tables.get_mut(cur.table) else {
            return status::BAD_HANDLE;
        };
        let Pos::At { key, dup } = cur.pos.clone() else {
            return status::NO_DATA;
        };
        let Some(dups) = table.map.get_mut(&key) else {
            return status::NO_DATA;
        };

        let remove_all = flags.contains(WriteFlags::ALL_DUPS) || dups.len() == 1;
        if remove_all {
            table.map.remove(&key);
        } else {
            if dup >= dups.len() {
                return status::NO_DATA;
            }
            dups.remove(dup);
            if dup < dups.len() {
                // The next duplicate slid into the deleted slot.
                cur.pos = Pos::At { key, dup };
                cur.at_successor = true;
                return status::SUCCESS;
            }
        }
        cur.pos = match table.next_key(&key) {
            Some((next, dup)) => Pos::At { key: next, dup },
            None => Pos::Eof,
        };
        cur.at_successor = true;
        status::SUCCESS
    }

    fn cursor_count(&self, cursor: CursorHandle) -> Result<u64, i32> {
        let guard = self.inner.lock();
        let cur = guard.cursors.get(&cursor.raw()).ok_or(status::BAD_HANDLE)?;
        let table = guard.tables.get(cur.table).ok_or(status::BAD_HANDLE)?;
        if !table.dup_sort() {
            return Err(status::INCOMPATIBLE);
        }
        match &cur.pos {
            Pos::At { key, .. } => {
                table.map.get(key).map(|d| d.len() as u64).ok_or(status::NO_DATA)
            }
            Pos::Unset | Pos::Eof => Err(status::NO_DATA),
        }
    }

    fn message(&self, code: i32) -> String {
        match code {
            status::SUCCESS => "success",
            status::NOT_FOUND => "no matching record",
            status::KEY_EXIST => "key/value pair already exists",
            status::INCOMPATIBLE => "operation incompatible with database kind",
            status::NO_DATA => "cursor is not positioned at a record",
            status::KEY_MISMATCH => "append key is out of order",
            status::BAD_HANDLE => "stale or unknown handle",
            status::EINVAL => "invalid argument",
            _ => return format!("unknown engine error {code}"),
        }
        .to_owned()
    }
}
