//! Marshaling between managed byte sequences and transient native buffers.
//!
//! Every cursor call that hands bytes to the engine goes through
//! `MarshalBuf`: a scoped guard that allocates exactly the input's length
//! in native memory, copies the caller's bytes in, and frees the allocation
//! when the guard drops. Because release rides on `Drop`, it happens on every
//! exit path of the enclosing call, including engine failures.
//!
//! The reverse direction, `read_back`, copies out of engine-owned memory and
//! never frees it.

use crate::{
    engine::RawVal,
    error::{CursorError, CursorResult},
};
use std::{
    alloc::{alloc, dealloc},
    ffi::c_void,
    ptr::{self, NonNull},
    slice,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Count of currently live marshal allocations.
static LIVE: AtomicUsize = AtomicUsize::new(0);

/// Number of native marshal buffers currently allocated and not yet freed.
///
/// Steady-state this is zero: marshal buffers live only for the duration of
/// a single cursor call. Exposed so leak-freedom can be asserted in tests.
pub fn live_allocations() -> usize {
    LIVE.load(Ordering::Acquire)
}

/// A scoped native buffer holding a marshaled copy of caller bytes.
///
/// Three shapes, mirroring the descriptor semantics:
/// - `None` input: the null descriptor, no allocation.
/// - `Some(&[])`: a valid zero-length descriptor with a non-null sentinel
///   address, no allocation. Distinct from the null descriptor.
/// - `Some(bytes)`: a native allocation of exactly `bytes.len()` bytes.
pub(crate) struct MarshalBuf {
    ptr: *mut u8,
    len: usize,
}

impl MarshalBuf {
    /// Marshals an optional byte sequence into native memory.
    pub(crate) fn marshal(bytes: Option<&[u8]>) -> CursorResult<Self> {
        let Some(bytes) = bytes else {
            return Ok(Self { ptr: ptr::null_mut(), len: 0 });
        };
        if bytes.is_empty() {
            return Ok(Self { ptr: NonNull::<u8>::dangling().as_ptr(), len: 0 });
        }
        let layout = std::alloc::Layout::from_size_align(bytes.len(), 1)
            .map_err(|_| CursorError::Alloc { len: bytes.len() })?;
        // SAFETY: the layout has non-zero size.
        let ptr = unsafe { alloc(layout) };
        if ptr.is_null() {
            return Err(CursorError::Alloc { len: bytes.len() });
        }
        // SAFETY: `ptr` was just allocated with room for `bytes.len()` bytes
        // and cannot overlap the caller's slice.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
        LIVE.fetch_add(1, Ordering::AcqRel);
        Ok(Self { ptr, len: bytes.len() })
    }

    /// The descriptor to hand to the engine.
    pub(crate) const fn raw(&self) -> RawVal {
        RawVal { base: self.ptr as *mut c_void, len: self.len }
    }
}

impl Drop for MarshalBuf {
    fn drop(&mut self) {
        // Only the `Some(non-empty)` shape allocated.
        if self.len != 0 {
            // SAFETY: `ptr` came from `alloc` with this exact layout and is
            // freed exactly once, here.
            unsafe {
                dealloc(self.ptr, std::alloc::Layout::from_size_align_unchecked(self.len, 1));
            }
            LIVE.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Copies an engine-returned descriptor out into a managed buffer.
///
/// A null descriptor makes the destination `None`, which is distinct from an
/// empty sequence. When the destination already holds a buffer of the exact
/// returned length it is reused in place; otherwise a fresh buffer sized to
/// the returned length replaces it.
///
/// # Safety
///
/// A non-null descriptor must point at `val.len` readable bytes, i.e. no
/// operation has been issued on the owning cursor since the engine returned
/// it.
pub(crate) unsafe fn read_back(val: RawVal, dst: &mut Option<Vec<u8>>) {
    if val.is_null() {
        *dst = None;
        return;
    }
    // SAFETY: non-null and valid per the caller's contract.
    let src = unsafe { slice::from_raw_parts(val.base as *const u8, val.len) };
    match dst {
        Some(buf) if buf.len() == src.len() => buf.copy_from_slice(src),
        _ => *dst = Some(src.to_vec()),
    }
}
