//! Static serializer capabilities.
//!
//! Instead of a runtime registry keyed by type, encoding and decoding are
//! ordinary trait bounds: a type without a codec is a compile error, not a
//! configuration error discovered mid-transaction. The failure modes that
//! remain at runtime (wrong length, malformed payload) are usage errors,
//! kept distinct from engine errors.
//!
//! Integer codecs are fixed-width big-endian, so encoded order matches
//! numeric order under the engine's lexicographic key comparison.

use crate::error::{CursorError, CursorResult};
use byteorder::{BigEndian, ByteOrder};
use smallvec::SmallVec;
use std::ops::Deref;

/// Bytes produced by [`Encodable::encode`].
///
/// Fixed-width encodings fit in the inline buffer and never touch the heap;
/// byte-like types borrow their storage outright.
#[derive(Clone, Debug)]
pub enum Encoded<'a> {
    /// Borrowed directly from the value being encoded.
    Borrowed(&'a [u8]),
    /// Produced into an inline small buffer.
    Inline(SmallVec<[u8; 16]>),
}

impl AsRef<[u8]> for Encoded<'_> {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Borrowed(bytes) => bytes,
            Self::Inline(buf) => buf,
        }
    }
}

impl Deref for Encoded<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

/// Types that can be written to the database as a key or value.
pub trait Encodable {
    /// Encodes the value into bytes.
    fn encode(&self) -> CursorResult<Encoded<'_>>;
}

impl<T: Encodable + ?Sized> Encodable for &T {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        (**self).encode()
    }
}

impl Encodable for [u8] {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        Ok(Encoded::Borrowed(self))
    }
}

impl<const LEN: usize> Encodable for [u8; LEN] {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        Ok(Encoded::Borrowed(self))
    }
}

impl Encodable for Vec<u8> {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        Ok(Encoded::Borrowed(self))
    }
}

impl Encodable for str {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        Ok(Encoded::Borrowed(self.as_bytes()))
    }
}

impl Encodable for String {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        Ok(Encoded::Borrowed(self.as_bytes()))
    }
}

impl Encodable for u32 {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        let mut buf = SmallVec::new();
        buf.resize(4, 0);
        BigEndian::write_u32(&mut buf, *self);
        Ok(Encoded::Inline(buf))
    }
}

impl Encodable for u64 {
    fn encode(&self) -> CursorResult<Encoded<'_>> {
        let mut buf = SmallVec::new();
        buf.resize(8, 0);
        BigEndian::write_u64(&mut buf, *self);
        Ok(Encoded::Inline(buf))
    }
}

/// Types that can be read back from database bytes.
pub trait Decodable: Sized {
    /// Decodes a value from the given bytes.
    fn decode(data: &[u8]) -> CursorResult<Self>;

    /// The value to produce when the engine reports a record with no bytes
    /// on this side (a null descriptor). Defaults to decoding the empty
    /// sequence; fixed-width types override this with their zero form.
    fn decode_absent() -> CursorResult<Self> {
        Self::decode(&[])
    }
}

impl Decodable for Vec<u8> {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        Ok(data.to_vec())
    }
}

impl Decodable for () {
    fn decode(_: &[u8]) -> CursorResult<Self> {
        Ok(())
    }
}

impl<const LEN: usize> Decodable for [u8; LEN] {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        let mut out = [0; LEN];
        if data.len() != LEN {
            return Err(CursorError::DecodeLenDiff);
        }
        out.copy_from_slice(data);
        Ok(out)
    }

    fn decode_absent() -> CursorResult<Self> {
        Ok([0; LEN])
    }
}

impl Decodable for String {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        std::str::from_utf8(data)
            .map(str::to_owned)
            .map_err(|_| CursorError::Codec("invalid utf-8"))
    }
}

impl Decodable for u32 {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        if data.len() != 4 {
            return Err(CursorError::DecodeLenDiff);
        }
        Ok(BigEndian::read_u32(data))
    }

    fn decode_absent() -> CursorResult<Self> {
        Ok(0)
    }
}

impl Decodable for u64 {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        if data.len() != 8 {
            return Err(CursorError::DecodeLenDiff);
        }
        Ok(BigEndian::read_u64(data))
    }

    fn decode_absent() -> CursorResult<Self> {
        Ok(0)
    }
}

/// If you don't need the data itself, just its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectLength(pub usize);

impl Decodable for ObjectLength {
    fn decode(data: &[u8]) -> CursorResult<Self> {
        Ok(Self(data.len()))
    }
}

impl Deref for ObjectLength {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
