//! Payload segmentation.
//!
//! [`split`] turns an arbitrary byte buffer into the ordered sequence of
//! `(offset, chunk)` pairs a session transmits.  Offsets are byte positions
//! in the original stream, so they double as sequence numbers on the wire.
//!
//! The zero-length end-of-stream terminal segment is **not** produced here;
//! the session appends it after the last real chunk (its offset equals the
//! total payload length).
//!
//! Pure function, no side effects.

use crate::packet::MAX_PAYLOAD;

/// One contiguous slice of the payload, ready to become a data segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of `data[0]` in the original payload.
    pub offset: u32,
    /// The payload slice itself, 1..=`max_chunk` bytes.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Offset of the first byte **after** this chunk.
    pub fn end(&self) -> u32 {
        self.offset + self.data.len() as u32
    }
}

/// Split `payload` into chunks of at most [`MAX_PAYLOAD`] bytes.
pub fn split_default(payload: &[u8]) -> Result<Vec<Chunk>, SegmentError> {
    split(payload, MAX_PAYLOAD)
}

/// Split `payload` into chunks of at most `max_chunk` bytes.
///
/// The produced chunks cover the payload exactly, in order, with no gap and
/// no overlap; only the final chunk may be shorter than `max_chunk`.  An
/// empty payload produces no chunks at all.
pub fn split(payload: &[u8], max_chunk: usize) -> Result<Vec<Chunk>, SegmentError> {
    if max_chunk == 0 {
        return Err(SegmentError::ZeroChunkSize);
    }
    // Offsets ride in a 4-byte signed header field; the +1 leaves room for
    // the terminal segment's offset at payload.len().
    if payload.len() >= i32::MAX as usize {
        return Err(SegmentError::PayloadTooLong(payload.len()));
    }

    let mut chunks = Vec::with_capacity(payload.len().div_ceil(max_chunk));
    let mut offset = 0usize;
    while offset < payload.len() {
        let end = (offset + max_chunk).min(payload.len());
        chunks.push(Chunk {
            offset: offset as u32,
            data: payload[offset..end].to_vec(),
        });
        offset = end;
    }
    Ok(chunks)
}

/// Errors that can arise when splitting a payload.
#[derive(Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// `max_chunk` was zero; the split would never terminate.
    ZeroChunkSize,
    /// Payload too long for byte offsets to fit the 4-byte header field.
    PayloadTooLong(usize),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentError::ZeroChunkSize => write!(f, "maximum chunk size must be at least 1"),
            SegmentError::PayloadTooLong(n) => {
                write!(f, "payload of {n} bytes exceeds the sequence-number space")
            }
        }
    }
}

impl std::error::Error for SegmentError {}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
