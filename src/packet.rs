//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged with the receiver is a [`Packet`].  This module
//! is responsible for:
//! - Defining the on-wire binary layout (header, payload, control tokens).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Payload bytes (0–1020) or control token ...            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The sequence number is the **byte offset** of the segment's first payload
//! byte in the original stream, not a packet counter, so acknowledgment
//! numbers compare directly against offsets.  The field is signed on the
//! wire; every offset this protocol produces fits in an `i32`, so the
//! big-endian bytes of the internal `u32` are identical.
//!
//! Two reserved payloads are control tokens rather than data: `"fin"` (the
//! receiver's close-ready signal) and `"==FINACK=="` (the sender's final
//! close confirmation).  Decoding classifies each datagram exactly once into
//! a [`Packet`] variant; protocol logic never compares payload bytes again.
//!
//! A zero-length data segment (the end-of-stream terminal) and a bare
//! acknowledgment are byte-identical on the wire: 4 header bytes, nothing
//! after.  Transfer direction disambiguates — the sender only ever transmits
//! data, the receiver only ever acknowledges — so decode resolves the shared
//! encoding to [`Packet::Ack`].

/// Maximum total datagram size: 4-byte header plus [`MAX_PAYLOAD`] bytes.
pub const MAX_DATAGRAM: usize = 1024;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 4;

/// Maximum payload bytes per data segment ([`MAX_DATAGRAM`] − [`HEADER_LEN`]).
pub const MAX_PAYLOAD: usize = MAX_DATAGRAM - HEADER_LEN;

/// Control token carried by the receiver's close signal.
const CLOSE_TOKEN: &[u8] = b"fin";

/// Control token carried by the sender's final close confirmation.
const CLOSE_ACK_TOKEN: &[u8] = b"==FINACK==";

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A single protocol datagram, decoded once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A data segment: `seq` is the byte offset of `payload[0]` in the
    /// stream.  An empty payload is the end-of-stream terminal segment, with
    /// `seq` equal to the total stream length.
    Data { seq: u32, payload: Vec<u8> },

    /// A cumulative acknowledgment: every byte below `seq` has been
    /// received.
    Ack { seq: u32 },

    /// Receiver-side close signal (`"fin"`): the terminal segment was
    /// observed and all preceding bytes delivered.
    Close { seq: u32 },

    /// Sender-side final close confirmation (`"==FINACK=="`).  `seq` is 0
    /// or the stream length depending on the sender variant; peers accept
    /// either.
    CloseAck { seq: u32 },
}

impl Packet {
    /// Sequence-id field of the header, regardless of variant.
    pub fn seq(&self) -> u32 {
        match *self {
            Packet::Data { seq, .. }
            | Packet::Ack { seq }
            | Packet::Close { seq }
            | Packet::CloseAck { seq } => seq,
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// Fails with [`PacketError::PayloadTooLarge`] if a data payload exceeds
    /// [`MAX_PAYLOAD`] — oversized segments are a caller bug the segmenter
    /// is supposed to prevent.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let (seq, body): (u32, &[u8]) = match self {
            Packet::Data { seq, payload } => {
                if payload.len() > MAX_PAYLOAD {
                    return Err(PacketError::PayloadTooLarge(payload.len()));
                }
                (*seq, payload)
            }
            Packet::Ack { seq } => (*seq, &[]),
            Packet::Close { seq } => (*seq, CLOSE_TOKEN),
            Packet::CloseAck { seq } => (*seq, CLOSE_ACK_TOKEN),
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
        buf.extend_from_slice(&seq.to_be_bytes());
        buf.extend_from_slice(body);
        Ok(buf)
    }

    /// Parse a [`Packet`] from a raw datagram.
    ///
    /// Returns [`PacketError::TruncatedHeader`] for anything shorter than
    /// [`HEADER_LEN`].  Exactly 4 bytes decodes as [`Packet::Ack`] (see the
    /// module docs for why the terminal segment shares this encoding).
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TruncatedHeader(buf.len()));
        }

        let seq = u32::from_be_bytes(buf[..HEADER_LEN].try_into().expect("4-byte slice"));
        let body = &buf[HEADER_LEN..];

        Ok(match body {
            [] => Packet::Ack { seq },
            b if b == CLOSE_TOKEN => Packet::Close { seq },
            b if b == CLOSE_ACK_TOKEN => Packet::CloseAck { seq },
            b => Packet::Data {
                seq,
                payload: b.to_vec(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can arise when encoding or decoding a datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Datagram shorter than the fixed 4-byte header.
    TruncatedHeader(usize),
    /// Data payload exceeds [`MAX_PAYLOAD`] bytes.
    PayloadTooLarge(usize),
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::TruncatedHeader(n) => {
                write!(f, "datagram of {n} bytes is shorter than the {HEADER_LEN}-byte header")
            }
            PacketError::PayloadTooLarge(n) => {
                write!(f, "payload of {n} bytes exceeds the {MAX_PAYLOAD}-byte maximum")
            }
        }
    }
}

impl std::error::Error for PacketError {}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
