//! Outstanding-window bookkeeping for the sliding-window sender.
//!
//! [`SendWindow`] tracks every segment that has been sent but not yet
//! cumulatively acknowledged.  It does **not** touch the transport;
//! [`crate::sliding::SlidingSession`] calls these methods and owns the
//! actual send/receive loop.
//!
//! # Sequence-number layout
//!
//! ```text
//!      base                next_seq       base + capacity_bytes
//!       │                      │                  │
//!  ─────┼──────────────────────┼──────────────────┼───▶ byte offsets
//!       │ ◀──── in flight ───▶ │ ◀── sendable ──▶ │
//! ```
//!
//! # Contract
//!
//! - ACKs are **cumulative**: `on_ack(k)` retires every in-flight segment
//!   whose offset is below `k` and advances `base` to `k`.
//! - Stale or duplicate ACKs (`k ≤ base`) are ignored; `base` never
//!   regresses.
//! - A segment's timestamp is captured on its **first** transmission and
//!   never refreshed, so the delay reported when it is finally acknowledged
//!   spans all retransmissions.
//! - Re-recording an already-tracked or already-acknowledged offset is a
//!   no-op: duplicates never re-enter the window or skew delay samples.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

// ---------------------------------------------------------------------------
// InflightSegment
// ---------------------------------------------------------------------------

/// A segment occupying the outstanding window.
#[derive(Debug, Clone)]
pub struct InflightSegment {
    /// Payload bytes exactly as first transmitted.
    pub payload: Vec<u8>,
    /// Time of the **first** transmission.  Retransmits do not update this.
    pub first_sent_at: Instant,
}

// ---------------------------------------------------------------------------
// SendWindow
// ---------------------------------------------------------------------------

/// Sliding-window send-side state for one session.
#[derive(Debug)]
pub struct SendWindow {
    /// Lowest byte offset not yet cumulatively acknowledged.
    base: u32,
    /// Next byte offset not yet sent.
    next_seq: u32,
    /// Window capacity as a byte range above `base`.
    capacity_bytes: u32,
    /// In-flight segments keyed by byte offset.
    inflight: BTreeMap<u32, InflightSegment>,
}

impl SendWindow {
    /// Create an empty window covering `[0, capacity_bytes)`.
    ///
    /// Stop-and-wait is the degenerate case: capacity of one segment's span.
    pub fn new(capacity_bytes: u32) -> Self {
        assert!(capacity_bytes >= 1, "window capacity must be at least 1 byte");
        Self {
            base: 0,
            next_seq: 0,
            capacity_bytes,
            inflight: BTreeMap::new(),
        }
    }

    /// Lowest unacknowledged byte offset (left window edge).
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Next byte offset not yet sent.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Number of segments currently awaiting acknowledgment.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// `true` when at least one segment awaits acknowledgment.
    pub fn has_unacked(&self) -> bool {
        !self.inflight.is_empty()
    }

    /// `true` while `offset` is still being tracked as in flight.
    pub fn contains(&self, offset: u32) -> bool {
        self.inflight.contains_key(&offset)
    }

    /// `true` when a segment starting at `offset` may be sent now
    /// (the fill-phase gate: `offset < base + capacity_bytes`).
    pub fn fits(&self, offset: u32) -> bool {
        offset < self.base.saturating_add(self.capacity_bytes)
    }

    /// Track a segment's **first** transmission.
    ///
    /// Already-acknowledged offsets (`offset < base`) and offsets already in
    /// flight are ignored, so calling this again for a retransmission keeps
    /// the original timestamp and never re-inserts a retired segment.
    pub fn record_sent(&mut self, offset: u32, payload: Vec<u8>, now: Instant) {
        if offset < self.base || self.inflight.contains_key(&offset) {
            return;
        }
        debug_assert!(self.fits(offset), "record_sent outside the window");
        let end = offset + payload.len() as u32;
        self.inflight.insert(
            offset,
            InflightSegment {
                payload,
                first_sent_at: now,
            },
        );
        self.next_seq = self.next_seq.max(end);
        debug_assert!(self.next_seq - self.base <= self.capacity_bytes);
    }

    /// Process a cumulative acknowledgment.
    ///
    /// Retires every in-flight segment with offset below `ack`, advances
    /// `base` to `ack`, and returns one delay sample per retired segment
    /// (`now − first_sent_at`, inclusive of retransmission latency).
    ///
    /// Returns an empty vec for a stale/duplicate ACK (`ack ≤ base`) or an
    /// ACK beyond anything sent (`ack > next_seq`); neither moves `base`.
    pub fn on_ack(&mut self, ack: u32, now: Instant) -> Vec<Duration> {
        if ack <= self.base || ack > self.next_seq {
            return Vec::new();
        }

        let mut delays = Vec::new();
        while let Some((&offset, _)) = self.inflight.first_key_value() {
            if offset >= ack {
                break;
            }
            let seg = self.inflight.remove(&offset).expect("checked first key");
            delays.push(now.saturating_duration_since(seg.first_sent_at));
        }
        self.base = ack;
        delays
    }

    /// Offsets and payloads of every segment whose age exceeds `rto`,
    /// oldest first.  The caller resends them; timestamps stay untouched.
    pub fn due_for_retransmit(
        &self,
        now: Instant,
        rto: Duration,
    ) -> impl Iterator<Item = (u32, &[u8])> {
        self.inflight.iter().filter_map(move |(&offset, seg)| {
            (now.saturating_duration_since(seg.first_sent_at) > rto)
                .then_some((offset, seg.payload.as_slice()))
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
