//! Fixed sliding-window sender session.
//!
//! Up to `window_segments` segments may be outstanding at once; the window
//! is a byte range `[base, base + window_segments × max_chunk)` that slides
//! forward as cumulative acknowledgments arrive.  One coordination cycle:
//!
//! ```text
//!  ┌────────── fill ──────────┐  send every chunk whose offset fits
//!  │                          ▼
//!  │   ┌─────── drain ────────┐  one bounded wait, then poll-once reads;
//!  │   │                      ▼  cumulative ACKs slide the window
//!  │   │   ┌── retransmit ────┐  resend entries older than the rto
//!  │   │   │                  ▼
//!  └───┴───┴──── repeat until all chunks acked or close signal
//! ```
//!
//! Single logical thread of control: the bounded receive is the only
//! suspension point, so no locks guard the window.  Timestamps are captured
//! on first send and never refreshed — an acknowledged segment's delay
//! includes every retransmission it needed.
//!
//! The terminal handshake has a hard wall-clock deadline; when it expires
//! the session sends its close confirmation anyway and ends.  A vanished
//! receiver degrades the close, it never hangs it.

use std::time::Duration;

use tokio::time::Instant;

use crate::packet::Packet;
use crate::segment;
use crate::session::{SessionConfig, SessionError, SessionStats};
use crate::transport::{recv_deadline, Transport};
use crate::window::SendWindow;

/// Outcome of one drain phase.
enum Drain {
    /// Packets (if any) processed; no close signal seen.
    Continue,
    /// The receiver signalled close-readiness; stop sending data.
    CloseSignalled,
}

/// A sliding-window sender bound to one transport for one payload.
#[derive(Debug)]
pub struct SlidingSession<T: Transport> {
    transport: T,
    cfg: SessionConfig,
    window_segments: usize,
}

impl<T: Transport> SlidingSession<T> {
    /// Create a session allowing `window_segments` unacknowledged segments
    /// in flight.
    pub fn new(transport: T, window_segments: usize, cfg: SessionConfig) -> Self {
        assert!(window_segments >= 1, "window must hold at least one segment");
        Self {
            transport,
            cfg,
            window_segments,
        }
    }

    /// Deliver `payload` reliably, then close.
    ///
    /// Consumes the session; the transport (and its socket) is dropped on
    /// every exit path, including errors.
    pub async fn run(mut self, payload: &[u8]) -> Result<SessionStats, SessionError> {
        let chunks = segment::split(payload, self.cfg.max_chunk)?;
        let total_len = payload.len() as u32;
        let capacity = (self.window_segments * self.cfg.max_chunk) as u32;

        let mut window = SendWindow::new(capacity);
        let mut delays = Vec::with_capacity(chunks.len());
        let mut retransmissions = 0u64;
        let mut closed_by_peer = false;
        let mut next_chunk = 0usize;
        let mut stalled_rounds = 0u32;

        let start = Instant::now();

        'transfer: while next_chunk < chunks.len() || window.has_unacked() {
            // ── Fill: send while the next chunk's offset fits the window ──
            while next_chunk < chunks.len() && window.fits(chunks[next_chunk].offset) {
                let chunk = &chunks[next_chunk];
                self.transport
                    .send(&Packet::Data {
                        seq: chunk.offset,
                        payload: chunk.data.clone(),
                    })
                    .await?;
                window.record_sent(chunk.offset, chunk.data.clone(), Instant::now());
                log::debug!(
                    "[sliding] → DATA seq={} len={} in_flight={}",
                    chunk.offset,
                    chunk.data.len(),
                    window.in_flight()
                );
                next_chunk += 1;
            }

            // ── Drain: collect whatever acknowledgments arrived ──────────
            match self
                .drain(&mut window, &mut delays, &mut stalled_rounds)
                .await?
            {
                Drain::CloseSignalled => {
                    closed_by_peer = true;
                    break 'transfer;
                }
                Drain::Continue => {}
            }

            // ── Retransmit: every entry older than the threshold ─────────
            let now = Instant::now();
            let due: Vec<(u32, Vec<u8>)> = window
                .due_for_retransmit(now, self.cfg.rto)
                .map(|(offset, data)| (offset, data.to_vec()))
                .collect();
            if !due.is_empty() {
                stalled_rounds += 1;
                if stalled_rounds > self.cfg.max_retries {
                    return Err(SessionError::MaxRetriesExceeded);
                }
                log::debug!("[sliding] timeout — retransmitting {} segment(s)", due.len());
                for (offset, data) in due {
                    self.transport
                        .send(&Packet::Data {
                            seq: offset,
                            payload: data,
                        })
                        .await?;
                    retransmissions += 1;
                }
            }
        }

        closed_by_peer = self
            .close_handshake(total_len, &mut window, &mut delays, &mut retransmissions, closed_by_peer)
            .await?;

        Ok(SessionStats {
            bytes: payload.len() as u64,
            elapsed: start.elapsed(),
            delays,
            retransmissions,
            closed_by_peer,
        })
    }

    /// One drain phase: a single bounded wait, then poll-once receives while
    /// packets are immediately available.
    ///
    /// A lapsed deadline on the first attempt means "no acks this cycle",
    /// not an error.
    async fn drain(
        &mut self,
        window: &mut SendWindow,
        delays: &mut Vec<Duration>,
        stalled_rounds: &mut u32,
    ) -> Result<Drain, SessionError> {
        let mut wait = self.cfg.drain_timeout;
        loop {
            match recv_deadline(&mut self.transport, wait).await? {
                None => return Ok(Drain::Continue),
                Some(Packet::Close { seq }) => {
                    log::debug!("[sliding] ← close signal seq={seq}");
                    return Ok(Drain::CloseSignalled);
                }
                Some(Packet::Ack { seq }) => {
                    let newly = window.on_ack(seq, Instant::now());
                    if !newly.is_empty() {
                        *stalled_rounds = 0;
                        log::debug!(
                            "[sliding] ← ACK ack={seq} retired={} base={}",
                            newly.len(),
                            window.base()
                        );
                    }
                    delays.extend(newly);
                }
                Some(other) => {
                    log::debug!("[sliding] ← unexpected {other:?} (ignored)");
                }
            }
            // Only the first attempt of a cycle blocks; afterwards take just
            // what is already queued.
            wait = Duration::ZERO;
        }
    }

    /// Terminal handshake: send the zero-length terminal segment, then until
    /// the deadline alternate bounded waits with once-per-second terminal
    /// resends; finally confirm the close unconditionally.
    async fn close_handshake(
        &mut self,
        total_len: u32,
        window: &mut SendWindow,
        delays: &mut Vec<Duration>,
        retransmissions: &mut u64,
        mut closed_by_peer: bool,
    ) -> Result<bool, SessionError> {
        let terminal = Packet::Data {
            seq: total_len,
            payload: Vec::new(),
        };
        self.transport.send(&terminal).await?;
        if !closed_by_peer {
            // Track it like any other segment so the resend check below can
            // ask whether it is still unacknowledged.
            window.record_sent(total_len, Vec::new(), Instant::now());
        }
        log::debug!("[sliding] → terminal seq={total_len}");

        let deadline = Instant::now() + self.cfg.handshake_deadline;
        let mut last_resend = Instant::now();

        while !closed_by_peer && Instant::now() < deadline {
            match recv_deadline(&mut self.transport, self.cfg.drain_timeout).await? {
                Some(Packet::Close { seq }) => {
                    log::debug!("[sliding] ← close signal seq={seq}");
                    closed_by_peer = true;
                }
                Some(Packet::Ack { seq }) => {
                    // Late acks for data segments may still trickle in.
                    delays.extend(window.on_ack(seq, Instant::now()));
                }
                Some(_) | None => {}
            }

            if !closed_by_peer
                && window.contains(total_len)
                && last_resend.elapsed() >= self.cfg.terminal_resend_interval
            {
                self.transport.send(&terminal).await?;
                *retransmissions += 1;
                last_resend = Instant::now();
                log::debug!("[sliding] terminal unacked — resent");
            }
        }

        if !closed_by_peer {
            log::warn!("[sliding] close handshake deadline expired; force-closing");
        }
        self.transport.send(&Packet::CloseAck { seq: 0 }).await?;
        log::debug!("[sliding] → close confirmation, session ended");
        Ok(closed_by_peer)
    }
}
