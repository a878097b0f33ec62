//! Stop-and-wait sender session.
//!
//! The degenerate flow-control discipline: exactly **one** segment in flight
//! at any moment.  Each segment walks the state machine
//!
//! ```text
//!  IDLE ──send──▶ SENT ──qualifying ACK──▶ ACKED
//!                  │ ▲
//!          timeout │ │ resend unchanged
//!                  ▼ │
//!              TIMED_OUT
//! ```
//!
//! # Protocol contract
//!
//! - An acknowledgment qualifies only when its sequence number is strictly
//!   greater than the in-flight segment's offset; stale acks from earlier
//!   retransmissions are discarded silently.
//! - The per-segment delay is measured from the **first** send attempt, so
//!   it accumulates across retries (reference-preserving; see the metric
//!   caveat in DESIGN.md).
//! - After the last real chunk a zero-length terminal segment is sent and
//!   retried under the same discipline for a bounded number of attempts,
//!   then the close confirmation goes out unconditionally.

use tokio::time::Instant;

use crate::packet::Packet;
use crate::segment;
use crate::session::{SessionConfig, SessionError, SessionStats};
use crate::transport::{recv_deadline, Transport};

/// A stop-and-wait sender bound to one transport for one payload.
#[derive(Debug)]
pub struct StopWaitSession<T: Transport> {
    transport: T,
    cfg: SessionConfig,
}

impl<T: Transport> StopWaitSession<T> {
    /// Create a session over `transport`.
    pub fn new(transport: T, cfg: SessionConfig) -> Self {
        Self { transport, cfg }
    }

    /// Deliver `payload` reliably, then close.
    ///
    /// Consumes the session; the transport (and its socket) is dropped on
    /// every exit path, including errors.
    pub async fn run(mut self, payload: &[u8]) -> Result<SessionStats, SessionError> {
        let chunks = segment::split(payload, self.cfg.max_chunk)?;
        let total_len = payload.len() as u32;

        let start = Instant::now();
        let mut delays = Vec::with_capacity(chunks.len());
        let mut retransmissions = 0u64;

        for chunk in &chunks {
            let pkt = Packet::Data {
                seq: chunk.offset,
                payload: chunk.data.clone(),
            };
            let first_sent = Instant::now();
            self.transport.send(&pkt).await?;
            log::debug!(
                "[stop-wait] → DATA seq={} len={}",
                chunk.offset,
                chunk.data.len()
            );

            let mut timeouts = 0u32;
            loop {
                match recv_deadline(&mut self.transport, self.cfg.rto).await? {
                    // Qualifying cumulative ACK: covers this segment.
                    Some(Packet::Ack { seq }) if seq > chunk.offset => {
                        delays.push(first_sent.elapsed());
                        log::debug!("[stop-wait] ← ACK ack={seq}");
                        break;
                    }
                    // Stale or duplicate ACK from a prior retransmission:
                    // filtered input, keep waiting.
                    Some(Packet::Ack { seq }) => {
                        log::debug!("[stop-wait] ← stale ACK ack={seq} (ignored)");
                    }
                    Some(other) => {
                        log::debug!("[stop-wait] ← unexpected {other:?} (ignored)");
                    }
                    // Timeout: resend the same segment unchanged.  The delay
                    // clock keeps running from the first attempt.
                    None => {
                        timeouts += 1;
                        if timeouts > self.cfg.max_retries {
                            return Err(SessionError::MaxRetriesExceeded);
                        }
                        retransmissions += 1;
                        log::debug!(
                            "[stop-wait] timeout — retransmitting seq={} (attempt {})",
                            chunk.offset,
                            timeouts + 1
                        );
                        self.transport.send(&pkt).await?;
                    }
                }
            }
        }

        // End of stream: terminal segment, then unconditional close
        // confirmation.
        let closed_by_peer = self.close_handshake(total_len, &mut retransmissions).await?;

        Ok(SessionStats {
            bytes: payload.len() as u64,
            elapsed: start.elapsed(),
            delays,
            retransmissions,
            closed_by_peer,
        })
    }

    /// Send the zero-length terminal segment, await its acknowledgment for a
    /// bounded number of attempts, then confirm the close regardless.
    ///
    /// Returns whether the receiver's close signal was observed.
    async fn close_handshake(
        &mut self,
        total_len: u32,
        retransmissions: &mut u64,
    ) -> Result<bool, SessionError> {
        let terminal = Packet::Data {
            seq: total_len,
            payload: Vec::new(),
        };
        self.transport.send(&terminal).await?;
        log::debug!("[stop-wait] → terminal seq={total_len}");

        let mut attempts = 1u32;
        let mut closed_by_peer = false;
        loop {
            match recv_deadline(&mut self.transport, self.cfg.rto).await? {
                Some(Packet::Close { seq }) => {
                    log::debug!("[stop-wait] ← close signal seq={seq}");
                    closed_by_peer = true;
                    break;
                }
                Some(Packet::Ack { seq }) if seq >= total_len => {
                    log::debug!("[stop-wait] ← terminal acked ack={seq}");
                    break;
                }
                Some(_) => {} // stale traffic
                None => {
                    if attempts >= self.cfg.close_attempts {
                        log::warn!("[stop-wait] terminal never acked; closing unilaterally");
                        break;
                    }
                    attempts += 1;
                    *retransmissions += 1;
                    self.transport.send(&terminal).await?;
                }
            }
        }

        self.transport
            .send(&Packet::CloseAck { seq: total_len })
            .await?;
        log::debug!("[stop-wait] → close confirmation, session ended");
        Ok(closed_by_peer)
    }
}
