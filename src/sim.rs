//! In-memory fault-injecting link for deterministic testing.
//!
//! Real networks drop, duplicate, and reorder packets at random.  To
//! exercise the reliability machinery without real sockets or real
//! randomness, [`memory_link`] builds a pair of connected
//! [`MemoryTransport`] endpoints whose faults are **scripted**: a
//! [`FaultScript`] names exactly which outbound sends to drop or duplicate,
//! so a test that says "lose the first transmission" always loses exactly
//! that one.
//!
//! | Fault       | Trigger                                            |
//! |-------------|----------------------------------------------------|
//! | Loss        | The endpoint's i-th `send` is in `script.drop`.    |
//! | Duplication | The i-th `send` is in `script.duplicate`.          |
//!
//! Every packet handed to `send` — including dropped ones — is also appended
//! to the endpoint's [`Transcript`], so tests can assert on exactly what a
//! session put on the wire after the fact.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::packet::Packet;
use crate::transport::{Transport, TransportError};

// ---------------------------------------------------------------------------
// FaultScript
// ---------------------------------------------------------------------------

/// Deterministic fault plan for one endpoint's outbound traffic.
///
/// Indices count `send` calls on that endpoint, starting at 0.  The default
/// script is a transparent pass-through.
#[derive(Debug, Clone, Default)]
pub struct FaultScript {
    /// Sends to drop silently.
    pub drop: Vec<u64>,
    /// Sends to deliver twice.
    pub duplicate: Vec<u64>,
}

impl FaultScript {
    /// A script that drops the listed sends.
    pub fn drop_sends(indices: &[u64]) -> Self {
        Self {
            drop: indices.to_vec(),
            ..Self::default()
        }
    }

    /// A script that duplicates the listed sends.
    pub fn duplicate_sends(indices: &[u64]) -> Self {
        Self {
            duplicate: indices.to_vec(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Shared record of every packet an endpoint attempted to send.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<Packet>>>);

impl Transcript {
    fn push(&self, packet: &Packet) {
        self.0.lock().expect("transcript lock").push(packet.clone());
    }

    /// Snapshot of all attempted sends so far, in order.
    pub fn packets(&self) -> Vec<Packet> {
        self.0.lock().expect("transcript lock").clone()
    }

    /// How many data segments (terminal included) were attempted.
    pub fn data_sends(&self) -> usize {
        self.packets()
            .iter()
            .filter(|p| matches!(p, Packet::Data { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// MemoryTransport
// ---------------------------------------------------------------------------

/// One endpoint of an in-memory datagram link.
#[derive(Debug)]
pub struct MemoryTransport {
    outbound: mpsc::UnboundedSender<Packet>,
    inbound: mpsc::UnboundedReceiver<Packet>,
    script: FaultScript,
    sends: u64,
    transcript: Transcript,
}

impl MemoryTransport {
    /// Handle onto this endpoint's send record; grab a clone before moving
    /// the transport into a session.
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

/// Build a connected endpoint pair.  `a_script` governs the first endpoint's
/// outbound faults, `b_script` the second's.
pub fn memory_link(a_script: FaultScript, b_script: FaultScript) -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (
        MemoryTransport {
            outbound: a_tx,
            inbound: a_rx,
            script: a_script,
            sends: 0,
            transcript: Transcript::default(),
        },
        MemoryTransport {
            outbound: b_tx,
            inbound: b_rx,
            script: b_script,
            sends: 0,
            transcript: Transcript::default(),
        },
    )
}

impl Transport for MemoryTransport {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let index = self.sends;
        self.sends += 1;
        self.transcript.push(packet);

        if self.script.drop.contains(&index) {
            log::debug!("[sim] dropping send #{index}: {packet:?}");
            return Ok(());
        }

        self.outbound
            .send(packet.clone())
            .map_err(|_| TransportError::Disconnected)?;

        if self.script.duplicate.contains(&index) {
            log::debug!("[sim] duplicating send #{index}");
            self.outbound
                .send(packet.clone())
                .map_err(|_| TransportError::Disconnected)?;
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, TransportError> {
        self.inbound.recv().await.ok_or(TransportError::Disconnected)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
