//! Shared scaffolding for session integration tests.
//!
//! [`run_receiver`] plays the external collaborator's role over an
//! in-memory link: it accepts in-order data segments, emits cumulative
//! acknowledgments, answers the zero-length terminal segment with the close
//! signal, and stops on the sender's close confirmation.  It returns the
//! bytes it delivered so tests can check the stream arrived intact.

use udp_courier::packet::Packet;
use udp_courier::sim::MemoryTransport;
use udp_courier::transport::Transport;

/// Drive a conforming receiver until the session ends; returns the
/// reassembled stream.
pub async fn run_receiver(mut link: MemoryTransport) -> Vec<u8> {
    let mut delivered = Vec::new();
    let mut rcv_next: u32 = 0;

    loop {
        let packet = match link.recv().await {
            Ok(p) => p,
            Err(_) => break, // sender endpoint gone
        };
        match packet {
            // Terminal segment: close-ready once everything before it is in.
            Packet::Data { seq, payload } if payload.is_empty() => {
                if seq == rcv_next {
                    let _ = link.send(&Packet::Close { seq: rcv_next }).await;
                } else {
                    let _ = link.send(&Packet::Ack { seq: rcv_next }).await;
                }
            }
            Packet::Data { seq, payload } => {
                if seq == rcv_next {
                    delivered.extend_from_slice(&payload);
                    rcv_next += payload.len() as u32;
                }
                // Cumulative ACK whether or not the segment was in order.
                let _ = link.send(&Packet::Ack { seq: rcv_next }).await;
            }
            Packet::CloseAck { .. } => break,
            Packet::Ack { .. } | Packet::Close { .. } => {}
        }
    }
    delivered
}

/// A peer that accepts everything and never answers.
pub async fn run_silent_receiver(mut link: MemoryTransport) {
    while link.recv().await.is_ok() {}
}
