//! Integration tests for the stop-and-wait session.
//!
//! Each test wires a session to an in-memory link with a scripted fault
//! model and a receiver task, so loss and timing are fully deterministic
//! (the tokio clock is paused; waits auto-advance instead of sleeping).

mod common;

use std::time::Duration;

use udp_courier::packet::Packet;
use udp_courier::session::{SessionConfig, SessionError};
use udp_courier::sim::{memory_link, FaultScript};
use udp_courier::stop_wait::StopWaitSession;

use common::{run_receiver, run_silent_receiver};

// ---------------------------------------------------------------------------
// Test 1: clean transfer — one segment at a time, zero retransmissions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn delivers_payload_without_loss() {
    let payload: Vec<u8> = (0..2500u32).map(|i| i as u8).collect();
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = StopWaitSession::new(sender_link, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    assert_eq!(stats.bytes, 2500);
    assert_eq!(stats.delays.len(), 3, "one delay sample per real segment");
    assert_eq!(stats.retransmissions, 0);
    assert!(stats.closed_by_peer);
    // 3 real segments + 1 terminal, each sent exactly once.
    assert_eq!(transcript.data_sends(), 4);
}

// ---------------------------------------------------------------------------
// Test 2: first transmission dropped — one retransmission after the timeout
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn single_drop_retransmits_and_measures_from_first_send() {
    let payload = vec![42u8; 1020];
    let (sender_link, receiver_link) =
        memory_link(FaultScript::drop_sends(&[0]), FaultScript::default());

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = StopWaitSession::new(sender_link, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    assert_eq!(stats.retransmissions, 1);
    // The delay clock starts at the dropped first attempt, so the sample
    // includes the full timeout spent waiting for it.
    assert!(stats.delays[0] >= Duration::from_secs(1));
}

// ---------------------------------------------------------------------------
// Test 3: stale ACK does not qualify and does not trigger a resend
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stale_ack_is_discarded_silently() {
    use udp_courier::transport::Transport;

    let payload = vec![7u8; 100];
    let (sender_link, mut receiver_link) =
        memory_link(FaultScript::default(), FaultScript::default());

    // Hand-driven peer: answer the data segment with a stale ACK first,
    // then the real cumulative ACK; finish the handshake normally.
    let receiver = tokio::spawn(async move {
        loop {
            match receiver_link.recv().await {
                Ok(Packet::Data { seq: 0, payload }) if !payload.is_empty() => {
                    receiver_link.send(&Packet::Ack { seq: 0 }).await.unwrap();
                    receiver_link.send(&Packet::Ack { seq: 100 }).await.unwrap();
                }
                Ok(Packet::Data { seq: 100, .. }) => {
                    receiver_link.send(&Packet::Close { seq: 100 }).await.unwrap();
                }
                Ok(Packet::CloseAck { .. }) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let stats = StopWaitSession::new(sender_link, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");
    receiver.await.unwrap();

    // The stale ACK (seq == offset) was ignored without resending; the
    // qualifying ACK arrived in the same wait.
    assert_eq!(stats.retransmissions, 0);
    assert_eq!(stats.delays.len(), 1);
    assert!(stats.closed_by_peer);
}

// ---------------------------------------------------------------------------
// Test 4: empty payload — terminal segment and handshake only
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn empty_payload_sends_only_the_terminal() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = StopWaitSession::new(sender_link, SessionConfig::default())
        .run(&[])
        .await
        .expect("session");

    assert!(receiver.await.unwrap().is_empty());
    assert_eq!(stats.bytes, 0);
    assert!(stats.delays.is_empty(), "zero delay samples is valid");
    assert!(stats.closed_by_peer);

    let packets = transcript.packets();
    assert_eq!(transcript.data_sends(), 1, "exactly one terminal segment");
    assert_eq!(packets.first(), Some(&Packet::Data { seq: 0, payload: vec![] }));
    assert_eq!(packets.last(), Some(&Packet::CloseAck { seq: 0 }));
}

// ---------------------------------------------------------------------------
// Test 5: silent peer during the handshake — bounded attempts, then close
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn terminal_exhaustion_closes_unilaterally() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    tokio::spawn(run_silent_receiver(receiver_link));

    let cfg = SessionConfig {
        close_attempts: 3,
        ..SessionConfig::default()
    };
    let stats = StopWaitSession::new(sender_link, cfg)
        .run(&[])
        .await
        .expect("session must terminate, not hang");

    assert!(!stats.closed_by_peer);
    // 3 terminal attempts, then the unconditional close confirmation.
    assert_eq!(transcript.data_sends(), 3);
    assert_eq!(
        transcript.packets().last(),
        Some(&Packet::CloseAck { seq: 0 })
    );
}

// ---------------------------------------------------------------------------
// Test 6: silent peer during data — retry budget bounds the session
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn retry_budget_bounds_a_dead_session() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    tokio::spawn(run_silent_receiver(receiver_link));

    let cfg = SessionConfig {
        max_retries: 2,
        ..SessionConfig::default()
    };
    let err = StopWaitSession::new(sender_link, cfg)
        .run(&[1, 2, 3])
        .await
        .expect_err("a dead peer must not hang the session");
    assert!(matches!(err, SessionError::MaxRetriesExceeded));
}
