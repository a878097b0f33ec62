//! Integration tests for the sliding-window session.
//!
//! Each test wires a session to an in-memory link with a scripted fault
//! model and a receiver task, so loss and timing are fully deterministic
//! (the tokio clock is paused; waits auto-advance instead of sleeping).

mod common;

use std::time::Duration;

use udp_courier::packet::Packet;
use udp_courier::session::{SessionConfig, SessionError};
use udp_courier::sim::{memory_link, FaultScript};
use udp_courier::sliding::SlidingSession;

use common::{run_receiver, run_silent_receiver};

// ---------------------------------------------------------------------------
// Test 1: clean transfer — 3000 bytes through a window of 2 segments
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn no_loss_window_two_sends_each_segment_once() {
    let payload: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = SlidingSession::new(sender_link, 2, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    // 3 data segments (1020 + 1020 + 960) + 1 terminal, no retransmissions.
    assert_eq!(transcript.data_sends(), 4);
    assert_eq!(stats.retransmissions, 0);
    assert_eq!(stats.delays.len(), 3);
    assert!(stats.closed_by_peer);
}

// ---------------------------------------------------------------------------
// Test 2: first transmission dropped — delay sample spans the loss
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn single_drop_retransmits_once_and_measures_from_first_send() {
    let payload = vec![9u8; 1020];
    let (sender_link, receiver_link) =
        memory_link(FaultScript::drop_sends(&[0]), FaultScript::default());
    let transcript = sender_link.transcript();

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = SlidingSession::new(sender_link, 4, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    assert_eq!(stats.retransmissions, 1, "exactly one retransmission");
    // Timestamp captured on the first (lost) send and never refreshed, so
    // the recorded delay covers the retransmission wait.
    assert!(stats.delays[0] >= Duration::from_secs(1));
    // seq 0 went out twice, the terminal once.
    let seq0_sends = transcript
        .packets()
        .iter()
        .filter(|p| matches!(p, Packet::Data { seq: 0, payload } if !payload.is_empty()))
        .count();
    assert_eq!(seq0_sends, 2);
}

// ---------------------------------------------------------------------------
// Test 3: duplicated ACKs retire nothing twice
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn duplicate_acks_produce_no_extra_samples() {
    let payload = vec![3u8; 2500];
    // The receiver's first three sends (its ACKs) are all delivered twice.
    let (sender_link, receiver_link) = memory_link(
        FaultScript::default(),
        FaultScript::duplicate_sends(&[0, 1, 2]),
    );

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = SlidingSession::new(sender_link, 8, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    // Duplicates are filtered as stale: one sample per segment, no more.
    assert_eq!(stats.delays.len(), 3);
    assert_eq!(stats.retransmissions, 0);
}

// ---------------------------------------------------------------------------
// Test 4: loss sprinkled across a longer transfer still converges
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn recovers_from_scattered_loss() {
    let payload: Vec<u8> = (0..5100u32).map(|i| (i / 7) as u8).collect(); // 5 segments
    let (sender_link, receiver_link) =
        memory_link(FaultScript::drop_sends(&[1, 4]), FaultScript::default());

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = SlidingSession::new(sender_link, 3, SessionConfig::default())
        .run(&payload)
        .await
        .expect("session");

    assert_eq!(receiver.await.unwrap(), payload);
    assert!(stats.retransmissions >= 2);
    assert_eq!(stats.delays.len(), 5, "every segment eventually acknowledged");
    assert!(stats.closed_by_peer);
}

// ---------------------------------------------------------------------------
// Test 5: empty payload — terminal segment and handshake only
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn empty_payload_sends_only_the_terminal() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    let receiver = tokio::spawn(run_receiver(receiver_link));
    let stats = SlidingSession::new(sender_link, 100, SessionConfig::default())
        .run(&[])
        .await
        .expect("session");

    assert!(receiver.await.unwrap().is_empty());
    assert!(stats.delays.is_empty(), "zero delay samples is valid");
    assert!(stats.closed_by_peer);
    assert_eq!(transcript.data_sends(), 1, "exactly one terminal segment");
    assert_eq!(
        transcript.packets().last(),
        Some(&Packet::CloseAck { seq: 0 })
    );
}

// ---------------------------------------------------------------------------
// Test 6: handshake deadline — a vanished receiver cannot hang the close
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn force_closes_when_close_signal_never_arrives() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    let transcript = sender_link.transcript();

    tokio::spawn(run_silent_receiver(receiver_link));

    let stats = SlidingSession::new(sender_link, 4, SessionConfig::default())
        .run(&[])
        .await
        .expect("session must terminate on deadline expiry");

    assert!(!stats.closed_by_peer);
    // Terminal resent roughly once per second across the 10 s deadline.
    assert!(stats.retransmissions >= 8);
    assert_eq!(
        transcript.packets().last(),
        Some(&Packet::CloseAck { seq: 0 })
    );
}

// ---------------------------------------------------------------------------
// Test 7: silent peer during data — retry budget bounds the session
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn retry_budget_bounds_a_dead_session() {
    let (sender_link, receiver_link) = memory_link(FaultScript::default(), FaultScript::default());
    tokio::spawn(run_silent_receiver(receiver_link));

    let cfg = SessionConfig {
        max_retries: 3,
        ..SessionConfig::default()
    };
    let err = SlidingSession::new(sender_link, 4, cfg)
        .run(&vec![0u8; 4000])
        .await
        .expect_err("a dead peer must not hang the session");
    assert!(matches!(err, SessionError::MaxRetriesExceeded));
}
