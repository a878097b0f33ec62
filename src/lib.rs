//! `udp-courier` — reliable byte-stream delivery over unreliable datagrams.
//!
//! A sender-side transport protocol: an arbitrary payload is split into
//! bounded segments, each delivered exactly-once-observable despite loss,
//! duplication, and reordering, under one of two interchangeable
//! flow-control disciplines — stop-and-wait (a single segment in flight) or
//! a fixed sliding window (a bounded byte range in flight).
//!
//! # Architecture
//!
//! ```text
//!  payload ──▶ Segmenter ──(offset, chunk)──▶ Session
//!                                               │
//!               ┌───────────────────────────────┤
//!               │ StopWaitSession │ SlidingSession + SendWindow
//!               └───────┬─────────┴──────┬──────┘
//!                       │    Packet      │  SessionStats
//!                       ▼                ▼
//!                   Transport         Metrics
//!                 (UDP or in-memory)
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]    — wire format (4-byte seq header, data/ack/close tokens)
//! - [`segment`]   — payload splitting into offset-addressed chunks
//! - [`transport`] — datagram boundary: trait, UDP impl, bounded-wait recv
//! - [`window`]    — outstanding-window state for the sliding variant
//! - [`stop_wait`] — stop-and-wait session loop
//! - [`sliding`]   — fill/drain/retransmit session loop + close handshake
//! - [`session`]   — shared config, per-session stats, error taxonomy
//! - [`metrics`]   — throughput / delay / composite score, run averaging
//! - [`sim`]       — deterministic in-memory lossy link for tests
//! - [`harness`]   — start/stop of the Dockerised impairment receiver

pub mod harness;
pub mod metrics;
pub mod packet;
pub mod segment;
pub mod session;
pub mod sim;
pub mod sliding;
pub mod stop_wait;
pub mod transport;
pub mod window;
