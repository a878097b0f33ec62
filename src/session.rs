//! Shared session types: tuning knobs, run statistics, error taxonomy.
//!
//! Both sender variants ([`crate::stop_wait`] and [`crate::sliding`]) are
//! configured by a [`SessionConfig`] and report a [`SessionStats`] when they
//! finish.  Keeping window/base/clock inside an explicit session object —
//! instead of ambient process-wide state — is what makes multiple sessions
//! and socket-free testing possible.

use std::time::Duration;

use crate::packet::MAX_PAYLOAD;
use crate::segment::SegmentError;
use crate::transport::TransportError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Adjustable protocol parameters.
///
/// Defaults reproduce the reference behavior: 1 s retransmission threshold,
/// 0.5 s drain wait, 10 s terminal-handshake deadline with once-per-second
/// terminal resends.  The retry cap has no reference counterpart (the
/// reference retried forever); it bounds session lifetime when the receiver
/// is gone.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum payload bytes per data segment.
    pub max_chunk: usize,
    /// Age after which an unacknowledged segment is retransmitted.  Also the
    /// stop-and-wait per-segment receive timeout.
    pub rto: Duration,
    /// Bounded wait of the sliding-window drain phase's first receive
    /// attempt each cycle.
    pub drain_timeout: Duration,
    /// Hard wall-clock deadline for the terminal close handshake; on expiry
    /// the session force-closes.
    pub handshake_deadline: Duration,
    /// Minimum spacing between terminal-segment resends during the
    /// handshake.
    pub terminal_resend_interval: Duration,
    /// Consecutive no-progress timeout rounds tolerated before the session
    /// aborts with [`SessionError::MaxRetriesExceeded`].
    pub max_retries: u32,
    /// Stop-and-wait only: send attempts for the terminal segment before
    /// closing unilaterally.
    pub close_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_chunk: MAX_PAYLOAD,
            rto: Duration::from_secs(1),
            drain_timeout: Duration::from_millis(500),
            handshake_deadline: Duration::from_secs(10),
            terminal_resend_interval: Duration::from_secs(1),
            max_retries: 10,
            close_attempts: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Raw timing facts gathered over one session, consumed exactly once by
/// [`crate::metrics::Metrics::compute`] after the session has closed.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Total payload bytes delivered (excludes headers and retransmissions).
    pub bytes: u64,
    /// Wall time from first send to close.
    pub elapsed: Duration,
    /// Per-segment delays, one appended the moment a cumulative ACK first
    /// covers that segment.  Measured from the segment's **first** send, so
    /// retransmission latency is included.
    pub delays: Vec<Duration>,
    /// Number of datagrams sent beyond each segment's first transmission.
    pub retransmissions: u64,
    /// `true` when the receiver's close signal was observed; `false` when
    /// the session closed unilaterally on handshake expiry.
    pub closed_by_peer: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can end a session early.
///
/// Transient loss, stale acknowledgments and lapsed receive deadlines are
/// *not* errors — they are absorbed by the retransmission machinery.  What
/// remains is genuine transport failure, caller misuse of the segmenter,
/// and a peer that never answers.
#[derive(Debug)]
pub enum SessionError {
    /// The underlying transport failed.
    Transport(TransportError),
    /// The payload could not be segmented.
    Segment(SegmentError),
    /// The retry cap was exhausted with no acknowledgment progress.
    MaxRetriesExceeded,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport failure: {e}"),
            Self::Segment(e) => write!(f, "segmentation failure: {e}"),
            Self::MaxRetriesExceeded => {
                write!(f, "no acknowledgment progress within the retry budget")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<SegmentError> for SessionError {
    fn from(e: SegmentError) -> Self {
        Self::Segment(e)
    }
}
