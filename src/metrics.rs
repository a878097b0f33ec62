//! Session performance metrics.
//!
//! Pure aggregation over the raw facts a session reports — no side effects,
//! invoked exactly once per session after it has fully closed:
//!
//! - **throughput** — payload bytes per second of wall time;
//! - **average delay** — arithmetic mean of the per-segment delay samples;
//!   absent (not zero, not NaN) when a session produced no samples, as an
//!   empty-payload run legitimately does;
//! - **composite score** — `w_tp × (throughput / scale) + w_delay /
//!   avg_delay`; skipped whenever the average delay is unavailable or zero,
//!   never a division by zero.
//!
//! The weights and scale are arbitrary tuning constants inherited from the
//! original exercise; [`ScoreWeights`] carries them as configuration rather
//! than pretending they are structurally meaningful.
//!
//! [`RunSummary`] aggregates metrics across repeated runs of the same
//! transfer (the network impairment is random, so single runs are noisy)
//! and reports mean and sample standard deviation.

use crate::session::SessionStats;

// ---------------------------------------------------------------------------
// ScoreWeights
// ---------------------------------------------------------------------------

/// Tuning constants for the composite score.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    /// Weight of the (scaled) throughput term.
    pub throughput_weight: f64,
    /// Weight of the inverse-delay term.
    pub delay_weight: f64,
    /// Divisor applied to throughput before weighting.
    pub throughput_scale: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            throughput_weight: 0.3,
            delay_weight: 0.7,
            throughput_scale: 1000.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Derived performance figures for one completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Payload bytes per second of session wall time.
    pub throughput: f64,
    /// Mean per-segment delay in seconds; `None` with no delay samples.
    pub avg_delay: Option<f64>,
    /// Composite score; `None` when the average delay is unavailable or
    /// zero.
    pub score: Option<f64>,
}

impl Metrics {
    /// Compute the metrics for one session.
    pub fn compute(stats: &SessionStats, weights: &ScoreWeights) -> Self {
        let secs = stats.elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            stats.bytes as f64 / secs
        } else {
            0.0
        };

        let avg_delay = if stats.delays.is_empty() {
            None
        } else {
            let sum: f64 = stats.delays.iter().map(|d| d.as_secs_f64()).sum();
            Some(sum / stats.delays.len() as f64)
        };

        let score = match avg_delay {
            Some(d) if d > 0.0 => Some(
                weights.throughput_weight * (throughput / weights.throughput_scale)
                    + weights.delay_weight / d,
            ),
            _ => None,
        };

        Self {
            throughput,
            avg_delay,
            score,
        }
    }

    /// The per-run CSV line: `throughput,avg_delay,metric`.
    ///
    /// Missing values print as `0`, matching the reference output format.
    pub fn csv_line(&self) -> String {
        format!(
            "{:.7},{:.7},{:.7}",
            self.throughput,
            self.avg_delay.unwrap_or(0.0),
            self.score.unwrap_or(0.0)
        )
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Accumulates per-run metrics and reports averages with spread.
#[derive(Debug, Default)]
pub struct RunSummary {
    throughputs: Vec<f64>,
    avg_delays: Vec<f64>,
    scores: Vec<f64>,
}

impl RunSummary {
    /// Record one run's metrics (missing values count as 0, as in the
    /// reference driver).
    pub fn push(&mut self, m: &Metrics) {
        self.throughputs.push(m.throughput);
        self.avg_delays.push(m.avg_delay.unwrap_or(0.0));
        self.scores.push(m.score.unwrap_or(0.0));
    }

    /// Number of runs recorded so far.
    pub fn runs(&self) -> usize {
        self.throughputs.len()
    }

    /// Mean CSV line across runs: `throughput,avg_delay,metric`.
    pub fn mean_line(&self) -> String {
        format!(
            "{:.7},{:.7},{:.7}",
            mean(&self.throughputs),
            mean(&self.avg_delays),
            mean(&self.scores)
        )
    }

    /// Sample standard deviation CSV line, or `None` with fewer than two
    /// runs.
    pub fn stdev_line(&self) -> Option<String> {
        Some(format!(
            "{:.7},{:.7},{:.7}",
            sample_stdev(&self.throughputs)?,
            sample_stdev(&self.avg_delays)?,
            sample_stdev(&self.scores)?
        ))
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample (n − 1) standard deviation; `None` for fewer than two samples.
fn sample_stdev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(bytes: u64, elapsed_ms: u64, delays_ms: &[u64]) -> SessionStats {
        SessionStats {
            bytes,
            elapsed: Duration::from_millis(elapsed_ms),
            delays: delays_ms.iter().map(|&ms| Duration::from_millis(ms)).collect(),
            retransmissions: 0,
            closed_by_peer: true,
        }
    }

    #[test]
    fn throughput_is_bytes_per_second() {
        let m = Metrics::compute(&stats(3000, 2000, &[100]), &ScoreWeights::default());
        assert_eq!(m.throughput, 1500.0);
    }

    #[test]
    fn avg_delay_is_arithmetic_mean() {
        let m = Metrics::compute(&stats(1000, 1000, &[100, 200, 300]), &ScoreWeights::default());
        let d = m.avg_delay.unwrap();
        assert!((d - 0.2).abs() < 1e-9);
    }

    #[test]
    fn empty_delays_yield_no_average_and_no_score() {
        // An empty transfer produces zero delay samples; that is valid.
        let m = Metrics::compute(&stats(0, 500, &[]), &ScoreWeights::default());
        assert_eq!(m.avg_delay, None);
        assert_eq!(m.score, None);
        assert_eq!(m.csv_line(), "0.0000000,0.0000000,0.0000000");
    }

    #[test]
    fn score_uses_reference_weighting() {
        let m = Metrics::compute(&stats(2000, 1000, &[500]), &ScoreWeights::default());
        // 0.3 × (2000/1000) + 0.7 / 0.5 = 0.6 + 1.4
        let score = m.score.unwrap();
        assert!((score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn custom_weights_are_honoured() {
        let w = ScoreWeights {
            throughput_weight: 1.0,
            delay_weight: 0.0,
            throughput_scale: 1.0,
        };
        let m = Metrics::compute(&stats(100, 1000, &[250]), &w);
        assert!((m.score.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn summary_mean_and_sample_stdev() {
        let mut s = RunSummary::default();
        for tp in [1000.0, 2000.0, 3000.0] {
            s.push(&Metrics {
                throughput: tp,
                avg_delay: Some(0.1),
                score: Some(1.0),
            });
        }
        assert_eq!(s.runs(), 3);
        assert!(s.mean_line().starts_with("2000.0000000,"));
        // Sample stdev of {1000, 2000, 3000} is 1000.
        assert!(s.stdev_line().unwrap().starts_with("1000.0000000,"));
    }

    #[test]
    fn stdev_needs_two_runs() {
        let mut s = RunSummary::default();
        assert_eq!(s.stdev_line(), None);
        s.push(&Metrics {
            throughput: 1.0,
            avg_delay: None,
            score: None,
        });
        assert_eq!(s.stdev_line(), None);
    }
}
