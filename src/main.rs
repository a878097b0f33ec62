//! Entry point for `udp-courier`.
//!
//! Parses CLI arguments and dispatches into one of the two sender variants.
//! All protocol work is delegated to library modules; `main.rs` owns only
//! process setup (logging, argument parsing), the per-run driver, and the
//! N-run averaging loop.
//!
//! Output per run is a single CSV line `throughput,avg_delay,metric`; with
//! `--runs > 1` a mean line and a sample-stdev line follow.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use udp_courier::harness::{ReceiverConfig, ReceiverProcess};
use udp_courier::metrics::{Metrics, RunSummary, ScoreWeights};
use udp_courier::session::{SessionConfig, SessionStats};
use udp_courier::sliding::SlidingSession;
use udp_courier::stop_wait::StopWaitSession;
use udp_courier::transport::UdpTransport;

/// Reliable byte-stream delivery over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// One segment in flight at a time.
    StopWait {
        #[command(flatten)]
        common: Common,
    },
    /// A fixed window of segments in flight.
    Sliding {
        #[command(flatten)]
        common: Common,

        /// Window size in segments.
        #[arg(short, long, default_value_t = 100)]
        window: usize,
    },
}

#[derive(Args)]
struct Common {
    /// File whose bytes are delivered.
    #[arg(short, long)]
    file: PathBuf,

    /// Receiver's well-known address.
    #[arg(long, default_value = "127.0.0.1:5001")]
    receiver: SocketAddr,

    /// Local address to bind (port 0 lets the OS choose).
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// Repeat the transfer this many times and report mean/stdev.
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Manage a Dockerised impairment receiver with this image around each
    /// run.
    #[arg(long)]
    docker_image: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let (common, window) = match &cli.mode {
        Mode::StopWait { common } => (common, None),
        Mode::Sliding { common, window } => (common, Some(*window)),
    };

    let payload = std::fs::read(&common.file)?;
    log::info!(
        "delivering {} bytes from {} to {}",
        payload.len(),
        common.file.display(),
        common.receiver
    );

    let receiver_proc = common
        .docker_image
        .as_ref()
        .map(|image| ReceiverProcess::new(ReceiverConfig::new(image.clone())));

    let weights = ScoreWeights::default();
    let mut summary = RunSummary::default();

    for run in 0..common.runs {
        if let Some(proc) = &receiver_proc {
            proc.start().await?;
        }

        let result = run_once(&payload, common, window).await;

        if let Some(proc) = &receiver_proc {
            proc.stop().await;
        }

        let stats = result?;
        log::info!(
            "run {}: {} retransmission(s), peer close {}",
            run + 1,
            stats.retransmissions,
            if stats.closed_by_peer { "observed" } else { "missed" }
        );
        let metrics = Metrics::compute(&stats, &weights);
        println!("{}", metrics.csv_line());
        summary.push(&metrics);
    }

    if summary.runs() > 1 {
        println!("{}", summary.mean_line());
        if let Some(stdev) = summary.stdev_line() {
            println!("{stdev}");
        }
    }
    Ok(())
}

/// One complete session over a fresh socket.
async fn run_once(
    payload: &[u8],
    common: &Common,
    window: Option<usize>,
) -> Result<SessionStats, Box<dyn std::error::Error>> {
    let transport = UdpTransport::bind(common.bind, common.receiver).await?;
    let cfg = SessionConfig::default();
    let stats = match window {
        None => StopWaitSession::new(transport, cfg).run(payload).await?,
        Some(n) => SlidingSession::new(transport, n, cfg).run(payload).await?,
    };
    Ok(stats)
}
