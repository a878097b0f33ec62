//! Receiver-process orchestration.
//!
//! The measurement workflow runs the sender against a network-impairment
//! simulator that lives in a Docker container and plays the receiver role.
//! Because the impairment is random, each measurement restarts the container
//! for a clean slate.  This module owns exactly that lifecycle:
//!
//! 1. force-remove any stale container with the same name,
//! 2. start a fresh detached container (`NET_ADMIN` so it can impair its own
//!    traffic, the protocol port published as UDP),
//! 3. wait a settle period for the receiver to come up,
//! 4. after the run, force-remove the container again.
//!
//! All protocol work happens elsewhere; this is process plumbing only.

use std::time::Duration;

use tokio::process::Command;

/// How a receiver container is launched.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Image to run, e.g. `ecs152a/simulator`.
    pub image: String,
    /// Container name; reused across runs so stale instances can be removed.
    pub container_name: String,
    /// UDP port published to the host (the receiver's well-known port).
    pub udp_port: u16,
    /// Optional `host:container` bind mount handed to `-v`.
    pub volume: Option<String>,
    /// Grace period after start before the receiver is assumed ready.
    pub settle: Duration,
}

impl ReceiverConfig {
    /// Config for `image` with the reference port and settle delay.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            container_name: "udp-courier-receiver".to_string(),
            udp_port: 5001,
            volume: None,
            settle: Duration::from_secs(3),
        }
    }
}

/// Manages one receiver container across a run.
#[derive(Debug)]
pub struct ReceiverProcess {
    cfg: ReceiverConfig,
}

impl ReceiverProcess {
    pub fn new(cfg: ReceiverConfig) -> Self {
        Self { cfg }
    }

    /// Start a fresh receiver container and wait for it to settle.
    pub async fn start(&self) -> Result<(), HarnessError> {
        // A leftover container from an interrupted run would collide on the
        // name and the port.
        self.remove_container().await;

        let port = format!("{0}:{0}/udp", self.cfg.udp_port);
        let name = format!("--name={}", self.cfg.container_name);
        let mut cmd = Command::new("docker");
        cmd.args(["run", "--detach", "--rm", "--cap-add=NET_ADMIN", &name, "-p", &port]);
        if let Some(volume) = &self.cfg.volume {
            cmd.args(["-v", volume]);
        }
        cmd.arg(&self.cfg.image);

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(HarnessError::Docker(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        log::info!(
            "receiver container {} started; settling for {:?}",
            self.cfg.container_name,
            self.cfg.settle
        );
        tokio::time::sleep(self.cfg.settle).await;
        Ok(())
    }

    /// Tear the receiver container down.  Best-effort: a container that
    /// already exited is not an error.
    pub async fn stop(&self) {
        self.remove_container().await;
    }

    async fn remove_container(&self) {
        let result = Command::new("docker")
            .args(["rm", "-f", &self.cfg.container_name])
            .output()
            .await;
        match result {
            Ok(output) if output.status.success() => {
                log::debug!("removed container {}", self.cfg.container_name);
            }
            Ok(_) => {} // nothing to remove
            Err(e) => log::debug!("docker rm failed: {e}"),
        }
    }
}

/// Errors that can arise while managing the receiver process.
#[derive(Debug)]
pub enum HarnessError {
    /// Could not execute the docker client at all.
    Io(std::io::Error),
    /// Docker ran but refused; captured stderr.
    Docker(String),
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to run docker: {e}"),
            Self::Docker(msg) => write!(f, "docker error: {msg}"),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
