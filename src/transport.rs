//! Datagram transport abstraction.
//!
//! Sessions talk to the network through the [`Transport`] trait: send one
//! [`Packet`], receive one [`Packet`].  The only suspension point a session
//! ever uses is [`recv_deadline`] — a bounded wait that returns `None` when
//! the deadline elapses with nothing pending, so the caller's loop regains
//! control to re-evaluate timeouts.  A lapsed deadline is information, not
//! an error.
//!
//! [`UdpTransport`] is the production implementation over
//! `tokio::net::UdpSocket`.  Tests inject [`crate::sim::MemoryTransport`]
//! instead; all protocol logic is exercised without a real socket.
//!
//! The transport is exclusively owned by its session (methods take
//! `&mut self`); the socket closes when the session drops it, on every exit
//! path.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::packet::{Packet, PacketError, MAX_DATAGRAM};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A bidirectional, unreliable, unordered datagram channel speaking
/// [`Packet`]s.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Transmit one packet.  Delivery is not guaranteed.
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError>;

    /// Wait for the next inbound packet.
    ///
    /// This may block indefinitely; sessions always go through
    /// [`recv_deadline`] instead of calling it directly.
    async fn recv(&mut self) -> Result<Packet, TransportError>;
}

/// Receive with a deadline: `Ok(None)` means the deadline elapsed with no
/// packet available.
///
/// A zero deadline polls exactly once, which the sliding-window drain phase
/// uses to pick up packets that are already queued without blocking.
pub async fn recv_deadline<T: Transport>(
    transport: &mut T,
    deadline: Duration,
) -> Result<Option<Packet>, TransportError> {
    match timeout(deadline, transport.recv()).await {
        Ok(result) => result.map(Some),
        Err(_elapsed) => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can arise from transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
    /// The received datagram could not be decoded as a valid packet.
    Codec(PacketError),
    /// The peer endpoint is gone (in-memory transports only).
    Disconnected,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "transport I/O error: {e}"),
            Self::Codec(e) => write!(f, "packet decode error: {e}"),
            Self::Disconnected => write!(f, "peer endpoint disconnected"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<PacketError> for TransportError {
    fn from(e: PacketError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// UdpTransport
// ---------------------------------------------------------------------------

/// The production transport: one UDP socket, connected to the receiver's
/// well-known address.
#[derive(Debug)]
pub struct UdpTransport {
    /// Address this socket is bound to (filled in after the OS assigns an
    /// ephemeral port when binding to port 0).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl UdpTransport {
    /// Bind to `local_addr` and connect to the receiver at `peer`.
    ///
    /// Connecting filters inbound datagrams to the peer at the socket level,
    /// so sessions never see strangers' packets.
    pub async fn bind(local_addr: SocketAddr, peer: SocketAddr) -> Result<Self, TransportError> {
        let inner = UdpSocket::bind(local_addr).await?;
        inner.connect(peer).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }
}

impl Transport for UdpTransport {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let bytes = packet.encode()?;
        self.inner.send(&bytes).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let n = self.inner.recv(&mut buf).await?;
        Ok(Packet::decode(&buf[..n])?)
    }
}
