//! Handle to one live connection.
//!
//! A [`Peer`] is what the registry stores and what the router sends to.  It
//! does not own the socket: outbound frames go into an unbounded queue that
//! the connection's writer task drains into the WebSocket sink.  Cloning a
//! `Peer` is cheap and every clone refers to the same connection.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::codec::{encode, CodecError};
use crate::domain::messages::OutboundMsg;

/// Identity of a connection, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group of the UUID is plenty to tell sessions apart in logs.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Failure to hand a frame to a connection.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Encode(#[from] CodecError),

    /// The connection's writer task has ended (socket closed or failed).
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// Cloneable handle to a live connection's outbound side.
#[derive(Debug, Clone)]
pub struct Peer {
    id: ConnectionId,
    addr: SocketAddr,
    tx: mpsc::UnboundedSender<String>,
}

impl Peer {
    /// Creates a handle and the receiving end its writer task drains.
    pub fn new(addr: SocketAddr) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let peer = Self {
            id: ConnectionId::new(),
            addr,
            tx,
        };
        (peer, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Encodes `msg` and queues it for this connection.
    ///
    /// # Errors
    ///
    /// [`SendError::Closed`] once the writer task is gone.
    pub fn send(&self, msg: &OutboundMsg) -> Result<(), SendError> {
        let text = encode(msg)?;
        self.send_text(text)
    }

    /// Queues an already-encoded frame (used to forward commands verbatim).
    ///
    /// # Errors
    ///
    /// [`SendError::Closed`] once the writer task is gone.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        self.tx.send(text).map_err(|_| SendError::Closed(self.id))
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Peer {}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.addr)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn test_send_queues_encoded_frame() {
        // Arrange
        let (peer, mut rx) = Peer::new(addr());

        // Act
        peer.send(&OutboundMsg::Pong).unwrap();

        // Assert
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_closed() {
        let (peer, rx) = Peer::new(addr());
        drop(rx);

        let err = peer.send(&OutboundMsg::Pong).unwrap_err();

        assert!(matches!(err, SendError::Closed(id) if id == peer.id()));
    }

    #[test]
    fn test_clones_are_equal_distinct_peers_are_not() {
        let (a, _rx_a) = Peer::new(addr());
        let (b, _rx_b) = Peer::new(addr());

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_connection_id_display_is_short() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string().len(), 8);
    }
}
