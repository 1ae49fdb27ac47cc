//! Relay configuration types.
//!
//! [`RelayConfig`] is assembled once at startup from CLI arguments, an
//! optional TOML file and the defaults below, then shared read-only with
//! every connection task.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Port the relay listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Upper bound on the WebSocket opening handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on flushing queued frames and the closing handshake once a
/// session ends.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use esp32_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert!(cfg.idle_timeout.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Address the WebSocket listener binds to.  Both the browser and the
    /// device connect to this single endpoint.
    pub bind_addr: SocketAddr,

    /// Maximum time a freshly accepted TCP connection may take to complete
    /// the WebSocket upgrade.  Slower sockets are dropped before they reach
    /// the supervisor.
    pub handshake_timeout: Duration,

    /// How long a finished session may spend delivering frames still in its
    /// outbound queue and completing the WebSocket close handshake.  After
    /// that the socket is dropped.
    pub close_timeout: Duration,

    /// Close a connection that has not sent any frame for this long.
    ///
    /// `None` keeps idle connections open forever, which is the default: the
    /// device and the browser are expected to reconnect on their own and the
    /// relay does not second-guess a quiet link.
    pub idle_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    /// | Field             | Default        |
    /// |-------------------|----------------|
    /// | bind_addr         | `0.0.0.0:8080` |
    /// | handshake_timeout | 10 seconds     |
    /// | close_timeout     | 10 seconds     |
    /// | idle_timeout      | disabled       |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            idle_timeout: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
