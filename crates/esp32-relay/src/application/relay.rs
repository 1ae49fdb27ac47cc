//! Per-connection relay logic, independent of the transport.
//!
//! The supervisor owns one [`Connection`] per socket and feeds every inbound
//! frame to [`Relay::handle_text`].  The relay decodes it, classifies the
//! connection if it has no role yet, and hands the envelope to the
//! [`Router`].  When the socket ends, the supervisor calls
//! [`Relay::teardown`] exactly once.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::application::classifier::{classify, Classification};
use crate::application::codec::{decode, decode_bytes, CodecError};
use crate::application::peer::Peer;
use crate::application::registry::Registry;
use crate::application::router::Router;
use crate::domain::messages::Envelope;
use crate::domain::role::{Role, RoleState};

/// One live connection as the relay sees it: its handle and its role.
#[derive(Debug)]
pub struct Connection {
    peer: Peer,
    role: RoleState,
}

impl Connection {
    /// Creates an unclassified connection and the queue its writer drains.
    pub fn open(addr: SocketAddr) -> (Self, UnboundedReceiver<String>) {
        let (peer, rx) = Peer::new(addr);
        let conn = Self {
            peer,
            role: RoleState::Unassigned,
        };
        (conn, rx)
    }

    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    pub fn role(&self) -> RoleState {
        self.role
    }
}

/// The relay shared by every connection task of one server instance.
#[derive(Debug, Clone)]
pub struct Relay {
    router: Router,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    /// Creates a relay with an empty registry of its own.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(Registry::new()))
    }

    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            router: Router::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        self.router.registry()
    }

    /// Processes one text frame.  Malformed frames are logged and dropped;
    /// the connection stays open.
    pub fn handle_text(&self, conn: &mut Connection, raw: &str) {
        let decoded = decode(raw);
        self.handle_decoded(conn, decoded);
    }

    /// Processes one binary frame, which must carry UTF-8 JSON.
    pub fn handle_binary(&self, conn: &mut Connection, raw: &[u8]) {
        let decoded = decode_bytes(raw);
        self.handle_decoded(conn, decoded);
    }

    fn handle_decoded(&self, conn: &mut Connection, decoded: Result<Envelope, CodecError>) {
        match decoded {
            Ok(envelope) => self.handle_envelope(conn, envelope),
            Err(e) => warn!("{}: dropping malformed message: {e}", conn.peer),
        }
    }

    /// Classifies (if needed) and routes one envelope.
    pub fn handle_envelope(&self, conn: &mut Connection, envelope: Envelope) {
        debug!("{}: received {}", conn.peer, envelope.kind());

        if let Some(role) = conn.role.role() {
            self.router.route(&conn.peer, role, envelope);
            return;
        }

        match classify(&envelope) {
            Classification::Probe => self.router.pong(&conn.peer),
            Classification::Assign { role, send_status } => {
                if let Err(e) = conn.role.assign(role) {
                    // Unreachable while the role is checked above; keep the
                    // existing role rather than reclassifying.
                    warn!("{}: {e}", conn.peer);
                    return;
                }
                info!("{}: classified as {role}", conn.peer);
                match role {
                    Role::Device => self.router.register_device(&conn.peer),
                    Role::Html => {
                        self.router.register_html(&conn.peer, send_status);
                        if let Envelope::Position(cmd) = envelope {
                            self.router.route_position(&conn.peer, cmd);
                        }
                    }
                }
            }
        }
    }

    /// Releases whatever slot this connection holds and, if it was the
    /// device, tells the browser.
    ///
    /// Safe to call more than once: a second call finds the slot empty (or
    /// held by someone else) and does nothing.
    pub fn teardown(&self, conn: &Connection) {
        let id = conn.peer.id();
        let registry = self.router.registry();

        if registry.release_if_current(Role::Html, id) {
            info!("{}: html client disconnected", conn.peer);
        } else if registry.release_if_current(Role::Device, id) {
            info!("{}: device disconnected", conn.peer);
            self.router.device_left();
        } else {
            debug!("{}: closed without holding a slot", conn.peer);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
