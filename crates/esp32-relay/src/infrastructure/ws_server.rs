//! WebSocket server: the accept loop.
//!
//! Binds one TCP listener that both the browser and the device connect to,
//! and spawns a supervisor task per accepted socket.  The loop survives any
//! individual connection failing; it only stops when the shutdown flag is
//! cleared.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info};

use crate::application::Relay;
use crate::domain::config::RelayConfig;
use crate::infrastructure::supervisor::handle_connection;

/// How often the accept loop wakes up to look at the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    // Binding is the only fatal step; after this every failure is scoped to
    // a single connection.
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind relay listener on {}", config.bind_addr))?;

    info!("relay listening on {}", config.bind_addr);

    // One relay (and so one registry) per server.  Both it and the config are
    // behind `Arc` because every connection task holds its own reference.
    serve(listener, Arc::new(Relay::new()), Arc::new(config), running).await;
    Ok(())
}

/// Accept loop over an already-bound listener.
///
/// Every connection shares `relay`; pass a fresh [`Relay`] per server so
/// independent servers never see each other's peers.
pub async fn serve(
    listener: TcpListener,
    relay: Arc<Relay>,
    config: Arc<RelayConfig>,
    running: Arc<AtomicBool>,
) {
    loop {
        // Check the shutdown flag before each accept attempt.
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A bare `accept()` would block until the next client arrives, so the
        // flag above would go unnoticed on an idle server.
        match timeout(SHUTDOWN_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new connection from {peer_addr}");
                let relay = Arc::clone(&relay);
                let config = Arc::clone(&config);
                // One task per socket: a slow or stuck peer never holds up
                // the accept loop or the other connection.
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, relay, config).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep accepting.
                error!("accept error: {e}");
            }
            Err(_) => {
                // No new connection in the last poll interval.
            }
        }
    }
}
