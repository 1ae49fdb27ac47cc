//! Connection supervisor: the lifecycle of one accepted socket.
//!
//! ```text
//! Connecting ──handshake ok──► Open ──close / EOF / error / idle──► Closed
//!      │                                                              ▲
//!      └──handshake failed or timed out (never registered) ───────────┘
//! ```
//!
//! While `Open`, two halves run side by side:
//!
//! - **Reader**: pulls frames off the socket in arrival order and hands each
//!   one to [`Relay`].  A bad frame is logged and skipped.
//! - **Writer**: drains the connection's outbound queue into the socket.
//!   Other connections enqueue here through the [`Peer`] handle, so a slow
//!   socket never blocks the sender's read loop.
//!
//! The session ends as soon as either half finishes.  Teardown lives in
//! [`Session`]'s `Drop`, so it runs exactly once whether the session ended
//! normally, with an error, or because its task was cancelled.  Once the
//! slot is released the writer flushes the frames still queued and closes
//! the socket with a proper close handshake, bounded by the configured close
//! timeout.
//!
//! [`Peer`]: crate::application::Peer

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async_with_config,
    tungstenite::{protocol::WebSocketConfig, Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::application::{Connection, Relay};
use crate::domain::config::RelayConfig;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// Entry point of each per-connection task spawned by the accept loop.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    relay: Arc<Relay>,
    config: Arc<RelayConfig>,
) {
    match run_connection(stream, peer_addr, relay, &config).await {
        Ok(()) => info!("connection {peer_addr} closed"),
        Err(e) => warn!("connection {peer_addr} rejected: {e:#}"),
    }
}

/// Upgrades the socket and runs the session until either half ends.
///
/// This function:
///
/// 1. Completes the WebSocket upgrade, bounded by `handshake_timeout`.
/// 2. Registers a fresh unclassified [`Connection`] and starts its writer.
/// 3. Reads frames until the peer leaves, the transport fails or the idle
///    timeout fires.
/// 4. Tears the connection down, then gives the writer up to
///    `close_timeout` to deliver what is still queued and finish the close
///    handshake.
///
/// # Errors
///
/// Only the handshake can fail; once the session is open every problem is
/// logged and ends the session normally.
async fn run_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    relay: Arc<Relay>,
    config: &RelayConfig,
) -> anyhow::Result<()> {
    // ── Step 1: Complete the WebSocket handshake ───────────────────────────────
    //
    // A socket that never finishes the upgrade is dropped here and never
    // reaches the registry.
    let ws_stream = accept_websocket(stream, peer_addr, config.handshake_timeout).await?;

    // ── Step 2: Open the session ───────────────────────────────────────────────
    //
    // `ws_tx` moves into the writer task; `ws_rx` stays with the reader loop
    // below.  The outbound queue is the only way anything reaches `ws_tx`.
    let (ws_tx, ws_rx) = ws_stream.split();

    let (conn, outbound_rx) = Connection::open(peer_addr);
    info!("connection {peer_addr} open as {}", conn.peer().id());
    let mut session = Session { relay, conn };

    let label = session.conn.peer().to_string();
    let mut writer = tokio::spawn(write_outbound(ws_tx, outbound_rx, label.clone()));

    // ── Step 3: Run until either half ends ─────────────────────────────────────
    //
    // The writer only ends on its own when a send fails; the socket is dead
    // then and there is nothing left to flush.
    let writer_failed = tokio::select! {
        _ = read_inbound(ws_rx, &mut session, config.idle_timeout) => false,
        _ = &mut writer => {
            debug!("{label}: writer ended");
            true
        }
    };

    // ── Step 4: Tear down, then close the socket ───────────────────────────────
    //
    // Teardown releases this connection's slot, which drops the registry's
    // `Peer` clone.  With the session's own handle gone too, the outbound
    // queue closes: the writer drains what is left and sends (or answers) the
    // close frame.
    drop(session);

    if !writer_failed && timeout(config.close_timeout, &mut writer).await.is_err() {
        debug!("{label}: close did not finish within {:?}", config.close_timeout);
        writer.abort();
    }
    Ok(())
}

/// Performs the server side of the WebSocket upgrade.
///
/// No subprotocol, no compression, and no message or frame size cap.
async fn accept_websocket(
    stream: TcpStream,
    peer_addr: SocketAddr,
    handshake_timeout: Duration,
) -> anyhow::Result<WebSocketStream<TcpStream>> {
    // Frames of any size are accepted.
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = None;
    ws_config.max_frame_size = None;

    timeout(handshake_timeout, accept_async_with_config(stream, Some(ws_config)))
        .await
        .with_context(|| {
            format!("WebSocket handshake with {peer_addr} timed out after {handshake_timeout:?}")
        })?
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))
}

/// A connection in the `Open` state.  Dropping it is the teardown.
struct Session {
    relay: Arc<Relay>,
    conn: Connection,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.relay.teardown(&self.conn);
    }
}

/// Reads frames until the peer goes away, the transport fails, or the
/// optional idle timeout fires.
async fn read_inbound(mut ws_rx: WsSource, session: &mut Session, idle_timeout: Option<Duration>) {
    loop {
        // `next()` yields `None` once the stream is closed.  Without an idle
        // limit a quiet peer is waited for indefinitely.
        let next = match idle_timeout {
            Some(limit) => match timeout(limit, ws_rx.next()).await {
                Ok(next) => next,
                Err(_) => {
                    info!("{}: idle for {limit:?}, closing", session.conn.peer());
                    break;
                }
            },
            None => ws_rx.next().await,
        };

        let ws_msg = match next {
            Some(Ok(msg)) => msg,
            // A peer vanishing without a close frame surfaces as a protocol
            // error; treat it like any other disconnect.
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("{}: socket closed", session.conn.peer());
                break;
            }
            Some(Err(e)) => {
                warn!("{}: receive error: {e}", session.conn.peer());
                break;
            }
            None => {
                debug!("{}: stream ended", session.conn.peer());
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(text) => session.relay.handle_text(&mut session.conn, &text),
            WsMessage::Binary(data) => session.relay.handle_binary(&mut session.conn, &data),
            // Protocol-level ping/pong is answered by tungstenite itself.
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
            // tungstenite queues the close reply itself; the writer flushes it.
            WsMessage::Close(frame) => {
                debug!("{}: close frame {frame:?}", session.conn.peer());
                break;
            }
            WsMessage::Frame(_) => {}
        }
    }
}

/// Drains the outbound queue into the socket, then closes it.
///
/// Runs until every [`Peer`] handle for this connection is gone (normal end)
/// or a send fails (the socket is already dead).
///
/// [`Peer`]: crate::application::Peer
async fn write_outbound(mut ws_tx: WsSink, mut outbound_rx: UnboundedReceiver<String>, label: String) {
    while let Some(text) = outbound_rx.recv().await {
        if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
            warn!("{label}: send failed: {e}");
            return;
        }
    }

    // If the peer closed first, tungstenite has already queued the reply and
    // `close` only flushes it; otherwise this sends our own close frame.
    if let Err(e) = ws_tx.close().await {
        debug!("{label}: close handshake incomplete: {e}");
    }
}
