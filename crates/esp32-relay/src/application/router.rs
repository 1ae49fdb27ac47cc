//! Router: moves classified envelopes between the two roles.
//!
//! Every send goes through [`Router::deliver`], which logs and swallows
//! failures.  A dead destination must never break the sender's read loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::peer::Peer;
use crate::application::registry::Registry;
use crate::domain::messages::{Envelope, OutboundMsg, PositionCommand};
use crate::domain::role::Role;

/// Dispatches envelopes using the shared [`Registry`].
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Routes an envelope from a connection whose role is already fixed.
    ///
    /// Anything not listed below is ignored, including a device sending a
    /// position command and a browser sending a result report.
    ///
    /// | From   | Envelope   | Action                                     |
    /// |--------|------------|--------------------------------------------|
    /// | any    | `Ping`     | pong to sender                             |
    /// | Html   | `Position` | forward to device, or error to sender      |
    /// | Device | `Result`   | `movement_result` to browser, or drop      |
    pub fn route(&self, from: &Peer, role: Role, envelope: Envelope) {
        match (role, envelope) {
            (_, Envelope::Ping) => self.pong(from),
            (Role::Html, Envelope::Position(cmd)) => self.route_position(from, cmd),
            (Role::Device, Envelope::Result(result)) => self.route_result(result),
            (role, envelope) => {
                debug!("{from}: ignoring {} from {role} connection", envelope.kind());
            }
        }
    }

    /// Answers a ping on the connection that sent it.
    pub fn pong(&self, to: &Peer) {
        self.deliver(to, &OutboundMsg::Pong);
    }

    /// Forwards a position command to the device unchanged, or tells the
    /// sender there is no device.
    pub fn route_position(&self, from: &Peer, cmd: PositionCommand) {
        match self.registry.get(Role::Device) {
            Some(device) => {
                debug!(
                    "{from}: position row={} col={} → device {device}",
                    cmd.row, cmd.col
                );
                if let Err(e) = device.send_text(cmd.raw) {
                    warn!("failed to forward position to device: {e}");
                }
            }
            None => {
                debug!("{from}: position dropped, no device registered");
                self.deliver(from, &OutboundMsg::device_missing());
            }
        }
    }

    /// Reports a device outcome to the browser; dropped when there is none.
    pub fn route_result(&self, result: bool) {
        match self.registry.get(Role::Html) {
            Some(html) => self.deliver(&html, &OutboundMsg::movement_result(result)),
            None => debug!("movement result {result} dropped, no html client registered"),
        }
    }

    /// Installs `device` in the device slot and tells the browser.
    pub fn register_device(&self, device: &Peer) {
        if let Some(previous) = self.registry.claim_device(device.clone()) {
            info!("device {device} replaces {previous}");
        } else {
            info!("device {device} registered");
        }
        if let Some(html) = self.registry.get(Role::Html) {
            self.deliver(&html, &OutboundMsg::device_status(true));
        }
    }

    /// Installs `html` in the browser slot, optionally replying with the
    /// device's current connectivity.
    pub fn register_html(&self, html: &Peer, send_status: bool) {
        if let Some(previous) = self.registry.claim_html(html.clone()) {
            info!("html client {html} replaces {previous}");
        } else {
            info!("html client {html} registered");
        }
        if send_status {
            let connected = self.registry.is_occupied(Role::Device);
            self.deliver(html, &OutboundMsg::device_status(connected));
        }
    }

    /// Tells the browser, if any, that the device went away.
    pub fn device_left(&self) {
        if let Some(html) = self.registry.get(Role::Html) {
            self.deliver(&html, &OutboundMsg::device_disconnected());
        }
    }

    /// Sends `msg` to `to`, logging instead of propagating a failure.
    pub fn deliver(&self, to: &Peer, msg: &OutboundMsg) {
        match to.send(msg) {
            Ok(()) => debug!("sent {} to {to}", msg.kind()),
            Err(e) => warn!("failed to send {} to {to}: {e}", msg.kind()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
