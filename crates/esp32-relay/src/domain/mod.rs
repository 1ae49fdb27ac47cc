//! Domain layer for esp32-relay.
//!
//! Types in here describe the relay's vocabulary (what a message looks like,
//! which roles exist, how the relay is configured) without any dependency on
//! sockets or the async runtime.

pub mod config;
pub mod messages;
pub mod role;

pub use config::RelayConfig;
pub use messages::{Envelope, OutboundMsg, PositionCommand};
pub use role::{Role, RoleError, RoleState};
