//! Infrastructure layer for esp32-relay.
//!
//! Everything that touches the outside world lives here:
//!
//! - Binding the TCP listener and accepting sockets (`ws_server`)
//! - The WebSocket handshake, per-connection read loop, writer task and
//!   teardown (`supervisor`)
//! - Reading the optional TOML configuration file (`config_file`)

pub mod config_file;
pub mod supervisor;
pub mod ws_server;

pub use config_file::{ConfigError, FileConfig};
pub use ws_server::{run_server, serve};
