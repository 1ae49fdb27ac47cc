//! esp32-relay library crate.
//!
//! A WebSocket relay that pairs exactly two peers: a browser control page
//! (the "HTML client") and one ESP32 device.  The relay itself holds no
//! business logic beyond deciding which role each socket plays and moving
//! messages between the two roles.
//!
//! # Architecture
//!
//! ```text
//! Browser (JSON over WebSocket)          ESP32 (JSON over WebSocket)
//!         ↕                                       ↕
//! [esp32-relay]
//!   ├── domain/           Pure types: envelopes, outbound messages, roles, RelayConfig
//!   ├── application/      Codec, registry, role classifier, router, per-connection relay
//!   └── infrastructure/
//!         ├── ws_server/  Accept loop (tokio-tungstenite)
//!         ├── supervisor/ Per-connection read loop, writer task, teardown guard
//!         └── config_file/ Optional TOML config file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`; the only runtime type it touches is
//!   the tokio channel behind [`application::Peer`].
//! - `infrastructure` owns sockets, tasks and files.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: classification and routing.
pub mod application;

/// Infrastructure layer: WebSocket server, connection supervisor, config file.
pub mod infrastructure;
