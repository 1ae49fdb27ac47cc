//! Application layer for esp32-relay.
//!
//! Knows *what* happens to each message: decode it, decide the sender's
//! role, and route it to the other peer.  Sockets and task spawning live in
//! the infrastructure layer.

pub mod classifier;
pub mod codec;
pub mod peer;
pub mod registry;
pub mod relay;
pub mod router;

pub use classifier::{classify, Classification};
pub use codec::{decode, encode, CodecError};
pub use peer::{ConnectionId, Peer, SendError};
pub use registry::Registry;
pub use relay::{Connection, Relay};
pub use router::Router;
