//! Remote controller relay
//!
//! A second device (the controller) steers a running game (the actor)
//! through a small relay server. Actors register under an identifier;
//! controllers address commands to that identifier and the relay forwards
//! them verbatim.
//!
//! The routing table and wire format are plain Rust and always available.
//! The tokio WebSocket server needs the `relay` feature:
//! ```sh
//! cargo run --features relay --bin rex-relay -- 3000
//! ```

pub mod hub;
pub mod protocol;

#[cfg(feature = "relay")]
mod server;

pub use hub::{ConnectionId, Peer, RelayError, RelayHub, Routed};
pub use protocol::{ClientMessage, ControllerCommand, Forwarded, ServerReply};

#[cfg(feature = "relay")]
pub use server::start_relay_server;

/// Port the relay listens on, and the one browser actors dial by default
pub const DEFAULT_PORT: u16 = 3000;
