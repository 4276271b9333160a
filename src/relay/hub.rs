//! Relay routing table
//!
//! Tracks which connection is the actor for each identifier and which actor
//! each controller connection last reached. Transport-agnostic: connections
//! are anything implementing [`Peer`].

use std::collections::HashMap;
use std::fmt;

use super::protocol::{ClientMessage, Forwarded, ServerReply};

/// Identifies one client connection for the lifetime of the relay
pub type ConnectionId = u64;

/// The sending half of a client connection
pub trait Peer {
    /// Still accepting messages
    fn is_open(&self) -> bool;

    /// Queue a text frame. Returns false if the connection is gone.
    fn send_text(&self, text: String) -> bool;
}

/// Why a controller message could not be delivered
#[derive(Debug)]
pub enum RelayError {
    /// No actor registered under the identifier
    UnknownActor(String),
    /// The registered actor's connection is closed
    ActorDisconnected(String),
    /// Not a relay message; dropped without a reply
    Malformed(serde_json::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::UnknownActor(_) => write!(f, "Invalid Game ID"),
            RelayError::ActorDisconnected(_) => write!(f, "Game Disconnected"),
            RelayError::Malformed(e) => write!(f, "Malformed message: {}", e),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// What a successfully handled message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Connection bound as the actor for the identifier
    Registered(String),
    /// Payload delivered to the actor for the identifier
    Forwarded(String),
    /// Controller message without a payload
    Ignored,
}

pub struct RelayHub<P> {
    peers: HashMap<ConnectionId, P>,
    actors: HashMap<String, ConnectionId>,
    /// Actor each controller connection was last acknowledged for
    pairings: HashMap<ConnectionId, String>,
}

impl<P> Default for RelayHub<P> {
    fn default() -> Self {
        Self {
            peers: HashMap::new(),
            actors: HashMap::new(),
            pairings: HashMap::new(),
        }
    }
}

impl<P: Peer> RelayHub<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, id: ConnectionId, peer: P) {
        self.peers.insert(id, peer);
    }

    /// Forget a connection, its actor bindings and its controller pairing
    pub fn disconnect(&mut self, id: ConnectionId) {
        self.peers.remove(&id);
        self.actors.retain(|_, conn| *conn != id);
        self.pairings.remove(&id);
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Handle one text frame from `from`.
    ///
    /// Delivery failures are reported to the sender as an error reply and
    /// also returned; malformed frames are only returned.
    pub fn handle_text(&mut self, from: ConnectionId, text: &str) -> Result<Routed, RelayError> {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Ignoring message from connection {}: {}", from, e);
                return Err(RelayError::Malformed(e));
            }
        };

        match message {
            ClientMessage::Actor { actor_id } => {
                // Last registration wins
                self.actors.insert(actor_id.clone(), from);
                log::info!("Actor {} registered on connection {}", actor_id, from);
                Ok(Routed::Registered(actor_id))
            }
            ClientMessage::Controller { payload, .. } if payload.is_null() => Ok(Routed::Ignored),
            ClientMessage::Controller { actor_id, payload } => {
                let result = self.forward(from, &actor_id, payload);
                if let Err(e) = &result {
                    log::debug!("Controller {} -> {}: {}", from, actor_id, e);
                    self.reply(
                        from,
                        &ServerReply::Error {
                            message: e.to_string(),
                        },
                    );
                }
                result
            }
        }
    }

    fn forward(
        &mut self,
        from: ConnectionId,
        actor_id: &str,
        payload: serde_json::Value,
    ) -> Result<Routed, RelayError> {
        let conn = self
            .actors
            .get(actor_id)
            .copied()
            .ok_or_else(|| RelayError::UnknownActor(actor_id.to_string()))?;

        let actor = self
            .peers
            .get(&conn)
            .filter(|peer| peer.is_open())
            .ok_or_else(|| RelayError::ActorDisconnected(actor_id.to_string()))?;

        let text = serde_json::to_string(&Forwarded::from_controller(payload))
            .map_err(RelayError::Malformed)?;
        if !actor.send_text(text) {
            return Err(RelayError::ActorDisconnected(actor_id.to_string()));
        }
        log::debug!("Forwarded controller {} -> actor {}", from, actor_id);

        if self.pairings.get(&from).map(String::as_str) != Some(actor_id) {
            self.pairings.insert(from, actor_id.to_string());
            self.reply(from, &ServerReply::Connected);
        }

        Ok(Routed::Forwarded(actor_id.to_string()))
    }

    fn reply(&self, to: ConnectionId, reply: &ServerReply) {
        let Some(peer) = self.peers.get(&to) else {
            return;
        };
        if let Ok(text) = serde_json::to_string(reply) {
            peer.send_text(text);
        }
    }
}
