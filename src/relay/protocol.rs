//! JSON wire format shared by the relay, the actor and the controller

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Register the sending connection as the game for `actor_id`
    Actor {
        #[serde(rename = "actorId")]
        actor_id: String,
    },
    /// Forward `payload` to the game registered as `actor_id`
    Controller {
        #[serde(rename = "actorId")]
        actor_id: String,
        #[serde(default)]
        payload: Value,
    },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// What the actor receives for each forwarded controller message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forwarded {
    pub from: String,
    pub payload: Value,
}

impl Forwarded {
    pub fn from_controller(payload: Value) -> Self {
        Self {
            from: "controller".to_string(),
            payload,
        }
    }
}

/// Relay replies to a controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerReply {
    /// First successful forward to an actor
    Connected,
    Error { message: String },
}

/// Game commands a controller can send
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControllerCommand {
    /// Start a new session (or restart after a crash)
    Start,
    /// Jump, optionally with a launch velocity measured by the controller
    Jump { velocity: Option<f64> },
}

#[derive(Deserialize)]
struct ActionPayload {
    action: String,
    #[serde(default)]
    velocity: Option<f64>,
}

impl ControllerCommand {
    /// Interpret a forwarded payload: `"start"`, `"jump"` or `{action, velocity?}`
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let (action, velocity) = match payload {
            Value::String(action) => (action.clone(), None),
            Value::Object(_) => {
                let parsed = ActionPayload::deserialize(payload).ok()?;
                (parsed.action, parsed.velocity)
            }
            _ => return None,
        };
        match action.as_str() {
            "start" => Some(ControllerCommand::Start),
            "jump" => Some(ControllerCommand::Jump { velocity }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_actor_registration() {
        let msg = ClientMessage::parse(r#"{"type":"actor","actorId":"42"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Actor {
                actor_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_parse_controller_message() {
        let msg =
            ClientMessage::parse(r#"{"type":"controller","actorId":"42","payload":"start"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Controller {
                actor_id: "42".to_string(),
                payload: json!("start")
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(ClientMessage::parse(r#"{"type":"spectator","actorId":"42"}"#).is_err());
        assert!(ClientMessage::parse("not json").is_err());
    }

    #[test]
    fn test_wire_shapes() {
        let forwarded = serde_json::to_value(Forwarded::from_controller(json!("start"))).unwrap();
        assert_eq!(forwarded, json!({"from": "controller", "payload": "start"}));

        let connected = serde_json::to_value(ServerReply::Connected).unwrap();
        assert_eq!(connected, json!({"type": "connected"}));

        let error = serde_json::to_value(ServerReply::Error {
            message: "Invalid Game ID".to_string(),
        })
        .unwrap();
        assert_eq!(error, json!({"type": "error", "message": "Invalid Game ID"}));
    }

    #[test]
    fn test_controller_commands_from_payload() {
        assert_eq!(
            ControllerCommand::from_payload(&json!("start")),
            Some(ControllerCommand::Start)
        );
        assert_eq!(
            ControllerCommand::from_payload(&json!("jump")),
            Some(ControllerCommand::Jump { velocity: None })
        );
        assert_eq!(
            ControllerCommand::from_payload(&json!({"action": "jump", "velocity": 12.5})),
            Some(ControllerCommand::Jump {
                velocity: Some(12.5)
            })
        );
        assert_eq!(ControllerCommand::from_payload(&json!({"action": "fly"})), None);
        assert_eq!(ControllerCommand::from_payload(&json!(7)), None);
    }
}
