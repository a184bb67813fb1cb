use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const ID_PREFIX: &str = "client_";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One entry of an `initial_state` listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientState {
    pub id: String,
    pub position: Position,
}

/// Messages a client sends to the relay.
///
/// `Unknown` only ever comes out of [`decode`]; it has no wire form of its own.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    PositionUpdate {
        position: Position,
    },
    ChatMessage {
        #[serde(rename = "message")]
        text: String,
    },
    #[serde(skip_serializing)]
    Unknown {
        raw_type: String,
    },
}

impl InboundMessage {
    /// The wire `type` this message was decoded from.
    pub fn message_type(&self) -> &str {
        match self {
            InboundMessage::PositionUpdate { .. } => "position_update",
            InboundMessage::ChatMessage { .. } => "chat_message",
            InboundMessage::Unknown { raw_type } => raw_type,
        }
    }
}

/// Messages the relay sends to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    IdAssigned {
        id: String,
    },
    InitialState {
        states: Vec<ClientState>,
    },
    MoveUpdate {
        id: String,
        position: Position,
    },
    #[serde(rename = "chat_message_received")]
    ChatReceived {
        #[serde(rename = "sender")]
        sender_id: String,
        #[serde(rename = "message")]
        text: String,
    },
    Disconnected {
        id: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Parses one inbound text frame.
///
/// Unrecognized `type` values are not an error: they come back as
/// [`InboundMessage::Unknown`] so the caller can log and ignore them.
pub fn decode(raw: &str) -> Result<InboundMessage, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

    let Value::Object(mut fields) = value else {
        return Err(DecodeError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    };

    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        Some(other) => {
            return Err(DecodeError::MalformedPayload(format!(
                "`type` must be a string, got {}",
                other
            )))
        }
        None => return Err(DecodeError::MissingField("type")),
    };

    match kind.as_str() {
        "position_update" => Ok(InboundMessage::PositionUpdate {
            position: take_field(&mut fields, "position")?,
        }),
        "chat_message" => Ok(InboundMessage::ChatMessage {
            text: take_field(&mut fields, "message")?,
        }),
        _ => Ok(InboundMessage::Unknown { raw_type: kind }),
    }
}

fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<T, DecodeError> {
    let value = fields.remove(name).ok_or(DecodeError::MissingField(name))?;
    serde_json::from_value(value)
        .map_err(|e| DecodeError::MalformedPayload(format!("invalid `{}`: {}", name, e)))
}

/// Serializes an outbound message. Field order follows the declaration order,
/// with `type` first.
pub fn encode(message: &OutboundMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn encode_inbound(message: &InboundMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn decode_outbound(raw: &str) -> Result<OutboundMessage, DecodeError> {
    serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload(e.to_string()))
}
