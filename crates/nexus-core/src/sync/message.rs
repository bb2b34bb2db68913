//! Wire message types
//!
//! Two layers travel over the relay connection:
//!
//! - **Frames** (`ClientFrame`, `ServerFrame`): the relay protocol itself,
//!   JSON text frames tagged by `type`.
//! - **Events** (`WireEvent`): what collaborators say to each other. The
//!   relay forwards them as an opaque `(event, payload)` pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::presence::{CursorPosition, Participant};

/// Identifier of a connected client
pub type PeerId = String;

/// Errors encoding or decoding wire messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected message shape: {0}")]
    UnexpectedShape(String),
}

/// Frames sent to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Subscribe to a session
    Join {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "senderId")]
        sender_id: PeerId,
    },

    /// Publish an event to the other members
    Publish {
        #[serde(rename = "senderId")]
        sender_id: PeerId,
        event: String,
        #[serde(default)]
        payload: Value,
    },

    /// Leave the session
    Leave {
        #[serde(rename = "senderId")]
        sender_id: PeerId,
    },
}

/// Frames received from the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Join acknowledgment
    Joined {
        #[serde(rename = "sessionId")]
        session_id: String,
        /// Members in the room, including the joiner
        members: usize,
    },

    /// An event published by another member
    Event {
        #[serde(rename = "senderId")]
        sender_id: PeerId,
        event: String,
        #[serde(default)]
        payload: Value,
    },

    /// The relay rejected a frame
    Error { message: String },
}

impl ClientFrame {
    pub fn join(session_id: &str, sender_id: &str) -> Self {
        ClientFrame::Join {
            session_id: session_id.to_string(),
            sender_id: sender_id.to_string(),
        }
    }

    pub fn publish(sender_id: &str, event: &str, payload: Value) -> Self {
        ClientFrame::Publish {
            sender_id: sender_id.to_string(),
            event: event.to_string(),
            payload,
        }
    }

    pub fn leave(sender_id: &str) -> Self {
        ClientFrame::Leave {
            sender_id: sender_id.to_string(),
        }
    }

    /// Encode to a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    /// Encode to a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Event names on the wire
pub mod events {
    pub const USER_JOIN: &str = "user_join";
    pub const USER_LEAVE: &str = "user_leave";
    pub const CODE_UPDATE: &str = "code_update";
    pub const CURSOR_MOVE: &str = "cursor_move";
}

/// Collaboration events exchanged between session members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum WireEvent {
    /// A participant announced themselves
    #[serde(rename = "user_join")]
    Joined { user: Participant },

    /// A participant left
    #[serde(rename = "user_leave")]
    Left {
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// The full buffer content after an edit
    #[serde(rename = "code_update", alias = "code:update")]
    ContentChanged {
        #[serde(alias = "code")]
        content: String,
        /// Origin of the edit; older clients omit it
        #[serde(
            rename = "userId",
            alias = "originId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        user_id: Option<String>,
    },

    /// A participant's cursor moved
    #[serde(rename = "cursor_move")]
    CursorMoved {
        #[serde(rename = "userId")]
        user_id: String,
        position: CursorPosition,
    },
}

impl WireEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WireEvent::Joined { .. } => events::USER_JOIN,
            WireEvent::Left { .. } => events::USER_LEAVE,
            WireEvent::ContentChanged { .. } => events::CODE_UPDATE,
            WireEvent::CursorMoved { .. } => events::CURSOR_MOVE,
        }
    }

    /// Split into the `(event, payload)` pair a transport carries
    pub fn to_parts(&self) -> Result<(&'static str, Value), ProtocolError> {
        let mut value = serde_json::to_value(self)?;
        let payload = value
            .get_mut("payload")
            .map(Value::take)
            .ok_or_else(|| ProtocolError::UnexpectedShape("event without payload".to_string()))?;
        Ok((self.name(), payload))
    }

    /// Rebuild an event from a transport's `(event, payload)` pair
    ///
    /// Unknown event names and payloads missing required fields are errors.
    pub fn from_parts(event: &str, payload: Value) -> Result<Self, ProtocolError> {
        let tagged = serde_json::json!({ "event": event, "payload": payload });
        Ok(serde_json::from_value(tagged)?)
    }
}
