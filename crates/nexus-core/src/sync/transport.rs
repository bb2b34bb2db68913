//! Session transport contract
//!
//! A transport is a pub/sub channel scoped to one editing session. Sends
//! never block and are best-effort. Inbound traffic arrives on the event
//! receiver handed out when the transport is joined.

use serde_json::Value;
use thiserror::Error;

use super::message::{PeerId, ProtocolError};

/// Events delivered by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The session subscription is live; it is now safe to announce
    Subscribed,
    /// An event from a session member
    Message {
        sender_id: PeerId,
        event: String,
        payload: Value,
    },
    /// The connection dropped; no further messages until `Subscribed`
    Disconnected,
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// Not connected, will retry if reconnect is enabled
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Joined and exchanging events
    Connected,
    /// Left; the transport will not reconnect
    Closed,
}

/// Errors from transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A session-scoped broadcast channel
pub trait Transport {
    /// Id stamped on everything this transport sends
    fn origin_id(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Queue an event for the other members of the session
    fn send(&self, event: &str, payload: Value) -> Result<(), TransportError>;

    /// Notify the session and release the connection. Idempotent.
    fn leave(&mut self);
}
