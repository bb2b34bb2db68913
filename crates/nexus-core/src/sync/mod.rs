//! Session transport
//!
//! Provides the pub/sub channel collaborators use to exchange edits,
//! presence and cursor events.
//!
//! ## Topology
//!
//! Clients connect to a relay server over WebSocket and join a room named
//! after the session. The relay forwards each published event to every
//! other member of the room.
//!
//! 1. Connect via WebSocket
//! 2. Send `join { sessionId, senderId }` and wait for `joined`
//! 3. Publish events; receive everyone else's
//! 4. Send `leave` on the way out
//!
//! `MemoryHub` implements the same contract in-process for tests and
//! embedding.
//!
//! ## Usage
//!
//! ```ignore
//! let (transport, events) = RelayTransport::join(RelayConfig::new(url), "session", &origin_id);
//! let mut session = Session::new(transport, document, participant, versions);
//! ```

mod client;
mod memory;
mod message;
mod relay;
mod transport;

pub use client::{RelayConfig, RelayTransport};
pub use memory::{MemoryHub, MemoryTransport};
pub use message::{events, ClientFrame, PeerId, ProtocolError, ServerFrame, WireEvent};
pub use relay::{RelayServer, RelayServerConfig};
pub use transport::{Transport, TransportError, TransportEvent, TransportStatus};
