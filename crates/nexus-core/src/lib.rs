//! NexusHub Core Library
//!
//! This crate provides the core of NexusHub, a collaborative code editor:
//! a shared document replicated across participants, undo history,
//! presence, version snapshots, project file access and an optional
//! suggestion service.
//!
//! # Architecture
//!
//! - **Last writer wins**: every edit carries the full content; the most
//!   recently received `code_update` replaces the local replica
//! - **Relay**: participants exchange events through a WebSocket relay
//!   room named after the session
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let (transport, mut events) = RelayTransport::join(RelayConfig::new(url), "session", &id);
//! let mut session = Session::new(transport, Document::untitled(), "Ada", versions);
//!
//! session.edit("let x = 1;");
//! while let Some(event) = events.recv().await {
//!     session.handle_transport_event(event);
//! }
//! ```
//!
//! # Modules
//!
//! - `session`: One participant's editing session (main entry point)
//! - `sync`: Wire protocol, transports and the relay server
//! - `document`, `history`, `presence`: Session state
//! - `storage`: Version catalog persistence
//! - `files`: Project file listing, loading and export
//! - `validate`: Advisory syntax checks
//! - `suggest`: Suggestion service client
//! - `config`: Application configuration

pub mod config;
pub mod document;
pub mod files;
pub mod history;
pub mod language;
pub mod presence;
pub mod session;
pub mod storage;
pub mod suggest;
pub mod sync;
pub mod validate;

pub use config::Config;
pub use document::Document;
pub use files::{FileEntry, FileError, LoadedFile, ProjectFiles};
pub use history::History;
pub use language::Language;
pub use presence::{CursorPosition, Participant, PresenceRegistry};
pub use session::{EditOutcome, RollbackOutcome, Session, SessionUpdate};
pub use storage::{StorageError, Version, VersionStore};
pub use suggest::{SuggestionError, SuggestionGateway, SuggestionKind};
pub use sync::{RelayConfig, RelayServer, RelayTransport, Transport, TransportEvent};
pub use validate::{validate, ValidationError};
