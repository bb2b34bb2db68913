//! Storage layer
//!
//! Handles persistence of the version catalog.
//!
//! The live document is never persisted; only snapshots the user asks for
//! are written, as one JSON array in the data directory.

pub mod error;
pub mod persistence;
pub mod versions;

pub use error::{StorageError, StorageResult};
pub use persistence::atomic_write;
pub use versions::{Version, VersionStore};
