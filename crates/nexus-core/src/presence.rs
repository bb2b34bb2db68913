//! Presence registry
//!
//! Tracks who is in the session and where their cursors are. The registry
//! is driven purely by join/leave/cursor events and never touches the
//! document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    /// Wire field is `name`
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// 1-based cursor location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireCursor")]
pub struct CursorPosition {
    pub line: u32,
    #[serde(rename = "col", alias = "column")]
    pub column: u32,
}

impl CursorPosition {
    /// Build a position, clamping both coordinates to at least 1
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line: line.max(1),
            column: column.max(1),
        }
    }
}

/// Unclamped position as it arrives from a peer
#[derive(Deserialize)]
struct WireCursor {
    line: u32,
    #[serde(rename = "col", alias = "column")]
    column: u32,
}

impl From<WireCursor> for CursorPosition {
    fn from(wire: WireCursor) -> Self {
        Self::new(wire.line, wire.column)
    }
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Participants and cursors, keyed by participant id
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    participants: BTreeMap<String, Participant>,
    cursors: BTreeMap<String, CursorPosition>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. Returns true if the participant was not known before.
    ///
    /// A repeated join for the same id keeps a single entry and refreshes
    /// the display name.
    pub fn on_join(&mut self, participant: Participant) -> bool {
        self.participants
            .insert(participant.id.clone(), participant)
            .is_none()
    }

    /// Remove a participant and their cursor. Returns the removed entry.
    pub fn on_leave(&mut self, id: &str) -> Option<Participant> {
        self.cursors.remove(id);
        self.participants.remove(id)
    }

    /// Update a participant's cursor. Returns false, recording nothing, when
    /// the id has not joined; delivery is unordered, so a cursor can trail
    /// the sender's leave.
    pub fn on_cursor_move(&mut self, id: &str, position: CursorPosition) -> bool {
        if !self.participants.contains_key(id) {
            return false;
        }
        self.cursors.insert(id.to_string(), position);
        true
    }

    /// Forget everyone (used when the transport disconnects)
    pub fn clear(&mut self) {
        self.participants.clear();
        self.cursors.clear();
    }

    /// Participants sorted by id
    pub fn participants(&self) -> Vec<&Participant> {
        self.participants.values().collect()
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn cursor(&self, id: &str) -> Option<CursorPosition> {
        self.cursors.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
