//! Linear undo/redo history
//!
//! History is a list of content snapshots plus a cursor pointing at the
//! current one. Pushing after an undo truncates everything past the
//! cursor, so undone branches become unreachable.

/// Content snapshots with an undo cursor
///
/// Invariant: `entries` is never empty and `cursor < entries.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    /// Start a history whose only entry is `initial`
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
        }
    }

    /// Record a new snapshot, discarding any redo branch
    pub fn push(&mut self, content: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(content.into());
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one snapshot. Returns the new current content, or `None`
    /// when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward one snapshot. Returns the new current content, or
    /// `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Drop all entries and start over from `content`
    pub fn reset(&mut self, content: impl Into<String>) {
        self.entries.clear();
        self.entries.push(content.into());
        self.cursor = 0;
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least its initial entry
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(String::new())
    }
}
