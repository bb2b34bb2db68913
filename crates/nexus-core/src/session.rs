//! Editing session
//!
//! A `Session` is one participant's view of a shared document. It owns the
//! transport handle, the document replica, its undo history, the presence
//! registry and the version catalog, and wires them together:
//!
//! - local edit → document → history → `code_update` broadcast
//! - remote `code_update` → document → history, never re-sent
//! - join/leave/cursor events → presence only
//!
//! The session is driven from a single task: callers feed it transport
//! events with [`Session::handle_transport_event`] and user actions through
//! its methods. Dropping the session leaves the transport.

use tracing::{debug, info, warn};

use crate::document::Document;
use crate::files::LoadedFile;
use crate::history::History;
use crate::presence::{CursorPosition, Participant, PresenceRegistry};
use crate::storage::{StorageResult, Version, VersionStore};
use crate::sync::{PeerId, Transport, TransportError, TransportEvent, WireEvent};
use crate::validate::{validate, ValidationError};

/// Header inserted before an accepted suggestion
pub const SUGGESTION_MARKER: &str = "\n\n// AI Suggestion Applied:\n";

/// Result of a local edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content changed and was broadcast
    Applied,
    /// Content was identical; nothing happened
    Unchanged,
    /// The syntax check failed; the edit is held back
    Held(ValidationError),
}

/// Result of a version rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    Restored,
    NotFound,
}

/// What an inbound transport event did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The subscription is live and we announced ourselves
    Subscribed,
    /// The connection dropped; presence was cleared
    Disconnected,
    /// A collaborator replaced the content
    ContentReplaced { origin: PeerId },
    /// A collaborator joined, or re-announced if `is_new` is false
    ParticipantJoined { participant: Participant, is_new: bool },
    /// A collaborator left
    ParticipantLeft {
        user_id: PeerId,
        participant: Option<Participant>,
    },
    /// A collaborator's cursor moved
    CursorMoved {
        user_id: PeerId,
        position: CursorPosition,
    },
    /// Our own echo, or a payload that could not be decoded
    Ignored,
}

/// A local edit that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldEdit {
    pub content: String,
    pub error: ValidationError,
}

/// One participant's editing session
pub struct Session<T: Transport> {
    transport: T,
    local: Participant,
    document: Document,
    history: History,
    presence: PresenceRegistry,
    versions: VersionStore,
    validate_edits: bool,
    held: Option<HeldEdit>,
    cursor: CursorPosition,
    subscribed: bool,
    closed: bool,
}

impl<T: Transport> Session<T> {
    /// Open a session on `document`
    ///
    /// The local participant id is the transport's origin id. Nothing is
    /// announced until the transport reports `Subscribed`.
    pub fn new(
        transport: T,
        document: Document,
        display_name: impl Into<String>,
        versions: VersionStore,
    ) -> Self {
        let local = Participant::new(transport.origin_id(), display_name);
        info!(id = %local.id, file = %document.file_name, "opened session");

        Self {
            history: History::new(document.content.clone()),
            transport,
            local,
            document,
            presence: PresenceRegistry::new(),
            versions,
            validate_edits: true,
            held: None,
            cursor: CursorPosition::default(),
            subscribed: false,
            closed: false,
        }
    }

    /// Turn the advisory syntax check on local edits on or off
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_edits = enabled;
        self
    }

    pub fn local(&self) -> &Participant {
        &self.local
    }

    pub fn local_id(&self) -> &str {
        &self.local.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn content(&self) -> &str {
        &self.document.content
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Other participants; the local participant is not listed
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The last edit rejected by the syntax check, if still pending
    pub fn held_edit(&self) -> Option<&HeldEdit> {
        self.held.as_ref()
    }

    pub fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply a local edit and broadcast it
    pub fn edit(&mut self, content: impl Into<String>) -> EditOutcome {
        let content = content.into();
        if content == self.document.content {
            return EditOutcome::Unchanged;
        }

        if self.validate_edits {
            if let Err(error) = validate(self.document.language, &content) {
                debug!(%error, "holding edit that failed validation");
                self.held = Some(HeldEdit {
                    content,
                    error: error.clone(),
                });
                return EditOutcome::Held(error);
            }
        }

        self.held = None;
        self.apply_local(content);
        EditOutcome::Applied
    }

    /// Step back in history. Returns the restored content, or `None` if
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        let content = self.history.undo()?.to_string();
        self.document.content = content.clone();
        self.broadcast_content();
        Some(content)
    }

    /// Step forward in history. Returns the restored content, or `None`
    /// if there is nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        let content = self.history.redo()?.to_string();
        self.document.content = content.clone();
        self.broadcast_content();
        Some(content)
    }

    /// Record and broadcast the local cursor; coordinates are clamped to 1
    pub fn move_cursor(&mut self, line: u32, column: u32) -> CursorPosition {
        self.cursor = CursorPosition::new(line, column);
        self.send(&WireEvent::CursorMoved {
            user_id: self.local.id.clone(),
            position: self.cursor,
        });
        self.cursor
    }

    /// Snapshot the current document into the version catalog
    pub fn save_version(&mut self) -> StorageResult<Version> {
        let version = self.versions.save(
            self.document.content.clone(),
            self.document.file_name.clone(),
            self.document.language,
        )?;
        info!(id = version.id, file = %version.file_name, "saved version");
        Ok(version.clone())
    }

    /// Restore a saved version as a local edit
    pub fn rollback(&mut self, id: i64) -> RollbackOutcome {
        let Some(version) = self.versions.get(id).cloned() else {
            return RollbackOutcome::NotFound;
        };

        self.document
            .replace(version.content, version.file_name, version.language);
        self.history.push(self.document.content.clone());
        self.broadcast_content();
        info!(id, "rolled back to version");
        RollbackOutcome::Restored
    }

    /// Replace the document with a freshly loaded file
    ///
    /// History restarts from the file's content.
    pub fn load_file(&mut self, file: LoadedFile) {
        let LoadedFile {
            content,
            file_name,
            language,
            ..
        } = file;
        self.document.replace(content, file_name, language);
        self.history.reset(self.document.content.clone());
        self.held = None;
        self.broadcast_content();
        info!(file = %self.document.file_name, %language, "loaded file");
    }

    /// Append an accepted suggestion to the content
    pub fn accept_suggestion(&mut self, suggestion: &str) {
        let content = format!("{}{}{}", self.document.content, SUGGESTION_MARKER, suggestion);
        self.apply_local(content);
    }

    /// Feed one transport event into the session
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> SessionUpdate {
        if self.closed {
            return SessionUpdate::Ignored;
        }

        match event {
            TransportEvent::Subscribed => {
                self.subscribed = true;
                self.announce();
                SessionUpdate::Subscribed
            }
            TransportEvent::Disconnected => {
                self.subscribed = false;
                self.presence.clear();
                info!("transport disconnected, presence cleared");
                SessionUpdate::Disconnected
            }
            TransportEvent::Message {
                sender_id,
                event,
                payload,
            } => match WireEvent::from_parts(&event, payload) {
                Ok(wire) => self.handle_wire_event(sender_id, wire),
                Err(e) => {
                    warn!(%event, sender = %sender_id, error = %e, "dropping undecodable event");
                    SessionUpdate::Ignored
                }
            },
        }
    }

    fn handle_wire_event(&mut self, sender_id: PeerId, event: WireEvent) -> SessionUpdate {
        match event {
            WireEvent::Joined { user } => {
                if user.id == self.local.id {
                    return SessionUpdate::Ignored;
                }
                let is_new = self.presence.on_join(user.clone());
                if is_new {
                    debug!(peer = %user.id, "new participant, re-announcing");
                    self.announce();
                }
                SessionUpdate::ParticipantJoined {
                    participant: user,
                    is_new,
                }
            }
            WireEvent::Left { user_id } => {
                if user_id == self.local.id {
                    return SessionUpdate::Ignored;
                }
                let participant = self.presence.on_leave(&user_id);
                SessionUpdate::ParticipantLeft {
                    user_id,
                    participant,
                }
            }
            WireEvent::ContentChanged { content, user_id } => {
                let origin = user_id.unwrap_or(sender_id);
                if origin == self.local.id {
                    return SessionUpdate::Ignored;
                }
                // Last writer wins; never re-sent
                self.document.content = content;
                self.history.push(self.document.content.clone());
                debug!(%origin, "applied remote content");
                SessionUpdate::ContentReplaced { origin }
            }
            WireEvent::CursorMoved { user_id, position } => {
                if user_id == self.local.id {
                    return SessionUpdate::Ignored;
                }
                if !self.presence.on_cursor_move(&user_id, position) {
                    debug!(%user_id, "cursor from unknown participant");
                    return SessionUpdate::Ignored;
                }
                SessionUpdate::CursorMoved { user_id, position }
            }
        }
    }

    /// Announce departure and release the transport. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.send(&WireEvent::Left {
            user_id: self.local.id.clone(),
        });
        self.transport.leave();
        self.closed = true;
        self.subscribed = false;
        info!(id = %self.local.id, "closed session");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn apply_local(&mut self, content: String) {
        self.document.content = content;
        self.history.push(self.document.content.clone());
        self.broadcast_content();
    }

    fn broadcast_content(&self) {
        self.send(&WireEvent::ContentChanged {
            content: self.document.content.clone(),
            user_id: Some(self.local.id.clone()),
        });
    }

    fn announce(&self) {
        self.send(&WireEvent::Joined {
            user: self.local.clone(),
        });
    }

    /// Best-effort send; failures leave the session working locally
    fn send(&self, event: &WireEvent) {
        if self.closed {
            return;
        }
        let result = event
            .to_parts()
            .map_err(TransportError::from)
            .and_then(|(name, payload)| self.transport.send(name, payload));
        if let Err(e) = result {
            debug!(event = event.name(), error = %e, "send failed, continuing locally");
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::sync::{MemoryHub, MemoryTransport};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Peer {
        session: Session<MemoryTransport>,
        events: UnboundedReceiver<TransportEvent>,
        sent: Arc<AtomicUsize>,
    }

    impl Peer {
        fn join(hub: &MemoryHub, id: &str, name: &str, document: Document) -> Self {
            let (transport, events) = hub.join("session-1", id);
            let sent = transport.sent_counter();
            let session = Session::new(transport, document, name, VersionStore::in_memory());
            Self {
                session,
                events,
                sent,
            }
        }

        fn pump(&mut self) -> Vec<SessionUpdate> {
            let mut updates = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                updates.push(self.session.handle_transport_event(event));
            }
            updates
        }

        fn sent(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }
    }

    fn js_doc(content: &str) -> Document {
        Document::new("demo.js", content)
    }

    #[test]
    fn test_subscribed_announces_self() {
        let hub = MemoryHub::new();
        let (transport, mut events) = hub.join("session-1", "a");
        let sent = transport.sent_counter();
        let mut session = Session::new(transport, js_doc(""), "Ada", VersionStore::in_memory());

        assert_eq!(sent.load(Ordering::SeqCst), 0);
        let first = events.try_recv().unwrap();
        assert_eq!(session.handle_transport_event(first), SessionUpdate::Subscribed);
        assert!(session.is_subscribed());
        assert_eq!(sent.load(Ordering::SeqCst), 1);

        // Our own join comes back through the hub and is ignored
        let echo = events.try_recv().unwrap();
        assert_eq!(session.handle_transport_event(echo), SessionUpdate::Ignored);
        assert!(session.presence().is_empty());
    }

    #[test]
    fn test_own_edit_is_not_reapplied() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("let x=1;"));
        a.pump();

        assert_eq!(a.session.edit("let x=2;"), EditOutcome::Applied);
        assert_eq!(a.session.history().len(), 2);

        let updates = a.pump();
        assert_eq!(updates, vec![SessionUpdate::Ignored]);
        assert_eq!(a.session.content(), "let x=2;");
        assert_eq!(a.session.history().len(), 2);
    }

    #[test]
    fn test_remote_update_applied_without_rebroadcast() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("let x=1;"));
        let mut b = Peer::join(&hub, "b", "Bob", js_doc("let x=1;"));
        a.pump();
        b.pump();
        a.pump();
        b.pump();

        let b_sent = b.sent();
        let b_history = b.session.history().len();

        a.session.edit("let x=3;");
        let updates = b.pump();

        assert_eq!(
            updates,
            vec![SessionUpdate::ContentReplaced {
                origin: "a".to_string()
            }]
        );
        assert_eq!(b.session.content(), "let x=3;");
        assert_eq!(b.session.history().len(), b_history + 1);
        assert_eq!(b.sent(), b_sent);
    }

    #[test]
    fn test_update_without_user_id_uses_sender() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc(""));
        a.pump();

        let update = a.session.handle_transport_event(TransportEvent::Message {
            sender_id: "a".to_string(),
            event: "code:update".to_string(),
            payload: json!({"code": "mine"}),
        });
        assert_eq!(update, SessionUpdate::Ignored);

        let update = a.session.handle_transport_event(TransportEvent::Message {
            sender_id: "z".to_string(),
            event: "code:update".to_string(),
            payload: json!({"code": "theirs"}),
        });
        assert_eq!(
            update,
            SessionUpdate::ContentReplaced {
                origin: "z".to_string()
            }
        );
        assert_eq!(a.session.content(), "theirs");
    }

    #[test]
    fn test_scenario_edit_reaches_peer() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("demo.js"), "let x=1;").unwrap();
        let project = crate::files::ProjectFiles::new(temp_dir.path());

        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", Document::untitled());
        let mut b = Peer::join(&hub, "b", "Bob", Document::untitled());
        a.pump();
        b.pump();
        a.pump();
        b.pump();

        a.session.load_file(project.load("demo.js").unwrap());
        b.pump();
        assert_eq!(b.session.content(), "let x=1;");

        let before = b.session.history().len();
        assert_eq!(a.session.edit("let x=2;"), EditOutcome::Applied);
        b.pump();

        assert_eq!(b.session.content(), "let x=2;");
        assert_eq!(b.session.history().len(), before + 1);
    }

    #[test]
    fn test_unchanged_edit_is_noop() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("same"));
        a.pump();
        let sent = a.sent();

        assert_eq!(a.session.edit("same"), EditOutcome::Unchanged);
        assert_eq!(a.sent(), sent);
        assert_eq!(a.session.history().len(), 1);
    }

    #[test]
    fn test_invalid_edit_is_held() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("let x=1;"));
        a.pump();
        let sent = a.sent();

        let outcome = a.session.edit("function f() {");
        assert!(matches!(outcome, EditOutcome::Held(_)));
        assert_eq!(a.session.content(), "let x=1;");
        assert_eq!(a.session.history().len(), 1);
        assert_eq!(a.sent(), sent);
        assert_eq!(a.session.held_edit().unwrap().content, "function f() {");

        assert_eq!(a.session.edit("function f() {}"), EditOutcome::Applied);
        assert!(a.session.held_edit().is_none());
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let hub = MemoryHub::new();
        let (transport, _events) = hub.join("session-1", "a");
        let mut session =
            Session::new(transport, js_doc(""), "Ada", VersionStore::in_memory()).with_validation(false);

        assert_eq!(session.edit("function f() {"), EditOutcome::Applied);
    }

    #[test]
    fn test_undo_redo_broadcast() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("c0"));
        let mut b = Peer::join(&hub, "b", "Bob", js_doc("c0"));
        a.pump();
        b.pump();

        a.session.edit("c1");
        a.session.edit("c2");
        assert_eq!(a.session.undo().as_deref(), Some("c1"));
        assert_eq!(a.session.undo().as_deref(), Some("c0"));
        assert_eq!(a.session.undo(), None);
        assert_eq!(a.session.redo().as_deref(), Some("c1"));
        assert_eq!(a.session.redo().as_deref(), Some("c2"));
        assert_eq!(a.session.redo(), None);

        b.pump();
        assert_eq!(b.session.content(), "c2");
    }

    #[test]
    fn test_version_rollback_restores_document() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", Document::new("a.js", "x"));
        let mut b = Peer::join(&hub, "b", "Bob", Document::untitled());
        a.pump();
        b.pump();

        let id = a.session.save_version().unwrap().id;
        a.session.load_file(LoadedFile {
            content: "print(1)".to_string(),
            file_name: "other.py".to_string(),
            path: PathBuf::from("other.py"),
            language: Language::Python,
        });
        assert_eq!(a.session.document().language, Language::Python);

        assert_eq!(a.session.rollback(id), RollbackOutcome::Restored);
        let doc = a.session.document();
        assert_eq!(doc.content, "x");
        assert_eq!(doc.file_name, "a.js");
        assert_eq!(doc.language, Language::Javascript);

        b.pump();
        assert_eq!(b.session.content(), "x");

        assert_eq!(a.session.rollback(42), RollbackOutcome::NotFound);
    }

    #[test]
    fn test_load_file_resets_history_and_clears_held() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("a"));
        a.pump();
        a.session.edit("b");
        a.session.edit("{");
        assert!(a.session.held_edit().is_some());

        a.session.load_file(LoadedFile {
            content: "fn main() {}".to_string(),
            file_name: "main.rs".to_string(),
            path: PathBuf::from("main.rs"),
            language: Language::Rust,
        });

        assert_eq!(a.session.history().len(), 1);
        assert!(!a.session.can_undo());
        assert!(a.session.held_edit().is_none());
    }

    #[test]
    fn test_accept_suggestion_appends() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("let x = 1;"));
        a.pump();

        a.session.accept_suggestion("Use const instead of let.");
        assert_eq!(
            a.session.content(),
            "let x = 1;\n\n// AI Suggestion Applied:\nUse const instead of let."
        );
        assert_eq!(a.session.history().len(), 2);
    }

    #[test]
    fn test_presence_exchange() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc(""));
        a.pump();

        let mut b = Peer::join(&hub, "b", "Bob", js_doc(""));
        b.pump();
        // A learns about B and re-announces so B learns about A
        let updates = a.pump();
        assert!(updates.contains(&SessionUpdate::ParticipantJoined {
            participant: Participant::new("b", "Bob"),
            is_new: true
        }));
        b.pump();
        a.pump();

        assert_eq!(a.session.presence().len(), 1);
        assert_eq!(b.session.presence().len(), 1);
        assert!(b.session.presence().contains("a"));

        // A second announcement does not duplicate
        a.session.handle_transport_event(TransportEvent::Message {
            sender_id: "b".to_string(),
            event: "user_join".to_string(),
            payload: json!({"user": {"id": "b", "name": "Bob"}}),
        });
        assert_eq!(a.session.presence().len(), 1);
    }

    #[test]
    fn test_cursor_and_leave() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc(""));
        let mut b = Peer::join(&hub, "b", "Bob", js_doc(""));
        a.pump();
        b.pump();
        a.pump();

        let position = b.session.move_cursor(0, 5);
        assert_eq!(position, CursorPosition::new(1, 5));
        a.pump();
        assert_eq!(a.session.presence().cursor("b"), Some(CursorPosition::new(1, 5)));

        b.session.close();
        a.pump();
        assert!(!a.session.presence().contains("b"));
        assert!(a.session.presence().cursor("b").is_none());
    }

    #[test]
    fn test_late_cursor_after_leave_is_ignored() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc(""));
        let mut b = Peer::join(&hub, "b", "Bob", js_doc(""));
        a.pump();
        b.pump();
        a.pump();
        b.session.close();
        a.pump();
        assert!(!a.session.presence().contains("b"));

        let update = a.session.handle_transport_event(TransportEvent::Message {
            sender_id: "b".to_string(),
            event: "cursor_move".to_string(),
            payload: json!({"userId": "b", "position": {"line": 0, "col": 0}}),
        });
        assert_eq!(update, SessionUpdate::Ignored);
        assert!(a.session.presence().is_empty());
        assert!(a.session.presence().cursor("b").is_none());
    }

    #[test]
    fn test_disconnect_clears_presence_and_keeps_document() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("keep me"));
        let mut b = Peer::join(&hub, "b", "Bob", js_doc(""));
        a.pump();
        b.pump();
        a.pump();
        assert_eq!(a.session.presence().len(), 1);

        hub.disconnect("session-1", "a");
        let updates = a.pump();
        assert_eq!(updates.last(), Some(&SessionUpdate::Disconnected));
        assert!(a.session.presence().is_empty());
        assert!(!a.session.is_subscribed());

        // Edits still work locally
        assert_eq!(a.session.edit("still editing"), EditOutcome::Applied);
        assert_eq!(a.session.content(), "still editing");
    }

    #[test]
    fn test_malformed_event_is_ignored() {
        let hub = MemoryHub::new();
        let mut a = Peer::join(&hub, "a", "Ada", js_doc("x"));
        a.pump();

        let update = a.session.handle_transport_event(TransportEvent::Message {
            sender_id: "z".to_string(),
            event: "chat".to_string(),
            payload: json!({"text": "hello"}),
        });
        assert_eq!(update, SessionUpdate::Ignored);
        assert_eq!(a.session.content(), "x");
    }

    #[test]
    fn test_close_is_idempotent_and_drop_leaves() {
        let hub = MemoryHub::new();
        {
            let mut a = Peer::join(&hub, "a", "Ada", js_doc(""));
            a.pump();
            a.session.close();
            a.session.close();
            assert!(a.session.is_closed());
            assert_eq!(hub.member_count("session-1"), 0);
        }

        {
            let _b = Peer::join(&hub, "b", "Bob", js_doc(""));
            assert_eq!(hub.member_count("session-1"), 1);
        }
        assert_eq!(hub.member_count("session-1"), 0);
    }
}
