//! In-process transport
//!
//! `MemoryHub` is a managed channel: every member of a session receives
//! every event, its own included. Receivers are expected to drop their own
//! echoes using the origin id carried in the payload.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::transport::{Transport, TransportError, TransportEvent};

struct Member {
    origin_id: String,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

type Sessions = HashMap<String, Vec<Member>>;

/// Shared in-memory message bus
#[derive(Clone, Default)]
pub struct MemoryHub {
    sessions: Arc<Mutex<Sessions>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Join a session. `Subscribed` is queued immediately.
    pub fn join(
        &self,
        session_id: &str,
        origin_id: &str,
    ) -> (MemoryTransport, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Subscribed);

        self.lock()
            .entry(session_id.to_string())
            .or_default()
            .push(Member {
                origin_id: origin_id.to_string(),
                tx,
            });
        debug!(session_id, origin_id, "joined memory session");

        let transport = MemoryTransport {
            hub: self.clone(),
            session_id: session_id.to_string(),
            origin_id: origin_id.to_string(),
            connected: true,
            sent: Arc::new(AtomicUsize::new(0)),
        };
        (transport, rx)
    }

    /// Number of members currently in a session
    pub fn member_count(&self, session_id: &str) -> usize {
        self.lock().get(session_id).map(Vec::len).unwrap_or(0)
    }

    /// Drop a member's connection without a leave, as a network failure would
    pub fn disconnect(&self, session_id: &str, origin_id: &str) {
        let mut sessions = self.lock();
        if let Some(members) = sessions.get_mut(session_id) {
            members.retain(|m| {
                if m.origin_id == origin_id {
                    let _ = m.tx.send(TransportEvent::Disconnected);
                    false
                } else {
                    true
                }
            });
        }
    }

    fn publish(&self, session_id: &str, sender_id: &str, event: &str, payload: Value) -> bool {
        let sessions = self.lock();
        let Some(members) = sessions.get(session_id) else {
            return false;
        };
        if !members.iter().any(|m| m.origin_id == sender_id) {
            return false;
        }
        for member in members {
            let _ = member.tx.send(TransportEvent::Message {
                sender_id: sender_id.to_string(),
                event: event.to_string(),
                payload: payload.clone(),
            });
        }
        true
    }

    fn remove(&self, session_id: &str, origin_id: &str) {
        let mut sessions = self.lock();
        if let Some(members) = sessions.get_mut(session_id) {
            members.retain(|m| m.origin_id != origin_id);
            if members.is_empty() {
                sessions.remove(session_id);
            }
        }
    }
}

/// One member's handle on a `MemoryHub` session
pub struct MemoryTransport {
    hub: MemoryHub,
    session_id: String,
    origin_id: String,
    connected: bool,
    sent: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Number of events this transport has sent
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    /// Shared counter, readable after the transport moves into a session
    pub fn sent_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.sent)
    }
}

impl Transport for MemoryTransport {
    fn origin_id(&self) -> &str {
        &self.origin_id
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Closed);
        }
        if !self
            .hub
            .publish(&self.session_id, &self.origin_id, event, payload)
        {
            return Err(TransportError::Closed);
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn leave(&mut self) {
        if self.connected {
            self.connected = false;
            self.hub.remove(&self.session_id, &self.origin_id);
            debug!(session_id = %self.session_id, origin_id = %self.origin_id, "left memory session");
        }
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.leave();
    }
}
