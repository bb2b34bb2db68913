//! Relay server
//!
//! Rooms are keyed by session id. Every event a member publishes is
//! rebroadcast to the other members of its room; the relay keeps no
//! document state of its own.
//!
//! ```text
//! Client A ──┐                          ┌──> Client B
//!            ├── Room (session id) ─────┤
//! Client C ──┘   broadcast channel      └──> Client C (not A)
//! ```
//!
//! When a socket closes without an explicit leave, the relay publishes a
//! `user_leave` on the member's behalf so the others drop it from presence.
//! A reconnecting client may briefly hold two sockets under one peer id, so
//! membership counts connections and only the last one to go counts as a
//! departure.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::message::{ClientFrame, PeerId, ServerFrame, WireEvent};

/// Relay server configuration
#[derive(Debug, Clone)]
pub struct RelayServerConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Messages buffered per member before a slow member starts losing them
    pub broadcast_capacity: usize,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            broadcast_capacity: 256,
        }
    }
}

/// A frame fanned out to a room
#[derive(Debug)]
struct Relayed {
    sender_id: PeerId,
    text: String,
}

struct Room {
    sender: broadcast::Sender<Arc<Relayed>>,
    /// Open connections per peer id
    members: HashMap<PeerId, usize>,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            members: HashMap::new(),
        }
    }
}

type Rooms = Arc<RwLock<HashMap<String, Room>>>;

/// The relay server
#[derive(Clone)]
pub struct RelayServer {
    config: RelayServerConfig,
    rooms: Rooms,
}

impl RelayServer {
    pub fn new(config: RelayServerConfig) -> Self {
        Self {
            config,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Bind the configured address and serve forever
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind relay to {}", self.config.bind_addr))?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("Listener has no local address")?;
        info!(%addr, "relay listening");

        loop {
            let (stream, addr) = listener.accept().await.context("Failed to accept connection")?;
            debug!(%addr, "new TCP connection");

            let server = self.clone();
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream, addr).await {
                    warn!(%addr, error = %e, "connection error");
                }
            });
        }
    }

    /// Number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of distinct peers in a room
    pub async fn member_count(&self, session_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(session_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .context("WebSocket handshake failed")?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // Set once the peer joins a room
        let mut membership: Option<(String, PeerId)> = None;
        let mut room_rx: Option<broadcast::Receiver<Arc<Relayed>>> = None;
        let mut left_explicitly = false;

        let result = async {
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        let text = match msg {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Err(e)) => return Err(e.into()),
                            _ => continue,
                        };

                        let frame = match ClientFrame::decode(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                ws_sender
                                    .send(Message::Text(ServerFrame::error(e.to_string()).encode()?))
                                    .await?;
                                continue;
                            }
                        };

                        match frame {
                            ClientFrame::Join { session_id, sender_id } => {
                                if membership.is_some() {
                                    let reply = ServerFrame::error("already joined a session");
                                    ws_sender.send(Message::Text(reply.encode()?)).await?;
                                    continue;
                                }
                                let (rx, members) = self.join_room(&session_id, &sender_id).await;
                                room_rx = Some(rx);
                                info!(%addr, %session_id, peer = %sender_id, members, "peer joined");

                                let reply = ServerFrame::Joined { session_id: session_id.clone(), members };
                                membership = Some((session_id, sender_id));
                                ws_sender.send(Message::Text(reply.encode()?)).await?;
                            }
                            ClientFrame::Publish { sender_id, event, payload } => {
                                let Some((session_id, peer)) = &membership else {
                                    let reply = ServerFrame::error("join a session first");
                                    ws_sender.send(Message::Text(reply.encode()?)).await?;
                                    continue;
                                };
                                if &sender_id != peer {
                                    debug!(%sender_id, %peer, "rewriting spoofed sender id");
                                }
                                let frame = ServerFrame::Event { sender_id: peer.clone(), event, payload };
                                self.publish(session_id, peer, frame.encode()?).await;
                            }
                            ClientFrame::Leave { .. } => {
                                left_explicitly = true;
                                break;
                            }
                        }
                    }

                    relayed = async {
                        match room_rx.as_mut() {
                            Some(rx) => rx.recv().await,
                            None => std::future::pending().await,
                        }
                    } => {
                        match relayed {
                            Ok(relayed) => {
                                let is_own = membership
                                    .as_ref()
                                    .map(|(_, peer)| *peer == relayed.sender_id)
                                    .unwrap_or(false);
                                if !is_own {
                                    ws_sender.send(Message::Text(relayed.text.clone())).await?;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(%addr, skipped, "member lagging, events dropped");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Some((session_id, peer)) = membership {
            let gone = self.leave_room(&session_id, &peer).await;
            if gone && !left_explicitly {
                self.announce_departure(&session_id, &peer).await;
            }
            info!(%addr, %session_id, %peer, gone, "peer connection closed");
        }
        let _ = ws_sender.close().await;

        result
    }

    async fn join_room(
        &self,
        session_id: &str,
        peer: &str,
    ) -> (broadcast::Receiver<Arc<Relayed>>, usize) {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(session_id.to_string())
            .or_insert_with(|| Room::new(self.config.broadcast_capacity));
        *room.members.entry(peer.to_string()).or_insert(0) += 1;
        (room.sender.subscribe(), room.members.len())
    }

    async fn publish(&self, session_id: &str, peer: &str, text: String) {
        let rooms = self.rooms.read().await;
        if let Some(room) = rooms.get(session_id) {
            // No receivers is not an error; the room may be momentarily empty
            let _ = room.sender.send(Arc::new(Relayed {
                sender_id: peer.to_string(),
                text,
            }));
        }
    }

    /// Publish a `user_leave` for a member whose socket went away
    async fn announce_departure(&self, session_id: &str, peer: &str) {
        let event = WireEvent::Left {
            user_id: peer.to_string(),
        };
        let frame = event.to_parts().and_then(|(name, payload)| {
            ServerFrame::Event {
                sender_id: peer.to_string(),
                event: name.to_string(),
                payload,
            }
            .encode()
        });
        match frame {
            Ok(text) => self.publish(session_id, peer, text).await,
            Err(e) => warn!(error = %e, "failed to encode departure"),
        }
    }

    /// Drop one connection of `peer`; true when it was the peer's last
    async fn leave_room(&self, session_id: &str, peer: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(session_id) else {
            return false;
        };
        let Some(connections) = room.members.get_mut(peer) else {
            return false;
        };
        *connections -= 1;
        if *connections > 0 {
            debug!(%session_id, %peer, remaining = *connections, "peer still connected");
            return false;
        }
        room.members.remove(peer);
        if room.members.is_empty() {
            rooms.remove(session_id);
            debug!(%session_id, "removed empty room");
        }
        true
    }
}
