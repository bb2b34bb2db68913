//! Relay client
//!
//! Maintains a long-lived WebSocket connection to a relay server for one
//! session. A background task owns the socket; the handle only queues
//! commands, so sending never blocks. Reconnection uses exponential
//! backoff, and events published while disconnected are lost.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::message::{ClientFrame, PeerId, ServerFrame};
use super::transport::{Transport, TransportError, TransportEvent, TransportStatus};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands sent to the connection task
#[derive(Debug)]
enum Command {
    Publish { event: String, payload: Value },
    Leave,
}

/// How a connection ended
enum Ended {
    /// Leave requested or handle dropped
    Shutdown,
    /// Remote side closed the socket
    Closed,
}

/// Configuration for a relay connection
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// WebSocket URL of the relay
    pub url: String,
    /// Reconnect after the connection drops
    pub reconnect: bool,
    /// Initial reconnect delay
    pub initial_reconnect_delay: Duration,
    /// Maximum reconnect delay
    pub max_reconnect_delay: Duration,
    /// How long to wait for the join acknowledgment
    pub handshake_timeout: Duration,
}

impl RelayConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect: true,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to a relay-backed session transport
pub struct RelayTransport {
    origin_id: PeerId,
    session_id: String,
    command_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<TransportStatus>,
    left: bool,
}

impl RelayTransport {
    /// Spawn the connection task and join `session_id`
    ///
    /// Must be called from within a tokio runtime. The returned receiver
    /// yields `Subscribed` once the relay acknowledges the join, and again
    /// after every successful reconnect.
    pub fn join(
        config: RelayConfig,
        session_id: &str,
        origin_id: &str,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TransportStatus::Disconnected);

        tokio::spawn(connection_loop(
            config,
            session_id.to_string(),
            origin_id.to_string(),
            command_rx,
            event_tx,
            status_tx,
        ));

        let transport = Self {
            origin_id: origin_id.to_string(),
            session_id: session_id.to_string(),
            command_tx,
            status_rx,
            left: false,
        };
        (transport, event_rx)
    }

    /// Get the current status
    pub fn status(&self) -> TransportStatus {
        *self.status_rx.borrow()
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<TransportStatus> {
        self.status_rx.clone()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Transport for RelayTransport {
    fn origin_id(&self) -> &str {
        &self.origin_id
    }

    fn is_connected(&self) -> bool {
        self.status() == TransportStatus::Connected
    }

    fn send(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        if self.left {
            return Err(TransportError::Closed);
        }
        self.command_tx
            .send(Command::Publish {
                event: event.to_string(),
                payload,
            })
            .map_err(|_| TransportError::Closed)
    }

    fn leave(&mut self) {
        if !self.left {
            self.left = true;
            let _ = self.command_tx.send(Command::Leave);
        }
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.leave();
    }
}

/// Connection task with reconnection
async fn connection_loop(
    config: RelayConfig,
    session_id: String,
    origin_id: PeerId,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    status_tx: watch::Sender<TransportStatus>,
) {
    let mut reconnect_delay = config.initial_reconnect_delay;

    loop {
        let _ = status_tx.send(TransportStatus::Connecting);

        match connect_and_relay(
            &config,
            &session_id,
            &origin_id,
            &mut command_rx,
            &event_tx,
            &status_tx,
        )
        .await
        {
            Ok(Ended::Shutdown) => break,
            Ok(Ended::Closed) => {
                info!(url = %config.url, "relay closed the connection");
                reconnect_delay = config.initial_reconnect_delay;
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "relay connection failed");
            }
        }

        let _ = status_tx.send(TransportStatus::Disconnected);
        if !config.reconnect {
            break;
        }

        // Wait before reconnecting, but honor a leave in the meantime
        let deadline = tokio::time::Instant::now() + reconnect_delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                cmd = command_rx.recv() => match cmd {
                    Some(Command::Leave) | None => {
                        let _ = status_tx.send(TransportStatus::Closed);
                        return;
                    }
                    Some(Command::Publish { event, .. }) => {
                        debug!(%event, "dropping event while disconnected");
                    }
                },
            }
        }
        reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
    }

    let _ = status_tx.send(TransportStatus::Closed);
}

/// Connect, join, then relay until the connection ends
async fn connect_and_relay(
    config: &RelayConfig,
    session_id: &str,
    origin_id: &str,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
    event_tx: &mpsc::UnboundedSender<TransportEvent>,
    status_tx: &watch::Sender<TransportStatus>,
) -> Result<Ended> {
    debug!(url = %config.url, session_id, "connecting to relay");
    let (ws_stream, _) = connect_async(config.url.as_str())
        .await
        .with_context(|| format!("Failed to connect to relay at {}", config.url))?;
    let (mut write, mut read) = ws_stream.split();

    let join = ClientFrame::join(session_id, origin_id).encode()?;
    write.send(Message::Text(join)).await?;

    let members = wait_for_joined(&mut read, config).await?;
    info!(session_id, members, "joined session");

    let _ = status_tx.send(TransportStatus::Connected);
    let _ = event_tx.send(TransportEvent::Subscribed);

    let ended = relay_loop(origin_id, &mut write, &mut read, command_rx, event_tx).await;
    let _ = event_tx.send(TransportEvent::Disconnected);
    ended
}

/// Wait for the relay's join acknowledgment
async fn wait_for_joined(read: &mut SplitStream<WsStream>, config: &RelayConfig) -> Result<usize> {
    let deadline = tokio::time::Instant::now() + config.handshake_timeout;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ServerFrame::decode(&text) {
                        Ok(ServerFrame::Joined { members, .. }) => return Ok(members),
                        Ok(ServerFrame::Error { message }) => {
                            anyhow::bail!("Relay rejected join: {}", message);
                        }
                        Ok(ServerFrame::Event { .. }) => {}
                        Err(e) => debug!(error = %e, "ignoring malformed frame during handshake"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        anyhow::bail!("Relay ({}) closed connection during handshake", config.url);
                    }
                    Some(Err(e)) => {
                        anyhow::bail!("Relay connection error ({}): {}", config.url, e);
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                anyhow::bail!(
                    "Timeout waiting for relay ({}). Check that the relay is running.",
                    config.url
                );
            }
        }
    }
}

/// Pump commands out and events in until the connection ends
async fn relay_loop(
    origin_id: &str,
    write: &mut SplitSink<WsStream, Message>,
    read: &mut SplitStream<WsStream>,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
    event_tx: &mpsc::UnboundedSender<TransportEvent>,
) -> Result<Ended> {
    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(Command::Publish { event, payload }) => {
                        let frame = ClientFrame::publish(origin_id, &event, payload).encode()?;
                        write.send(Message::Text(frame)).await?;
                    }
                    Some(Command::Leave) | None => {
                        if let Ok(frame) = ClientFrame::leave(origin_id).encode() {
                            write.send(Message::Text(frame)).await.ok();
                        }
                        write.close().await.ok();
                        return Ok(Ended::Shutdown);
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ServerFrame::decode(&text) {
                        Ok(ServerFrame::Event { sender_id, event, payload }) => {
                            if sender_id == origin_id {
                                debug!(%event, "dropping own event");
                                continue;
                            }
                            let _ = event_tx.send(TransportEvent::Message { sender_id, event, payload });
                        }
                        Ok(ServerFrame::Error { message }) => {
                            warn!(%message, "relay reported an error");
                        }
                        Ok(ServerFrame::Joined { .. }) => {}
                        Err(e) => warn!(error = %e, "dropping malformed frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(Ended::Closed),
                    Some(Err(e)) => return Err(e.into()),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::new("ws://localhost:3001");
        assert_eq!(config.url, "ws://localhost:3001");
        assert!(config.reconnect);
        assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unreachable_relay_reports_status() {
        // Port 9 (discard) is almost never listening on loopback
        let config = RelayConfig {
            reconnect: false,
            ..RelayConfig::new("ws://127.0.0.1:9")
        };
        let (transport, mut events) = RelayTransport::join(config, "s1", "a");
        let mut status = transport.subscribe_status();

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while *status.borrow_and_update() != TransportStatus::Closed {
                if status.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        assert!(!transport.is_connected());
        // Never subscribed, so no events were emitted
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_leave_fails() {
        let config = RelayConfig {
            reconnect: false,
            ..RelayConfig::new("ws://127.0.0.1:9")
        };
        let (mut transport, _events) = RelayTransport::join(config, "s1", "a");
        transport.leave();
        assert!(matches!(
            transport.send("code_update", serde_json::json!({})),
            Err(TransportError::Closed)
        ));
    }
}
