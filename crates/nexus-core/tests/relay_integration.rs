//! Two sessions editing through a live relay server

use std::time::Duration;

use nexus_core::session::{EditOutcome, Session, SessionUpdate};
use nexus_core::storage::VersionStore;
use nexus_core::sync::{RelayConfig, RelayServer, RelayServerConfig, RelayTransport, TransportEvent};
use nexus_core::Document;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

async fn start_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = RelayServer::new(RelayServerConfig::default());
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    format!("ws://{}", addr)
}

fn open(
    url: &str,
    id: &str,
    name: &str,
) -> (Session<RelayTransport>, UnboundedReceiver<TransportEvent>) {
    let config = RelayConfig {
        reconnect: false,
        ..RelayConfig::new(url)
    };
    let (transport, events) = RelayTransport::join(config, "session-1", id);
    let document = Document::new("demo.js", "let x=1;");
    let session = Session::new(transport, document, name, VersionStore::in_memory());
    (session, events)
}

/// Feed events until one produces an update matching `wanted`
async fn wait_for(
    session: &mut Session<RelayTransport>,
    events: &mut UnboundedReceiver<TransportEvent>,
    wanted: impl Fn(&SessionUpdate) -> bool,
) -> SessionUpdate {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("transport closed");
        let update = session.handle_transport_event(event);
        if wanted(&update) {
            return update;
        }
    }
}

#[tokio::test]
async fn test_edit_reaches_peer_through_relay() {
    let url = start_relay().await;

    let (mut a, mut a_events) = open(&url, "a", "Ada");
    wait_for(&mut a, &mut a_events, |u| *u == SessionUpdate::Subscribed).await;

    let (mut b, mut b_events) = open(&url, "b", "Bob");
    wait_for(&mut b, &mut b_events, |u| *u == SessionUpdate::Subscribed).await;

    // A sees B's announcement and answers with its own
    wait_for(&mut a, &mut a_events, |u| {
        matches!(u, SessionUpdate::ParticipantJoined { .. })
    })
    .await;
    wait_for(&mut b, &mut b_events, |u| {
        matches!(u, SessionUpdate::ParticipantJoined { .. })
    })
    .await;
    assert!(a.presence().contains("b"));
    assert!(b.presence().contains("a"));

    assert_eq!(a.edit("let x=2;"), EditOutcome::Applied);
    let update = wait_for(&mut b, &mut b_events, |u| {
        matches!(u, SessionUpdate::ContentReplaced { .. })
    })
    .await;

    assert_eq!(
        update,
        SessionUpdate::ContentReplaced {
            origin: "a".to_string()
        }
    );
    assert_eq!(b.content(), "let x=2;");
    assert_eq!(b.history().len(), 2);

    a.close();
    wait_for(&mut b, &mut b_events, |u| {
        matches!(u, SessionUpdate::ParticipantLeft { .. })
    })
    .await;
    assert!(b.presence().is_empty());
}
