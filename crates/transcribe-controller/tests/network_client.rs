//! Integration tests for the reconnecting WebSocket client.
//!
//! # Purpose
//!
//! These tests run a real [`NetworkClient`] against a loopback
//! tokio-tungstenite server and verify the delivery rules end to end:
//!
//! - Events queued while no server is reachable are sent in order once a
//!   connection exists.
//! - Malformed inbound frames are skipped; the next valid one is handled.
//! - After the server drops the connection the client reconnects, and an
//!   event already delivered on the old connection is not resent.
//! - An event pushed while the client is reconnecting is sent on the new
//!   connection; events racing the drop are never delivered twice.
//! - A handshake that never completes counts as a failed attempt.
//! - `stop()` is idempotent, closes the connection and ends both tasks.
//!
//! Every wait is bounded by a timeout so a regression fails instead of
//! hanging the test run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use transcribe_controller::application::inbound::InboundHandler;
use transcribe_controller::bus::{BusHandle, EventBus};
use transcribe_controller::infrastructure::network::{
    NetworkClient, NetworkClientConfig, NetworkTasks,
};
use transcribe_core::{BackoffPolicy, ConnectionState, Event, InboundMessage};

const WAIT: Duration = Duration::from_secs(5);

// ── Test doubles ──────────────────────────────────────────────────────────────

/// Forwards every inbound message to the test body.
struct ChannelHandler(mpsc::UnboundedSender<InboundMessage>);

#[async_trait]
impl InboundHandler for ChannelHandler {
    async fn handle(&self, message: InboundMessage) {
        let _ = self.0.send(message);
    }
}

struct Harness {
    bus: BusHandle,
    client: Arc<NetworkClient>,
    tasks: NetworkTasks,
    inbound: mpsc::UnboundedReceiver<InboundMessage>,
}

fn start_client(url: String, connect_timeout: Duration) -> Harness {
    let (bus, _commands, outbound) = EventBus::new().split();
    let (tx, inbound) = mpsc::unbounded_channel();
    let client = Arc::new(NetworkClient::new(
        NetworkClientConfig {
            url,
            backoff: BackoffPolicy::new(Duration::from_millis(20), Duration::from_millis(100)),
            connect_timeout,
        },
        bus.shutdown().clone(),
        Arc::new(ChannelHandler(tx)),
    ));
    let tasks = client.spawn(outbound);
    Harness {
        bus,
        client,
        tasks,
        inbound,
    }
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (tcp, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("client must connect")
        .unwrap();
    accept_async(tcp).await.expect("handshake")
}

/// Reads the next text frame and returns its `command` field.
async fn next_command(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let frame = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("frame must arrive")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            let json: Value = serde_json::from_str(&text).expect("client sends JSON");
            return json["command"].as_str().expect("command key").to_string();
        }
    }
}

async fn wait_for_state(states: &mut watch::Receiver<ConnectionState>, wanted: ConnectionState) {
    tokio::time::timeout(WAIT, states.wait_for(|s| *s == wanted))
        .await
        .unwrap_or_else(|_| panic!("client never reached {wanted}"))
        .unwrap();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Events pushed before any server exists stay queued and arrive in order
/// once the server comes up.
#[tokio::test]
async fn test_events_queued_while_disconnected_are_sent_in_order_after_connect() {
    // Arrange: reserve a port, then free it so the first attempts fail.
    let port = {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap().port()
    };
    let h = start_client(format!("ws://127.0.0.1:{port}"), Duration::from_secs(1));
    for name in ["first", "second", "third"] {
        h.bus.push_outbound(Event::new(name)).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_ne!(h.client.state(), ConnectionState::Connected);

    // Act: bring the server up on the reserved port
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let mut ws = accept(&listener).await;

    // Assert
    assert_eq!(next_command(&mut ws).await, "first");
    assert_eq!(next_command(&mut ws).await, "second");
    assert_eq!(next_command(&mut ws).await, "third");

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
}

/// A garbage frame must not stop the receive loop.
#[tokio::test]
async fn test_malformed_frame_is_skipped_and_next_message_handled() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let mut h = start_client(url, Duration::from_secs(1));
    let mut ws = accept(&listener).await;

    // Act
    ws.send(Message::Text("garbage{".into())).await.unwrap();
    ws.send(Message::Text(
        r#"{"type":"frontend_response","command":"get_transcription","transcription":"final text"}"#
            .into(),
    ))
    .await
    .unwrap();

    // Assert
    let received = tokio::time::timeout(WAIT, h.inbound.recv())
        .await
        .expect("valid message must be handled")
        .unwrap();
    assert_eq!(
        received,
        InboundMessage::Transcription {
            text: "final text".to_string()
        }
    );
    assert_eq!(h.client.state(), ConnectionState::Connected);

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
}

/// After a drop the client reconnects; the event delivered on the first
/// connection is not replayed on the second.
#[tokio::test]
async fn test_reconnects_after_drop_without_resending_delivered_events() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let h = start_client(url, Duration::from_secs(1));
    let mut states = h.client.subscribe_state();

    let mut first = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;
    h.bus.push_outbound(Event::new("before_drop")).unwrap();
    assert_eq!(next_command(&mut first).await, "before_drop");

    // Act: server goes away, client must notice and come back
    drop(first);
    tokio::time::timeout(WAIT, states.wait_for(|s| *s != ConnectionState::Connected))
        .await
        .expect("client must notice the drop")
        .unwrap();
    let mut second = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;
    h.bus.push_outbound(Event::new("after_reconnect")).unwrap();

    // Assert
    assert_eq!(next_command(&mut second).await, "after_reconnect");

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
}

/// An event pushed after the connection dropped, while the client is still
/// reconnecting, waits in the queue and goes out on the new connection.
#[tokio::test]
async fn test_event_pushed_while_reconnecting_is_sent_on_new_connection() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let h = start_client(url, Duration::from_secs(1));
    let mut states = h.client.subscribe_state();
    let first = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;

    // Act: drop the server side, then push while the client is down
    drop(first);
    tokio::time::timeout(WAIT, states.wait_for(|s| *s != ConnectionState::Connected))
        .await
        .expect("client must notice the drop")
        .unwrap();
    h.bus.push_outbound(Event::new("queued_while_down")).unwrap();
    let mut second = accept(&listener).await;

    // Assert
    assert_eq!(next_command(&mut second).await, "queued_while_down");

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
}

/// Events pushed right as the server vanishes may be written into the dead
/// connection.  Whatever happens to them, none is delivered twice, and the
/// client recovers and delivers later events.
#[tokio::test]
async fn test_events_racing_a_dead_connection_are_never_duplicated() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let h = start_client(url, Duration::from_secs(1));
    let mut states = h.client.subscribe_state();
    let first = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;

    // Act: no waiting between the drop and the pushes
    drop(first);
    for i in 0..5 {
        h.bus.push_outbound(Event::new(format!("racing_{i}"))).unwrap();
    }
    let mut second = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;
    h.bus.push_outbound(Event::new("after_recovery")).unwrap();

    // Assert
    let mut seen = Vec::new();
    loop {
        let command = next_command(&mut second).await;
        if command == "after_recovery" {
            break;
        }
        seen.push(command);
    }
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), seen.len(), "duplicate delivery: {seen:?}");
    assert!(seen.iter().all(|c| c.starts_with("racing_")), "unexpected: {seen:?}");

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
}

/// A listener that never completes the WebSocket handshake triggers the
/// connect timeout, and the client keeps retrying.
#[tokio::test]
async fn test_handshake_timeout_counts_as_failed_attempt() {
    // Arrange: accepted by the kernel backlog, never answered
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let h = start_client(url, Duration::from_millis(100));
    let mut states = h.client.subscribe_state();

    // Act / Assert: two full Connecting → Disconnected cycles
    for _ in 0..2 {
        wait_for_state(&mut states, ConnectionState::Connecting).await;
        wait_for_state(&mut states, ConnectionState::Disconnected).await;
    }
    assert_ne!(h.client.state(), ConnectionState::Connected);

    h.client.stop().await;
    tokio::time::timeout(WAIT, h.tasks.join()).await.unwrap();
    drop(listener);
}

/// `stop()` twice is the same as once: the server sees the connection end
/// and both client tasks finish.
#[tokio::test]
async fn test_stop_is_idempotent_and_closes_connection() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let h = start_client(url, Duration::from_secs(1));
    let mut states = h.client.subscribe_state();
    let mut ws = accept(&listener).await;
    wait_for_state(&mut states, ConnectionState::Connected).await;

    // Act
    h.client.stop().await;
    h.client.stop().await;

    // Assert
    tokio::time::timeout(WAIT, h.tasks.join())
        .await
        .expect("tasks must end after stop");
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert!(h.bus.shutdown().is_triggered());

    let ended = tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "server must observe the connection closing");
}
