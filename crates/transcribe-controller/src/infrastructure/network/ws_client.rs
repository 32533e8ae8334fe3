//! Reconnecting WebSocket client bridging the outbound queue to the server.
//!
//! # State machine
//!
//! ```text
//!            ┌──────────── backoff sleep ◀───────────┐
//!            ▼                                        │ error / close
//! Disconnected ──▶ Connecting ──▶ Connected ──────────┘
//!                      │ failure / timeout
//!                      └──▶ Disconnected ──▶ backoff sleep ──▶ Connecting …
//! ```
//!
//! The state is published on a `watch` channel.  The send task waits for
//! `Connected` before taking anything off the outbound queue, so events
//! produced while the server is unreachable are delivered in order once a
//! connection exists.
//!
//! # Delivery guarantee
//!
//! At most once.  An event whose write fails is dropped, the failure is
//! logged, and the connection is torn down so the connection task
//! reconnects.  Nothing is resent on the next connection.
//!
//! An event that was never written is not lost: if the connection goes away
//! between taking an event off the queue and writing it, the send task keeps
//! it and writes it first on the next connection.
//!
//! Writes race the shutdown signal and the close frame is bounded by a
//! timeout, so a peer that stops reading cannot stall teardown.
//!
//! # Why a per-connection `Notify`?
//!
//! When a write fails the send task must wake the connection task, which is
//! parked reading frames.  The `Notify` lives inside [`Link`] together with
//! the write half, so a wake-up left over from one connection can never tear
//! down the next.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use transcribe_core::{decode_inbound, Backoff, ConnectionState, Event};

use super::{NetworkClientConfig, NetworkError};
use crate::application::inbound::InboundHandler;
use crate::bus::{OutboundReceiver, Popped, Shutdown, POLL_INTERVAL};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on delivering the close frame to a peer that stopped reading.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// What became of an event handed to the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendOutcome {
    Sent,
    /// No connection; nothing was written and the event can be retried.
    NotConnected,
    /// The write failed, shutdown interrupted it, or it could not be
    /// encoded.  The event is gone.
    Dropped,
}

/// The write half of the live connection plus its teardown trigger.
struct Link {
    sink: SplitSink<WsStream, Message>,
    lost: Arc<Notify>,
}

/// Maintains at most one live connection to the transcription server.
pub struct NetworkClient {
    config: NetworkClientConfig,
    shutdown: Shutdown,
    handler: Arc<dyn InboundHandler>,
    state_tx: watch::Sender<ConnectionState>,
    link: Mutex<Option<Link>>,
}

/// Join handles for the two tasks started by [`NetworkClient::spawn`].
pub struct NetworkTasks {
    connection: JoinHandle<()>,
    sender: JoinHandle<()>,
}

impl NetworkTasks {
    /// Waits for both tasks to finish.
    pub async fn join(self) {
        if let Err(e) = self.connection.await {
            error!("network connection task panicked: {e}");
        }
        if let Err(e) = self.sender.await {
            error!("network send task panicked: {e}");
        }
    }
}

impl NetworkClient {
    /// Creates a client in the `Disconnected` state.  Nothing happens until
    /// [`spawn`](Self::spawn) is called.
    pub fn new(
        config: NetworkClientConfig,
        shutdown: Shutdown,
        handler: Arc<dyn InboundHandler>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            shutdown,
            handler,
            state_tx,
            link: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Read-only view of the connection state for other tasks.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Starts the connection task and the send task.
    pub fn spawn(self: &Arc<Self>, outbound: OutboundReceiver) -> NetworkTasks {
        let connection = tokio::spawn(Arc::clone(self).connection_loop());
        let sender = tokio::spawn(Arc::clone(self).send_loop(outbound));
        NetworkTasks { connection, sender }
    }

    /// Signals shutdown and closes the live connection, if any.
    ///
    /// Safe to call any number of times.
    pub async fn stop(&self) {
        if self.shutdown.trigger() {
            info!("network client stopping");
        }
        self.close_link().await;
    }

    // ── Connection task ───────────────────────────────────────────────────────

    async fn connection_loop(self: Arc<Self>) {
        let mut backoff = Backoff::new(self.config.backoff);

        while !self.shutdown.is_triggered() {
            self.set_state(ConnectionState::Connecting);

            let outcome = match self.connect().await {
                Ok(stream) => {
                    backoff.reset();
                    let (sink, stream) = stream.split();
                    let lost = Arc::new(Notify::new());
                    *self.link.lock().await = Some(Link {
                        sink,
                        lost: Arc::clone(&lost),
                    });
                    self.set_state(ConnectionState::Connected);
                    info!("connected to {}", self.config.url);

                    let outcome = self.receive_loop(stream, &lost).await;
                    self.close_link().await;
                    outcome
                }
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    Err(e)
                }
            };

            if self.shutdown.is_triggered() {
                break;
            }
            if let Err(e) = outcome {
                warn!("{e}");
            }

            let delay = backoff.next_delay();
            info!("reconnecting in {:.1}s", delay.as_secs_f64());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.triggered() => break,
            }
        }

        self.set_state(ConnectionState::Disconnected);
        debug!("network connection task stopped");
    }

    async fn connect(&self) -> Result<WsStream, NetworkError> {
        let url = &self.config.url;
        let timeout = self.config.connect_timeout;
        debug!("connecting to {url}");

        tokio::select! {
            result = tokio::time::timeout(timeout, connect_async(url.as_str())) => match result {
                Ok(Ok((stream, _response))) => Ok(stream),
                Ok(Err(source)) => Err(NetworkError::Connect { url: url.clone(), source }),
                Err(_elapsed) => Err(NetworkError::ConnectTimeout { url: url.clone(), timeout }),
            },
            _ = self.shutdown.triggered() => Err(NetworkError::Closed),
        }
    }

    /// Reads frames until the connection ends.
    ///
    /// Returns `Ok(())` only when shutdown interrupted the read.
    async fn receive_loop(
        &self,
        mut stream: SplitStream<WsStream>,
        lost: &Notify,
    ) -> Result<(), NetworkError> {
        loop {
            let frame = tokio::select! {
                frame = stream.next() => frame,
                _ = lost.notified() => return Err(NetworkError::Closed),
                _ = self.shutdown.triggered() => return Ok(()),
            };

            match frame {
                Some(Ok(Message::Text(text))) => self.dispatch_inbound(&text).await,
                Some(Ok(Message::Binary(data))) => {
                    debug!("ignoring {} byte binary frame", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("server closed the connection: {frame:?}");
                    return Err(NetworkError::Closed);
                }
                // Ping/Pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(NetworkError::Receive(e)),
                None => return Err(NetworkError::Closed),
            }
        }
    }

    async fn dispatch_inbound(&self, text: &str) {
        match decode_inbound(text) {
            Ok(message) => {
                debug!("received {message:?}");
                self.handler.handle(message).await;
            }
            Err(e) => warn!("skipping malformed server message: {e}"),
        }
    }

    // ── Send task ─────────────────────────────────────────────────────────────

    async fn send_loop(self: Arc<Self>, mut outbound: OutboundReceiver) {
        let mut state_rx = self.state_tx.subscribe();
        // An event taken off the queue that found no live connection.  It is
        // written before anything else once the client reconnects.
        let mut pending: Option<Event> = None;

        while !self.shutdown.is_triggered() {
            let connected = state_rx.borrow_and_update().is_connected();
            if !connected {
                let _ = tokio::time::timeout(POLL_INTERVAL, state_rx.changed()).await;
                continue;
            }

            let event = match pending.take() {
                Some(event) => event,
                None => tokio::select! {
                    popped = outbound.pop_outbound(POLL_INTERVAL) => match popped {
                        Popped::Item(event) => event,
                        Popped::Empty => continue,
                        Popped::Closed => break,
                    },
                    // The connection went up or down while waiting; re-check
                    // before taking anything off the queue.
                    _ = state_rx.changed() => continue,
                },
            };

            if self.send_event(&event).await == SendOutcome::NotConnected {
                debug!("holding '{}' until the next connection", event.command);
                pending = Some(event);
            }
        }

        let discarded = outbound.drain() + usize::from(pending.is_some());
        if discarded > 0 {
            info!("discarded {discarded} unsent outbound event(s)");
        }
        debug!("network send task stopped");
    }

    async fn send_event(&self, event: &Event) -> SendOutcome {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("dropping '{}': cannot encode: {e}", event.command);
                return SendOutcome::Dropped;
            }
        };

        let mut guard = self.link.lock().await;
        let Some(link) = guard.as_mut() else {
            return SendOutcome::NotConnected;
        };

        let result = tokio::select! {
            result = link.sink.send(Message::Text(text)) => result,
            _ = self.shutdown.triggered() => {
                debug!("shutdown interrupted sending '{}'", event.command);
                return SendOutcome::Dropped;
            }
        };

        match result {
            Ok(()) => {
                debug!("sent '{}'", event.command);
                SendOutcome::Sent
            }
            Err(e) => {
                warn!("'{}' dropped: {}", event.command, NetworkError::Send(e));
                // Leave `Connected` before releasing the lock so the send
                // task cannot pick up another event for this connection.
                self.set_state(ConnectionState::Disconnected);
                if let Some(link) = guard.take() {
                    link.lost.notify_one();
                }
                SendOutcome::Dropped
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                debug!("connection state {current} -> {state}");
                *current = state;
                true
            }
        });
    }

    /// Marks the client disconnected, then sends a close frame on the live
    /// connection, if any.
    async fn close_link(&self) {
        self.set_state(ConnectionState::Disconnected);
        let link = self.link.lock().await.take();
        if let Some(mut link) = link {
            link.lost.notify_one();
            match tokio::time::timeout(CLOSE_TIMEOUT, link.sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("close frame not delivered: {e}"),
                Err(_elapsed) => debug!("peer did not accept the close frame in {CLOSE_TIMEOUT:?}"),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
