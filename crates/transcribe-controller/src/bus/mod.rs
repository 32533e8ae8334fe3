//! The in-process event bus.
//!
//! The bus is the single serialization point of the controller.  It owns two
//! independent FIFO queues and the shared [`Shutdown`] signal:
//!
//! ```text
//!  hotkey hook ─┐
//!  HTTP API  ───┼─► Command queue ─► Dispatcher ─► Outbound queue ─► NetworkClient ─► server
//!  watcher   ───┘
//! ```
//!
//! # Why unbounded channels? (for beginners)
//!
//! Producers include callbacks that run on foreign OS threads (a keyboard
//! hook, the filesystem watcher).  Those callbacks must never block and have
//! no Tokio runtime to `.await` on, so `push` is a plain synchronous call.
//! `tokio::sync::mpsc::UnboundedSender::send` satisfies both requirements: it
//! is lock-free, never waits, and can be called from any thread.
//!
//! The consumer side is async and timeout-bounded.  `pop(timeout)` returns
//! [`Popped::Empty`] when nothing arrives in time, which gives every loop a
//! regular opportunity to check the shutdown signal.

pub mod shutdown;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use transcribe_core::{Command, Event};

pub use shutdown::Shutdown;

/// How long consumer loops wait on a queue before re-checking shutdown.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors returned by the producer side of a queue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Shutdown has been signalled; new work is refused.
    #[error("bus is shutting down")]
    ShutDown,
    /// The consumer has been dropped.
    #[error("queue consumer is gone")]
    Closed,
}

/// Result of a timeout-bounded pop.
#[derive(Debug, PartialEq)]
pub enum Popped<T> {
    /// The next item in FIFO order.
    Item(T),
    /// Nothing arrived before the timeout.
    Empty,
    /// Every producer has been dropped and the queue is drained.
    Closed,
}

// ── Generic queue halves ──────────────────────────────────────────────────────

/// Cloneable, thread-safe producer half of a queue.
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::UnboundedSender<T>,
    shutdown: Shutdown,
}

// Manual impl: `#[derive(Clone)]` would wrongly require `T: Clone`.
impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueues `item` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ShutDown`] once shutdown has been triggered and
    /// [`BusError::Closed`] if the consumer no longer exists.
    pub fn push(&self, item: T) -> Result<(), BusError> {
        if self.shutdown.is_triggered() {
            return Err(BusError::ShutDown);
        }
        self.tx.send(item).map_err(|_| BusError::Closed)
    }

    /// The shutdown signal this queue refuses work after.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }
}

/// Single-consumer half of a queue.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> QueueReceiver<T> {
    /// Waits up to `timeout` for the next item.
    pub async fn pop(&mut self, timeout: Duration) -> Popped<T> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(item)) => Popped::Item(item),
            Ok(None) => Popped::Closed,
            Err(_elapsed) => Popped::Empty,
        }
    }

    /// Takes the next item if one is already queued.
    pub fn try_pop(&mut self) -> Popped<T> {
        match self.rx.try_recv() {
            Ok(item) => Popped::Item(item),
            Err(mpsc::error::TryRecvError::Empty) => Popped::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => Popped::Closed,
        }
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Discards every queued item and returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

fn queue<T>(shutdown: Shutdown) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx, shutdown }, QueueReceiver { rx })
}

// ── Typed handles ─────────────────────────────────────────────────────────────

/// Producer handle for the command queue.
pub type CommandSender = QueueSender<Command>;
/// Consumer handle for the command queue (owned by the dispatcher).
pub type CommandReceiver = QueueReceiver<Command>;
/// Producer handle for the outbound queue.
pub type OutboundSender = QueueSender<Event>;
/// Consumer handle for the outbound queue (owned by the network client).
pub type OutboundReceiver = QueueReceiver<Event>;

impl QueueReceiver<Command> {
    /// Waits up to `timeout` for the next command.
    pub async fn pop_command(&mut self, timeout: Duration) -> Popped<Command> {
        self.pop(timeout).await
    }
}

impl QueueReceiver<Event> {
    /// Waits up to `timeout` for the next outbound event.
    pub async fn pop_outbound(&mut self, timeout: Duration) -> Popped<Event> {
        self.pop(timeout).await
    }
}

/// Both queues plus the shutdown signal, before being split into handles.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use transcribe_controller::bus::{EventBus, Popped};
/// use transcribe_core::Command;
///
/// # tokio_test::block_on(async {
/// let bus = EventBus::new();
/// bus.push_command(Command::CheckFolder).unwrap();
///
/// let (_handle, mut commands, _outbound) = bus.split();
/// assert_eq!(commands.pop_command(Duration::from_millis(10)).await, Popped::Item(Command::CheckFolder));
/// # });
/// ```
#[derive(Debug)]
pub struct EventBus {
    handle: BusHandle,
    commands: CommandReceiver,
    outbound: OutboundReceiver,
}

/// Cloneable producer side of the bus.
#[derive(Debug, Clone)]
pub struct BusHandle {
    commands: CommandSender,
    outbound: OutboundSender,
    shutdown: Shutdown,
}

impl EventBus {
    /// Creates a bus with its own shutdown signal.
    pub fn new() -> Self {
        Self::with_shutdown(Shutdown::new())
    }

    /// Creates a bus that refuses work once `shutdown` is triggered.
    pub fn with_shutdown(shutdown: Shutdown) -> Self {
        let (command_tx, commands) = queue(shutdown.clone());
        let (outbound_tx, outbound) = queue(shutdown.clone());
        Self {
            handle: BusHandle {
                commands: command_tx,
                outbound: outbound_tx,
                shutdown,
            },
            commands,
            outbound,
        }
    }

    pub fn handle(&self) -> &BusHandle {
        &self.handle
    }

    /// Enqueues a command; see [`QueueSender::push`].
    pub fn push_command(&self, command: Command) -> Result<(), BusError> {
        self.handle.push_command(command)
    }

    /// Enqueues an outbound event; see [`QueueSender::push`].
    pub fn push_outbound(&self, event: Event) -> Result<(), BusError> {
        self.handle.push_outbound(event)
    }

    /// Splits the bus into its producer handle and the two consumers.
    pub fn split(self) -> (BusHandle, CommandReceiver, OutboundReceiver) {
        (self.handle, self.commands, self.outbound)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusHandle {
    pub fn push_command(&self, command: Command) -> Result<(), BusError> {
        self.commands.push(command)
    }

    pub fn push_outbound(&self, event: Event) -> Result<(), BusError> {
        self.outbound.push(event)
    }

    /// A producer handle restricted to the command queue.
    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// A producer handle restricted to the outbound queue.
    pub fn outbound_sender(&self) -> OutboundSender {
        self.outbound.clone()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
