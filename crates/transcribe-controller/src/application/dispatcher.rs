//! The command dispatcher: the single consumer of the command queue.
//!
//! Every input source funnels into this one loop, which turns [`Command`]s
//! into domain actions and outbound [`Event`]s.  Commands are handled one at
//! a time in queue order; a slow handler (the `check-folder` wait window)
//! delays later commands but never reorders them.
//!
//! # Session state
//!
//! The dispatcher owns the mutable session state outright:
//!
//! - the [`TransportState`] mirror of the audio player, and
//! - the operator's user id, attached as `user_id` to every event it emits.
//!
//! Nothing else writes this state.  The HTTP endpoint changes the user id by
//! enqueuing `set-user-id`, like any other producer.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use transcribe_core::protocol::event::names;
use transcribe_core::{Command, Event, ProtocolError, TransportState};

use super::clipboard::{Clipboard, ClipboardError};
use super::pdf_submission::{PdfSubmitter, SubmitError};
use crate::bus::{BusError, CommandReceiver, OutboundSender, Popped, Shutdown, POLL_INTERVAL};
use crate::infrastructure::storage::user_store::{UserStore, UserStoreError};

/// Errors a single command handler can produce.  All are logged; none stop
/// the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("failed to encode event: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("event not queued: {0}")]
    Bus(#[from] BusError),
    #[error("failed to persist user id: {0}")]
    UserStore(#[from] UserStoreError),
}

/// Interprets commands and produces outbound events.
pub struct Dispatcher {
    transport: TransportState,
    user_id: Option<String>,
    outbound: OutboundSender,
    shutdown: Shutdown,
    clipboard: Arc<dyn Clipboard>,
    user_store: Arc<dyn UserStore>,
    submitter: PdfSubmitter,
}

impl Dispatcher {
    /// Creates a dispatcher, restoring the persisted user id if there is one.
    pub fn new(
        outbound: OutboundSender,
        clipboard: Arc<dyn Clipboard>,
        user_store: Arc<dyn UserStore>,
        submitter: PdfSubmitter,
    ) -> Self {
        let user_id = match user_store.load() {
            Ok(id) => id,
            Err(e) => {
                warn!("could not load stored user id: {e}");
                None
            }
        };
        if let Some(id) = &user_id {
            info!("restored user id '{id}'");
        }

        Self {
            transport: TransportState::default(),
            user_id,
            shutdown: outbound.shutdown().clone(),
            outbound,
            clipboard,
            user_store,
            submitter,
        }
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Consumes commands until shutdown is signalled or every producer is
    /// gone.
    pub async fn run(mut self, mut commands: CommandReceiver) {
        info!("dispatcher started");

        while !self.shutdown.is_triggered() {
            match commands.pop_command(POLL_INTERVAL).await {
                Popped::Item(command) => {
                    let kind = command.kind();
                    debug!("dispatching {command}");
                    if let Err(e) = self.handle(command).await {
                        error!("{kind} failed: {e}");
                    }
                }
                Popped::Empty => {}
                Popped::Closed => {
                    info!("command queue closed");
                    break;
                }
            }
        }

        let discarded = commands.drain();
        if discarded > 0 {
            debug!("discarded {discarded} queued command(s) at shutdown");
        }
        info!("dispatcher stopped");
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns the first error the handler hit.  Session state changes made
    /// before the error are kept.
    pub async fn handle(&mut self, command: Command) -> Result<(), DispatchError> {
        match command {
            Command::Stop => {
                if self.shutdown.trigger() {
                    info!("stop requested; shutting down");
                }
                Ok(())
            }
            Command::CheckFolder => self.check_folder().await,
            Command::FileDetected(path) => self.file_detected(&path).await,
            Command::TransportToggle => {
                self.transport.toggle();
                self.emit_transport(names::PLAY_PAUSE)
            }
            Command::TransportSeekBack => {
                self.transport.seek_back();
                self.emit_transport(names::BACKWARD_AUDIO)
            }
            Command::TransportSeekForward => {
                self.transport.seek_forward();
                self.emit_transport(names::FORWARD_AUDIO)
            }
            Command::TransportPrev => {
                self.transport.previous(epoch_secs());
                self.emit_transport(names::PREVIOUS_AUDIO)
            }
            Command::TransportNext => {
                self.transport.next(epoch_secs());
                self.emit_transport(names::NEXT_AUDIO)
            }
            Command::ExportRequest => Ok(self.emit(Event::get_transcription())?),
            Command::ExportSave => {
                let content = self.clipboard.read_text()?;
                info!("sending edited transcription ({} chars)", content.chars().count());
                Ok(self.emit(Event::save_edited_transcription(content))?)
            }
            Command::SetUserId(id) => {
                info!("user id set to '{id}'");
                self.user_id = Some(id.clone());
                Ok(self.user_store.save(&id)?)
            }
        }
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    async fn check_folder(&self) -> Result<(), DispatchError> {
        let matches = self.submitter.wait_for_matches(&self.shutdown).await?;
        for path in matches {
            if let Err(e) = self.submit(&path).await {
                warn!("failed to submit {}: {e}", path.display());
            }
        }
        Ok(())
    }

    async fn file_detected(&self, path: &Path) -> Result<(), DispatchError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("{} vanished before it could be submitted", path.display());
            return Ok(());
        }
        self.submit(path).await
    }

    async fn submit(&self, path: &Path) -> Result<(), DispatchError> {
        self.submitter
            .submit(path, |event| self.emit(event))
            .await
            .map_err(DispatchError::from)
    }

    fn emit_transport(&self, command: &str) -> Result<(), DispatchError> {
        let event = Event::transport(command, &self.transport)?;
        debug!("transport now {:?}", self.transport);
        Ok(self.emit(event)?)
    }

    /// Stamps the user id onto `event` and enqueues it.
    fn emit(&self, event: Event) -> Result<(), BusError> {
        let event = match &self.user_id {
            Some(id) => event.with_field("user_id", id.as_str()),
            None => event,
        };
        self.outbound.push(event)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
