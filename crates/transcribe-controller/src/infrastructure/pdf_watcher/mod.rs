//! Submission-folder watcher.
//!
//! Watches the PDF folder (non-recursively) and enqueues
//! `file-detected(path)` for every new file whose name matches the
//! submission pattern.  Files moved into the folder count as new.
//!
//! Events are debounced so a file still being written by a scanner is
//! reported once, after the burst of writes settles.  The debouncer calls
//! back on its own OS thread, which is why it enqueues through the
//! synchronous [`CommandSender::push`].
//!
//! Dropping the [`PdfWatcher`] stops watching.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use thiserror::Error;
use tracing::{debug, error, info};
use transcribe_core::Command;

use crate::application::pdf_submission::FilePattern;
use crate::bus::CommandSender;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create watched folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Handle keeping the folder watch alive.
pub struct PdfWatcher {
    dir: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
}

impl PdfWatcher {
    /// Starts watching `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::CreateDir`] if the folder cannot be created and
    /// [`WatchError::Notify`] if the OS watch cannot be installed.
    pub fn start(
        dir: &Path,
        pattern: FilePattern,
        commands: CommandSender,
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        std::fs::create_dir_all(dir).map_err(|source| WatchError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let events: Vec<Event> = events.into_iter().map(|e| e.event).collect();
                    for path in detected_paths(&events, &pattern) {
                        debug!("detected {}", path.display());
                        if let Err(e) = commands.push(Command::FileDetected(path)) {
                            debug!("file detection not queued: {e}");
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("folder watch error: {e}");
                    }
                }
            }
        })?;

        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)?;
        info!("watching {} for new PDFs", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            _debouncer: debouncer,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Returns every distinct path in `events` that was created (or moved in)
/// and matches `pattern`, in path order.
fn detected_paths(events: &[Event], pattern: &FilePattern) -> Vec<PathBuf> {
    let paths: BTreeSet<&PathBuf> = events
        .iter()
        .filter(|e| is_arrival(&e.kind))
        .flat_map(|e| e.paths.iter())
        .filter(|p| pattern.matches_path(p))
        .collect();
    paths.into_iter().cloned().collect()
}

fn is_arrival(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
