//! PDF submission use case.
//!
//! Scanned documents are dropped into a submission folder.  When asked to
//! (`check-folder`) the controller waits a short window for at least one
//! matching file to appear, then submits every match; the filesystem watcher
//! submits single files (`file-detected`).
//!
//! Submitting a file means:
//!
//! 1. Read its bytes.
//! 2. Hand a `submit_pdf` event (hex payload + file name) to the caller's
//!    `emit` function, which enqueues it on the outbound queue.
//! 3. Delete the file so it is not submitted twice.
//!
//! The file is only deleted after the event was accepted by the queue.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use transcribe_core::Event;

use crate::bus::{BusError, Shutdown};

/// Default time to wait for a file to show up after `check-folder`.
pub const DEFAULT_WAIT_WINDOW: Duration = Duration::from_secs(5);

/// Interval between directory scans inside the wait window.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(250);

/// Error type for the submission use case.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to list submission folder {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete submitted file {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no usable file name")]
    NoFileName(PathBuf),
    #[error("submission not queued: {0}")]
    Bus(#[from] BusError),
}

// ── File name pattern ─────────────────────────────────────────────────────────

/// Shell-style file name pattern supporting `*` and `?`.
///
/// Matching is case-sensitive and applies to the file name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    pattern: Vec<char>,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.chars().collect(),
        }
    }

    /// Returns `true` if `name` matches the whole pattern.
    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.chars().collect();
        let (mut p, mut n) = (0, 0);
        // Position of the last `*` and the name index it was tried against.
        let mut backtrack: Option<(usize, usize)> = None;

        while n < name.len() {
            match self.pattern.get(p) {
                Some('*') => {
                    backtrack = Some((p, n));
                    p += 1;
                }
                Some('?') => {
                    p += 1;
                    n += 1;
                }
                Some(&c) if c == name[n] => {
                    p += 1;
                    n += 1;
                }
                _ => match backtrack {
                    Some((star, tried)) => {
                        p = star + 1;
                        n = tried + 1;
                        backtrack = Some((star, tried + 1));
                    }
                    None => return false,
                },
            }
        }

        self.pattern[p..].iter().all(|&c| c == '*')
    }

    /// Returns `true` if the final component of `path` matches.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.matches(n))
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        Self::new("*.pdf")
    }
}

// ── Submitter ─────────────────────────────────────────────────────────────────

/// Settings for [`PdfSubmitter`].
#[derive(Debug, Clone)]
pub struct PdfSubmitterConfig {
    /// Folder scanned by `check-folder`.
    pub dir: PathBuf,
    /// File names that count as submissions.
    pub pattern: FilePattern,
    /// How long `check-folder` waits for a first match.
    pub wait_window: Duration,
    /// Delay between scans inside the window.
    pub scan_interval: Duration,
}

impl Default for PdfSubmitterConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./pdf_for_submission"),
            pattern: FilePattern::default(),
            wait_window: DEFAULT_WAIT_WINDOW,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

/// Finds and submits PDF files from the submission folder.
#[derive(Debug, Clone)]
pub struct PdfSubmitter {
    config: PdfSubmitterConfig,
}

impl PdfSubmitter {
    pub fn new(config: PdfSubmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PdfSubmitterConfig {
        &self.config
    }

    /// Lists matching files in the submission folder, sorted by name.
    ///
    /// A missing folder yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::ListDir`] if the folder exists but cannot be read.
    pub async fn list_matches(&self) -> Result<Vec<PathBuf>, SubmitError> {
        let dir = &self.config.dir;
        let list_err = |source| SubmitError::ListDir {
            path: dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("submission folder {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(list_err(e)),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && self.config.pattern.matches_path(&path) {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// Scans the folder every `scan_interval` until at least one file matches
    /// or `wait_window` elapses.
    ///
    /// Returns the matches from the first non-empty scan, or an empty list if
    /// the window expired or `shutdown` was triggered.
    pub async fn wait_for_matches(&self, shutdown: &Shutdown) -> Result<Vec<PathBuf>, SubmitError> {
        let deadline = Instant::now() + self.config.wait_window;

        loop {
            let matches = self.list_matches().await?;
            if !matches.is_empty() {
                return Ok(matches);
            }
            if Instant::now() >= deadline {
                info!(
                    "no files matching the submission pattern appeared in {}",
                    self.config.dir.display()
                );
                return Ok(Vec::new());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.scan_interval) => {}
                _ = shutdown.triggered() => return Ok(Vec::new()),
            }
        }
    }

    /// Reads `path`, passes the `submit_pdf` event to `emit`, then deletes
    /// the file.
    ///
    /// # Errors
    ///
    /// The file is left in place if reading fails or `emit` refuses the event.
    pub async fn submit<F>(&self, path: &Path, emit: F) -> Result<(), SubmitError>
    where
        F: FnOnce(Event) -> Result<(), BusError>,
    {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SubmitError::NoFileName(path.to_path_buf()))?;

        let data = tokio::fs::read(path).await.map_err(|source| SubmitError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let size = data.len();

        emit(Event::submit_pdf(filename, &data))?;

        tokio::fs::remove_file(path)
            .await
            .map_err(|source| SubmitError::Delete {
                path: path.to_path_buf(),
                source,
            })?;

        info!("submitted {filename} ({size} bytes)");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
