//! The command vocabulary carried on the command queue.
//!
//! A [`Command`] is an instruction from an input adapter (HTTP endpoint,
//! folder watcher, keyboard hook) to the dispatcher.  Commands are plain
//! values: two commands with the same kind and payload are interchangeable.
//!
//! Adapters that only have strings at hand (query parameters, key bindings
//! read from a file) go through [`Command::from_parts`], which validates the
//! kind tag and whether a payload is required.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when building a [`Command`] from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The kind tag is not part of the vocabulary.
    #[error("unknown command kind: '{0}'")]
    UnknownKind(String),

    /// The kind needs a payload but none was given.
    #[error("command '{0}' requires a payload")]
    MissingPayload(CommandKind),

    /// The kind takes no payload but one was given.
    #[error("command '{0}' does not take a payload")]
    UnexpectedPayload(CommandKind),
}

/// Payload-free tag identifying a [`Command`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Stop,
    CheckFolder,
    FileDetected,
    TransportToggle,
    TransportSeekBack,
    TransportSeekForward,
    TransportPrev,
    TransportNext,
    ExportRequest,
    ExportSave,
    SetUserId,
}

impl CommandKind {
    /// Every kind, in declaration order.
    pub const ALL: [CommandKind; 11] = [
        CommandKind::Stop,
        CommandKind::CheckFolder,
        CommandKind::FileDetected,
        CommandKind::TransportToggle,
        CommandKind::TransportSeekBack,
        CommandKind::TransportSeekForward,
        CommandKind::TransportPrev,
        CommandKind::TransportNext,
        CommandKind::ExportRequest,
        CommandKind::ExportSave,
        CommandKind::SetUserId,
    ];

    /// Returns the kebab-case tag used on the ingress side.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Stop => "stop",
            CommandKind::CheckFolder => "check-folder",
            CommandKind::FileDetected => "file-detected",
            CommandKind::TransportToggle => "transport-toggle",
            CommandKind::TransportSeekBack => "transport-seek-back",
            CommandKind::TransportSeekForward => "transport-seek-forward",
            CommandKind::TransportPrev => "transport-prev",
            CommandKind::TransportNext => "transport-next",
            CommandKind::ExportRequest => "export-request",
            CommandKind::ExportSave => "export-save",
            CommandKind::SetUserId => "set-user-id",
        }
    }

    /// Returns `true` if commands of this kind carry a payload.
    pub fn takes_payload(self) -> bool {
        matches!(self, CommandKind::FileDetected | CommandKind::SetUserId)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CommandError::UnknownKind(s.to_string()))
    }
}

/// An instruction for the dispatcher.
///
/// Only [`Command::FileDetected`] and [`Command::SetUserId`] carry data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop the whole application.
    Stop,
    /// Wait a short window for files to appear in the submission folder.
    CheckFolder,
    /// A file appeared in the submission folder.
    FileDetected(PathBuf),
    /// Toggle play/pause.
    TransportToggle,
    /// Skip backward.
    TransportSeekBack,
    /// Skip forward.
    TransportSeekForward,
    /// Previous audio file.
    TransportPrev,
    /// Next audio file.
    TransportNext,
    /// Ask the server for the current transcription.
    ExportRequest,
    /// Send the edited transcription from the clipboard back to the server.
    ExportSave,
    /// Remember the identifier of the operator using this machine.
    SetUserId(String),
}

impl Command {
    /// Returns the payload-free tag of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Stop => CommandKind::Stop,
            Command::CheckFolder => CommandKind::CheckFolder,
            Command::FileDetected(_) => CommandKind::FileDetected,
            Command::TransportToggle => CommandKind::TransportToggle,
            Command::TransportSeekBack => CommandKind::TransportSeekBack,
            Command::TransportSeekForward => CommandKind::TransportSeekForward,
            Command::TransportPrev => CommandKind::TransportPrev,
            Command::TransportNext => CommandKind::TransportNext,
            Command::ExportRequest => CommandKind::ExportRequest,
            Command::ExportSave => CommandKind::ExportSave,
            Command::SetUserId(_) => CommandKind::SetUserId,
        }
    }

    /// Builds a command from a string kind tag and an optional payload.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownKind`] for tags outside the vocabulary,
    /// [`CommandError::MissingPayload`] when a payload-carrying kind has none,
    /// and [`CommandError::UnexpectedPayload`] when a plain kind is given one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use transcribe_core::{Command, CommandKind};
    ///
    /// let cmd = Command::from_parts("file-detected", Some("scan.pdf")).unwrap();
    /// assert_eq!(cmd.kind(), CommandKind::FileDetected);
    /// ```
    pub fn from_parts(kind: &str, payload: Option<&str>) -> Result<Self, CommandError> {
        let kind: CommandKind = kind.parse()?;

        match (kind.takes_payload(), payload) {
            (true, None) => return Err(CommandError::MissingPayload(kind)),
            (false, Some(_)) => return Err(CommandError::UnexpectedPayload(kind)),
            _ => {}
        }

        let command = match kind {
            CommandKind::Stop => Command::Stop,
            CommandKind::CheckFolder => Command::CheckFolder,
            CommandKind::FileDetected => {
                Command::FileDetected(PathBuf::from(payload.unwrap_or_default()))
            }
            CommandKind::TransportToggle => Command::TransportToggle,
            CommandKind::TransportSeekBack => Command::TransportSeekBack,
            CommandKind::TransportSeekForward => Command::TransportSeekForward,
            CommandKind::TransportPrev => Command::TransportPrev,
            CommandKind::TransportNext => Command::TransportNext,
            CommandKind::ExportRequest => Command::ExportRequest,
            CommandKind::ExportSave => Command::ExportSave,
            CommandKind::SetUserId => Command::SetUserId(payload.unwrap_or_default().to_string()),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::FileDetected(path) => write!(f, "{}({})", self.kind(), path.display()),
            Command::SetUserId(id) => write!(f, "{}({id})", self.kind()),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_tag_parses_back_to_itself() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.as_str().parse::<CommandKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind_tag_is_rejected() {
        let result = "rewind".parse::<CommandKind>();
        assert_eq!(result, Err(CommandError::UnknownKind("rewind".to_string())));
    }

    #[test]
    fn test_from_parts_builds_plain_command() {
        // Arrange / Act
        let cmd = Command::from_parts("check-folder", None).unwrap();

        // Assert
        assert_eq!(cmd, Command::CheckFolder);
    }

    #[test]
    fn test_from_parts_builds_file_detected_with_path() {
        let cmd = Command::from_parts("file-detected", Some("/tmp/scan.pdf")).unwrap();
        assert_eq!(cmd, Command::FileDetected(PathBuf::from("/tmp/scan.pdf")));
    }

    #[test]
    fn test_from_parts_requires_payload_for_file_detected() {
        let result = Command::from_parts("file-detected", None);
        assert_eq!(
            result,
            Err(CommandError::MissingPayload(CommandKind::FileDetected))
        );
    }

    #[test]
    fn test_from_parts_rejects_payload_on_plain_kind() {
        let result = Command::from_parts("transport-toggle", Some("x"));
        assert_eq!(
            result,
            Err(CommandError::UnexpectedPayload(CommandKind::TransportToggle))
        );
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            Command::SetUserId("alice".to_string()).kind(),
            CommandKind::SetUserId
        );
        assert_eq!(Command::ExportSave.kind(), CommandKind::ExportSave);
    }

    #[test]
    fn test_display_includes_payload() {
        let cmd = Command::SetUserId("alice".to_string());
        assert_eq!(cmd.to_string(), "set-user-id(alice)");
        assert_eq!(Command::Stop.to_string(), "stop");
    }
}
