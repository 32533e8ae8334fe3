//! Local mirror of the audio transport.
//!
//! The transcription server is the source of truth for playback; the
//! controller only keeps enough state to attach a plausible `state` object to
//! every transport event it sends.  The dispatcher owns the single instance.

use serde::{Deserialize, Serialize};

/// Seconds moved by one seek-back / seek-forward step.
pub const SEEK_STEP_SECS: u64 = 10;

/// Snapshot of the audio transport, serialized as the `state` key of
/// transport events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportState {
    pub is_playing: bool,
    pub current_file: String,
    /// Playback position in seconds.
    pub position: u64,
    /// Track length in seconds.
    pub duration: u64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_file: "audio.mp3".to_string(),
            position: 0,
            duration: 180,
        }
    }
}

impl TransportState {
    /// Flips between playing and paused.
    pub fn toggle(&mut self) {
        self.is_playing = !self.is_playing;
    }

    /// Moves back one step, stopping at the start of the track.
    pub fn seek_back(&mut self) {
        self.position = self.position.saturating_sub(SEEK_STEP_SECS);
    }

    /// Moves forward one step, stopping at the end of the track.
    pub fn seek_forward(&mut self) {
        self.position = (self.position + SEEK_STEP_SECS).min(self.duration);
    }

    /// Switches to the previous file and rewinds.
    ///
    /// The name is derived from `epoch_secs` because the controller does not
    /// know the server's playlist.
    pub fn previous(&mut self, epoch_secs: u64) {
        self.current_file = format!("audio_{}.mp3", epoch_secs.saturating_sub(1));
        self.position = 0;
    }

    /// Switches to the next file and rewinds.
    pub fn next(&mut self, epoch_secs: u64) {
        self.current_file = format!("audio_{epoch_secs}.mp3");
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_paused_at_start() {
        let state = TransportState::default();
        assert!(!state.is_playing);
        assert_eq!(state.position, 0);
        assert_eq!(state.duration, 180);
        assert_eq!(state.current_file, "audio.mp3");
    }

    #[test]
    fn test_toggle_twice_returns_to_paused() {
        let mut state = TransportState::default();
        state.toggle();
        assert!(state.is_playing);
        state.toggle();
        assert!(!state.is_playing);
    }

    #[test]
    fn test_seek_back_clamps_at_zero() {
        let mut state = TransportState {
            position: 4,
            ..Default::default()
        };
        state.seek_back();
        assert_eq!(state.position, 0);
    }

    #[test]
    fn test_seek_forward_clamps_at_duration() {
        let mut state = TransportState {
            position: 175,
            ..Default::default()
        };
        state.seek_forward();
        assert_eq!(state.position, 180);
    }

    #[test]
    fn test_next_and_previous_rename_file_and_rewind() {
        // Arrange
        let mut state = TransportState {
            position: 60,
            ..Default::default()
        };

        // Act / Assert
        state.next(1_700_000_000);
        assert_eq!(state.current_file, "audio_1700000000.mp3");
        assert_eq!(state.position, 0);

        state.position = 30;
        state.previous(1_700_000_000);
        assert_eq!(state.current_file, "audio_1699999999.mp3");
        assert_eq!(state.position, 0);
    }

    #[test]
    fn test_state_serializes_with_expected_keys() {
        let json = serde_json::to_value(TransportState::default()).unwrap();
        assert_eq!(json["is_playing"], false);
        assert_eq!(json["current_file"], "audio.mp3");
        assert_eq!(json["position"], 0);
        assert_eq!(json["duration"], 180);
    }
}
