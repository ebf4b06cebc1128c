use crate::{audio::InputFormat, recorder::DurationClock};

use std::{fmt, path::PathBuf, time::Duration};

use uuid::Uuid;

/// Recording state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// No session.
    #[default]
    Idle,
    /// Buffers are routed to the writer and analyzer.
    Recording,
    /// Session alive, buffers dropped.
    Paused,
    /// Session ended; finalization may still be in flight.
    Stopped,
}

impl RecordingState {
    /// Lowercase name used in status notifications.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopped => "stopped",
        }
    }

    /// Whether a session is live (recording or paused).
    pub fn is_active(self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by `RecorderHandle::status`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecorderStatus {
    /// Current state.
    pub state: RecordingState,
    /// Time spent recording in the current segment.
    pub duration: Duration,
    /// Active output target, or the last one after a session ends.
    pub path: Option<PathBuf>,
    /// Live session, if any.
    pub session_id: Option<Uuid>,
    /// Hardware format of the live session.
    pub format: Option<InputFormat>,
}

/// What the state queue publishes; the live duration is derived on read.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusSnapshot {
    pub(crate) status: RecorderStatus,
    pub(crate) clock: DurationClock,
}

impl StatusSnapshot {
    pub(crate) fn current(&self) -> RecorderStatus {
        RecorderStatus {
            duration: self.clock.elapsed(),
            ..self.status.clone()
        }
    }
}
