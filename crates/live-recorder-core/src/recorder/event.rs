use crate::recorder::RecordingState;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::trace;

/// Notifications delivered to the recorder's listener, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// The state machine entered `Recording`, `Paused` or `Stopped`.
    StatusChanged(RecordingState),
    /// Periodic duration update while recording.
    DurationTick {
        /// Seconds recorded in the current segment.
        seconds: f64,
    },
    /// Waveform level for visualization.
    WaveLevel {
        /// Level in `[0, 1]`; `0.0` marks silence or non-speech.
        level: f32,
        /// Wall-clock emission time, milliseconds since the UNIX epoch.
        timestamp_ms: i64,
    },
    /// The session's file is flushed, closed, and synced.
    Finalized {
        /// Finalized output file.
        path: PathBuf,
    },
    /// Recoverable or fatal failure.
    Error {
        /// Human-readable description.
        message: String,
    },
}

/// Sending half of the listener channel.
pub type EventSender = mpsc::UnboundedSender<RecorderEvent>;

/// Receiving half of the listener channel.
pub type EventReceiver = mpsc::UnboundedReceiver<RecorderEvent>;

/// Fire-and-forget delivery; a departed listener is not an error.
pub(crate) fn emit(events: &EventSender, event: RecorderEvent) {
    if let Err(e) = events.send(event) {
        trace!(event = ?e.0, "Listener gone, event dropped");
    }
}
