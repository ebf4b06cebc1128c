use crate::{CoreResult, analyzer::SpeechMode, audio::SessionSignal};

use std::{path::PathBuf, time::Duration};

use tokio::sync::oneshot;

pub(crate) type Reply<T> = oneshot::Sender<CoreResult<T>>;

/// Analyzer reconfiguration routed through the state queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalyzerUpdate {
    /// Speech gate floor in `[0, 1]`.
    Threshold(f32),
    /// VAD window length in frames (3-20).
    WindowSize(usize),
    /// Calibration period (500-5000 ms).
    CalibrationDuration(Duration),
    /// Zero-crossing voice-band attenuation.
    VoiceBandFilter(bool),
    /// Pinned gain factor (5-50).
    GainFactor(f32),
    /// Speech gating mode.
    SpeechMode(SpeechMode),
    /// Waveform debounce interval (10 ms - 1 h).
    EmissionInterval(Duration),
}

/// Messages processed by the recorder's state queue, one at a time.
pub(crate) enum RecorderCommand {
    Configure {
        path: Option<PathBuf>,
        bitrate: Option<u32>,
        reply: Reply<PathBuf>,
    },
    Start {
        reply: Reply<PathBuf>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    /// `wait` receives the finalized path once the file is durable.
    Stop {
        reply: Reply<()>,
        wait: Option<Reply<PathBuf>>,
    },
    Reset {
        reply: Reply<PathBuf>,
    },
    Analyzer {
        update: AnalyzerUpdate,
        reply: Reply<()>,
    },
    Signal(SessionSignal),
}

impl RecorderCommand {
    /// Short name for logging.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            RecorderCommand::Configure { .. } => "configure",
            RecorderCommand::Start { .. } => "start",
            RecorderCommand::Pause { .. } => "pause",
            RecorderCommand::Resume { .. } => "resume",
            RecorderCommand::Stop { .. } => "stop",
            RecorderCommand::Reset { .. } => "reset",
            RecorderCommand::Analyzer { .. } => "analyzer",
            RecorderCommand::Signal(_) => "signal",
        }
    }
}
