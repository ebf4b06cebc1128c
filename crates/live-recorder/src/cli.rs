use crate::config::Config;

use live_recorder_core::SpeechMode;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Record the default microphone to a WAV file with live level metering.
#[derive(Debug, Parser)]
#[command(name = "live-recorder", version, about)]
pub struct Cli {
    /// Output file or directory for the first recording.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Requested encoder bitrate in bits per second.
    #[arg(short, long)]
    pub bitrate: Option<u32>,

    /// Speech gating applied to waveform levels.
    #[arg(long, value_enum)]
    pub speech_mode: Option<CliSpeechMode>,

    /// Configuration file to use instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Command-line spelling of [`SpeechMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSpeechMode {
    /// Report every level as measured.
    Off,
    /// Gate against the calibrated noise floor.
    Threshold,
    /// Windowed voice activity detection.
    Vad,
}

impl From<CliSpeechMode> for SpeechMode {
    fn from(mode: CliSpeechMode) -> Self {
        match mode {
            CliSpeechMode::Off => SpeechMode::Off,
            CliSpeechMode::Threshold => SpeechMode::Threshold,
            CliSpeechMode::Vad => SpeechMode::Vad,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    ///
    /// `--output` is not a config value; it is handed to the recorder as the
    /// first session's target.
    pub fn apply(&self, config: &mut Config) {
        if let Some(bitrate) = self.bitrate {
            config.recording.bitrate = bitrate;
        }
        if let Some(mode) = self.speech_mode {
            config.analyzer.speech_mode = mode.into();
        }
    }
}
