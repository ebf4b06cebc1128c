use std::time::Duration;

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_THRESHOLD: f32 = 0.05;
pub(crate) const DEFAULT_GAIN: f32 = 20.0;
/// Gain used for high-rate or multi-channel sources, whose per-sample energy
/// reads lower for the same loudness.
pub(crate) const HIGH_RATE_GAIN: f32 = 30.0;
pub(crate) const MIN_GAIN: f32 = 5.0;
pub(crate) const MAX_GAIN: f32 = 50.0;

pub(crate) const DEFAULT_WINDOW_SIZE: usize = 10;
pub(crate) const MIN_WINDOW_SIZE: usize = 3;
pub(crate) const MAX_WINDOW_SIZE: usize = 20;

pub(crate) const DEFAULT_CALIBRATION_MS: u64 = 1_000;
pub(crate) const MIN_CALIBRATION_MS: u64 = 500;
pub(crate) const MAX_CALIBRATION_MS: u64 = 5_000;

pub(crate) const DEFAULT_EMISSION_INTERVAL_MS: u64 = 50;
pub(crate) const MIN_EMISSION_INTERVAL_MS: u64 = 10;
pub(crate) const MAX_EMISSION_INTERVAL_MS: u64 = 3_600_000;

pub(crate) const DEFAULT_MIN_SPEECH_RATIO: f32 = 0.3;

/// How captured levels are gated before they reach listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechMode {
    /// Report every level as measured.
    #[default]
    Off,
    /// Gate against a calibrated background-noise floor.
    Threshold,
    /// Windowed voice activity detection.
    Vad,
}

impl SpeechMode {
    /// Whether any speech gating is active.
    pub fn is_enabled(self) -> bool {
        !matches!(self, SpeechMode::Off)
    }
}

/// Tunable analyzer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Speech gating mode.
    pub speech_mode: SpeechMode,
    /// Minimum level treated as speech, in `[0, 1]`.
    pub threshold: f32,
    /// Level gain. `None` picks a default from the input format.
    pub gain_factor: Option<f32>,
    /// Frames in the VAD window.
    pub window_size: usize,
    /// Length of the calibration period.
    pub calibration_ms: u64,
    /// Attenuate content whose zero-crossing rate falls outside the voice band.
    pub voice_band_filter: bool,
    /// Minimum spacing between emitted levels.
    pub emission_interval_ms: u64,
    /// Fraction of the VAD window that must be above threshold.
    pub min_speech_ratio: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            speech_mode: SpeechMode::Off,
            threshold: DEFAULT_THRESHOLD,
            gain_factor: None,
            window_size: DEFAULT_WINDOW_SIZE,
            calibration_ms: DEFAULT_CALIBRATION_MS,
            voice_band_filter: true,
            emission_interval_ms: DEFAULT_EMISSION_INTERVAL_MS,
            min_speech_ratio: DEFAULT_MIN_SPEECH_RATIO,
        }
    }
}

impl AnalyzerSettings {
    /// Clamp every field into its supported range.
    pub fn normalized(mut self) -> Self {
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self.gain_factor = self.gain_factor.map(|g| g.clamp(MIN_GAIN, MAX_GAIN));
        self.window_size = self.window_size.clamp(MIN_WINDOW_SIZE, MAX_WINDOW_SIZE);
        self.calibration_ms = self
            .calibration_ms
            .clamp(MIN_CALIBRATION_MS, MAX_CALIBRATION_MS);
        self.emission_interval_ms = self
            .emission_interval_ms
            .clamp(MIN_EMISSION_INTERVAL_MS, MAX_EMISSION_INTERVAL_MS);
        self.min_speech_ratio = self.min_speech_ratio.clamp(0.0, 1.0);
        self
    }

    /// Debounce interval between emissions.
    pub fn emission_interval(&self) -> Duration {
        Duration::from_millis(self.emission_interval_ms)
    }

    /// Number of emitted frames spent calibrating.
    pub fn calibration_frames(&self) -> usize {
        let interval = self.emission_interval_ms.max(1);
        ((self.calibration_ms / interval) as usize).max(2)
    }
}
