use crate::analyzer::AnalyzerSettings;

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_BITRATE: u32 = 128_000;
pub(crate) const DEFAULT_DURATION_INTERVAL_MS: u64 = 1_000;
/// Buffers queued between the capture callback and the pipeline thread.
/// At typical 10 ms hardware blocks this is well over half a second of slack.
pub(crate) const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Recorder-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Default encoder bitrate in bits per second.
    ///
    /// WAV stores uncompressed PCM, so the bitrate only picks the sample width
    /// from the bits it allows per sample: 32 and above gives 32-bit float, 24
    /// to 31 gives 24-bit, anything lower 16-bit. Compressed-style rates such as
    /// the 128 kbps default always produce 16-bit files.
    pub bitrate: u32,
    /// Directory for generated file names. `None` uses the platform data dir.
    pub output_dir: Option<PathBuf>,
    /// Period of duration notifications.
    pub duration_interval_ms: u64,
    /// Capacity of the capture-to-pipeline queue.
    pub queue_depth: usize,
    /// Waveform analyzer parameters.
    pub analyzer: AnalyzerSettings,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            output_dir: None,
            duration_interval_ms: DEFAULT_DURATION_INTERVAL_MS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            analyzer: AnalyzerSettings::default(),
        }
    }
}

impl RecorderSettings {
    pub(crate) fn duration_interval(&self) -> Duration {
        Duration::from_millis(self.duration_interval_ms.max(1))
    }
}
