use live_recorder_core::RecorderSettings;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording output configuration.
///
/// Unset fields fall back to the core recorder defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory for generated file names. `None` uses the platform data dir.
    pub output_dir: Option<PathBuf>,
    /// Requested encoder bitrate in bits per second.
    pub bitrate: u32,
    /// Period of duration notifications.
    pub duration_interval_ms: u64,
    /// Capacity of the capture-to-pipeline queue.
    pub queue_depth: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        let core = RecorderSettings::default();
        Self {
            output_dir: core.output_dir,
            bitrate: core.bitrate,
            duration_interval_ms: core.duration_interval_ms,
            queue_depth: core.queue_depth,
        }
    }
}
