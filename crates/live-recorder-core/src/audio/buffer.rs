use std::{sync::Arc, time::Duration};

/// Native format negotiated with the input hardware for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

/// One block of captured audio.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`. The sample storage is shared
/// behind an `Arc` so the writer and the analyzer can read the same block without
/// copying; nothing mutates it after capture.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    samples: Arc<[f32]>,
    format: InputFormat,
    timestamp: Duration,
}

impl PcmBuffer {
    /// Wrap captured samples. Trailing samples that do not fill a whole frame are
    /// discarded.
    pub fn new(samples: impl Into<Vec<f32>>, format: InputFormat, timestamp: Duration) -> Self {
        let mut samples = samples.into();
        let channels = usize::from(format.channels.max(1));
        let whole = samples.len() - samples.len() % channels;
        samples.truncate(whole);

        Self {
            samples: samples.into(),
            format,
            timestamp,
        }
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Hardware format the block was captured in.
    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.format.channels.max(1))
    }

    /// Monotonic capture timestamp, measured from the tap's first callback.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Samples of a single channel, de-interleaved on the fly.
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f32> + '_ {
        let stride = usize::from(self.format.channels.max(1));
        self.samples.iter().skip(index).step_by(stride).copied()
    }

    /// Same block placed `offset` later on the timeline.
    pub(crate) fn shifted(mut self, offset: Duration) -> Self {
        self.timestamp += offset;
        self
    }

    /// Playback length of this block.
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.format.sample_rate))
    }
}
