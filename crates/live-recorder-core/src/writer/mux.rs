use crate::{
    CoreResult, RecorderError,
    audio::PcmBuffer,
    writer::{EncoderSettings, SampleEncoding},
};

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::Duration,
};

use hound::WavWriter;
use tracing::{debug, info, instrument, warn};

const I24_MAX: f32 = 8_388_607.0;

/// Lifecycle of a [`MuxWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStatus {
    /// Accepting buffers.
    Writing,
    /// A write failed; no further buffers are accepted.
    Failed,
    /// Flushed and closed.
    Finalized,
}

/// Encodes PCM buffers into a WAV container on disk.
///
/// The first accepted buffer anchors the container timeline; later buffers are
/// placed relative to that anchor and must arrive in timestamp order.
pub struct MuxWriter {
    path: PathBuf,
    settings: EncoderSettings,
    writer: Option<WavWriter<BufWriter<File>>>,
    status: WriterStatus,
    anchor: Option<Duration>,
    last_offset: Option<Duration>,
    frames_written: u64,
    rejected: u64,
    failure: Option<String>,
}

impl MuxWriter {
    /// Open the container, creating parent directories as needed.
    #[track_caller]
    #[instrument(skip(settings), fields(sample_rate = settings.format.sample_rate, channels = settings.format.channels))]
    pub fn create(path: &Path, settings: EncoderSettings) -> CoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                RecorderError::writer(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let writer = WavWriter::create(path, settings.wav_spec()).map_err(|e| {
            RecorderError::writer(format!("Failed to open {}: {}", path.display(), e))
        })?;

        info!(
            path = ?path,
            bits = settings.encoding.bits(),
            bitrate = settings.effective_bitrate(),
            "Container opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            settings,
            writer: Some(writer),
            status: WriterStatus::Writing,
            anchor: None,
            last_offset: None,
            frames_written: 0,
            rejected: 0,
            failure: None,
        })
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding in use.
    pub fn settings(&self) -> EncoderSettings {
        self.settings
    }

    /// Current lifecycle status.
    pub fn status(&self) -> WriterStatus {
        self.status
    }

    /// Whether the timeline has been anchored by a first buffer.
    pub fn session_started(&self) -> bool {
        self.anchor.is_some()
    }

    /// Hardware timestamp of the first accepted buffer.
    pub fn anchor(&self) -> Option<Duration> {
        self.anchor
    }

    /// Frames encoded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Buffers refused because of format mismatch or ordering.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Media duration encoded so far.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames_written as f64 / f64::from(self.settings.format.sample_rate))
    }

    /// Encode one buffer.
    ///
    /// Returns `Ok(false)` when the buffer is refused without error: the writer
    /// is not in `Writing` status, the buffer's format differs from the
    /// container's, or its timestamp precedes the previous buffer. A failed write
    /// moves the writer to `Failed` and returns the error once.
    #[track_caller]
    pub fn append(&mut self, buffer: &PcmBuffer) -> CoreResult<bool> {
        if self.status != WriterStatus::Writing {
            return Ok(false);
        }

        if buffer.format() != self.settings.format {
            self.rejected += 1;
            warn!(
                expected = ?self.settings.format,
                received = ?buffer.format(),
                "Buffer format does not match container"
            );
            return Ok(false);
        }

        let anchor = *self.anchor.get_or_insert_with(|| {
            debug!(anchor = ?buffer.timestamp(), "Container timeline anchored");
            buffer.timestamp()
        });
        let offset = buffer.timestamp().saturating_sub(anchor);

        if self.last_offset.is_some_and(|last| offset < last) {
            self.rejected += 1;
            debug!(offset = ?offset, "Out-of-order buffer dropped");
            return Ok(false);
        }

        let Some(writer) = self.writer.as_mut() else {
            return Ok(false);
        };

        if let Err(e) = write_samples(writer, self.settings.encoding, buffer.samples()) {
            let reason = format!("Failed to write to {}: {}", self.path.display(), e);
            self.status = WriterStatus::Failed;
            self.failure = Some(reason.clone());
            return Err(RecorderError::writer(reason));
        }

        self.last_offset = Some(offset);
        self.frames_written += buffer.frames() as u64;

        Ok(true)
    }

    /// Flush, patch the header, close, and sync the file to disk.
    ///
    /// After a successful finalize further calls return the path again without
    /// touching the file. A writer that failed mid-session still closes its file
    /// but reports the earlier failure.
    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn finalize(&mut self) -> CoreResult<PathBuf> {
        if self.status == WriterStatus::Finalized {
            return Ok(self.path.clone());
        }

        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| {
                self.status = WriterStatus::Failed;
                RecorderError::writer(format!("Failed to finalize {}: {}", self.path.display(), e))
            })?;

            File::open(&self.path)
                .and_then(|f| f.sync_all())
                .map_err(|e| {
                    self.status = WriterStatus::Failed;
                    RecorderError::writer(format!("Failed to sync {}: {}", self.path.display(), e))
                })?;
        }

        if let Some(reason) = &self.failure {
            return Err(RecorderError::writer(format!(
                "Container closed after earlier failure: {}",
                reason
            )));
        }

        self.status = WriterStatus::Finalized;

        info!(
            frames = self.frames_written,
            duration_ms = self.duration().as_millis(),
            rejected = self.rejected,
            "Container finalized"
        );

        Ok(self.path.clone())
    }
}

fn write_samples(
    writer: &mut WavWriter<BufWriter<File>>,
    encoding: SampleEncoding,
    samples: &[f32],
) -> hound::Result<()> {
    match encoding {
        SampleEncoding::Int16 => {
            for &s in samples {
                writer.write_sample((s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
            }
        }
        SampleEncoding::Int24 => {
            for &s in samples {
                writer.write_sample((s.clamp(-1.0, 1.0) * I24_MAX) as i32)?;
            }
        }
        SampleEncoding::Float32 => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
    }
    Ok(())
}

impl Drop for MuxWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take()
            && let Err(e) = writer.finalize()
        {
            warn!("Failed to finalize container on drop: {}", e);
        }
    }
}
