//! Live-Recorder Core Library
//!
//! Live microphone recording with a WAV muxer, a speech-aware waveform analyzer,
//! and interruption recovery, driven by a single state queue.
//!
//! # Example
//!
//! ```no_run
//! use live_recorder_core::{CoreResult, CpalBackend, Recorder, RecorderEvent, RecorderSettings};
//!
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let (recorder, mut events) =
//!         Recorder::spawn(|| Ok(CpalBackend::new()), RecorderSettings::default())?;
//!
//!     recorder.configure(Some("take.wav".into()), None).await?;
//!     recorder.start().await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     let path = recorder.stop_and_wait().await?;
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let RecorderEvent::WaveLevel { level, .. } = event {
//!             println!("level {:.2}", level);
//!         }
//!     }
//!
//!     println!("Recorded: {}", path.display());
//!     Ok(())
//! }
//! ```

mod analyzer;
mod audio;
mod error;
mod recorder;
mod writer;

pub use {
    analyzer::{AnalyzerSettings, SpeechMode, VoiceAnalyzer},
    audio::{
        AudioBackend, BufferCallback, CaptureTap, CpalBackend, CpalTap, InputFormat, InputProbe,
        PcmBuffer, RouteMonitor, SessionSignal, route_signals,
    },
    error::{RecorderError, Result as CoreResult},
    recorder::{
        AnalyzerUpdate, DefaultPathResolver, DurationClock, EventReceiver, EventSender,
        PathResolver, PeriodicTask, Recorder, RecorderEvent, RecorderHandle, RecorderSettings,
        RecorderStatus, RecordingState, next_segment_path, timestamped_file_name,
    },
    writer::{EncoderSettings, MuxWriter, SampleEncoding, WriterStatus},
};

#[cfg(test)]
mod tests;
