use crate::{
    CoreResult, RecorderError,
    analyzer::SpeechMode,
    audio::{AudioBackend, SessionSignal},
    recorder::{
        AnalyzerUpdate, DefaultPathResolver, EventReceiver, PathResolver, RecorderSettings,
        RecorderStatus,
        actor::RecorderActor,
        command::{RecorderCommand, Reply},
        state::StatusSnapshot,
    },
};

use std::{path::PathBuf, sync::mpsc as std_mpsc, time::Duration};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, instrument};

/// Entry point for building a recorder.
pub struct Recorder;

impl Recorder {
    /// Spawn the state queue with the default path resolver.
    ///
    /// `backend` runs on the state queue's thread, so the backend and its taps
    /// need not be `Send`.
    pub fn spawn<B, F>(
        backend: F,
        settings: RecorderSettings,
    ) -> CoreResult<(RecorderHandle, EventReceiver)>
    where
        B: AudioBackend + 'static,
        F: FnOnce() -> CoreResult<B> + Send + 'static,
    {
        let resolver = DefaultPathResolver::new(settings.output_dir.clone());
        Self::spawn_with_resolver(backend, settings, resolver)
    }

    /// Spawn the state queue with a custom path resolver.
    #[track_caller]
    pub fn spawn_with_resolver<B, F, R>(
        backend: F,
        settings: RecorderSettings,
        resolver: R,
    ) -> CoreResult<(RecorderHandle, EventReceiver)>
    where
        B: AudioBackend + 'static,
        F: FnOnce() -> CoreResult<B> + Send + 'static,
        R: PathResolver + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<CoreResult<()>>(1);

        std::thread::Builder::new()
            .name("recorder-state".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(RecorderError::channel_closed(format!(
                            "Failed to build state queue runtime: {}",
                            e
                        ))));
                        return;
                    }
                };

                let backend = match backend() {
                    Ok(backend) => backend,
                    Err(e) => {
                        error!(error = %e, "Failed to create audio backend");
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let actor = RecorderActor::new(
                    backend,
                    Box::new(resolver),
                    settings,
                    command_rx,
                    event_tx,
                    status_tx,
                );
                let _ = ready_tx.send(Ok(()));

                runtime.block_on(actor.run());
            })
            .map_err(|e| {
                RecorderError::channel_closed(format!("Failed to spawn state queue thread: {}", e))
            })?;

        ready_rx
            .recv()
            .map_err(|_| RecorderError::channel_closed("State queue thread exited during startup"))??;

        info!("Recorder spawned");

        Ok((
            RecorderHandle {
                commands: command_tx,
                status: status_rx,
            },
            event_rx,
        ))
    }
}

/// Cloneable control surface for a running recorder.
///
/// Every operation is queued on the recorder's state queue and applied in
/// submission order. The state queue shuts down, stopping any live session,
/// once every handle is dropped.
#[derive(Clone)]
pub struct RecorderHandle {
    commands: mpsc::UnboundedSender<RecorderCommand>,
    status: watch::Receiver<StatusSnapshot>,
}

impl RecorderHandle {
    /// Set the output target and bitrate for the next session.
    ///
    /// A missing path picks a timestamped file in the configured directory; a
    /// directory gets a timestamped file inside it. Returns the resolved path.
    #[instrument(skip(self))]
    pub async fn configure(
        &self,
        path: Option<PathBuf>,
        bitrate: Option<u32>,
    ) -> CoreResult<PathBuf> {
        self.request(|reply| RecorderCommand::Configure {
            path,
            bitrate,
            reply,
        })
        .await
    }

    /// Acquire the hardware and begin recording. Returns the output path.
    #[instrument(skip(self))]
    pub async fn start(&self) -> CoreResult<PathBuf> {
        self.request(|reply| RecorderCommand::Start { reply }).await
    }

    /// Stop routing buffers. A no-op unless recording.
    pub async fn pause(&self) -> CoreResult<()> {
        self.request(|reply| RecorderCommand::Pause { reply }).await
    }

    /// Continue recording, re-creating a torn-down tap or segment. A no-op
    /// unless paused.
    pub async fn resume(&self) -> CoreResult<()> {
        self.request(|reply| RecorderCommand::Resume { reply }).await
    }

    /// End the session. `Finalized` is emitted once the file is durable.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> CoreResult<()> {
        self.request(|reply| RecorderCommand::Stop { reply, wait: None })
            .await
    }

    /// End the session and wait until its file is finalized.
    #[instrument(skip(self))]
    pub async fn stop_and_wait(&self) -> CoreResult<PathBuf> {
        let (wait_tx, wait_rx) = oneshot::channel();
        self.request(|reply| RecorderCommand::Stop {
            reply,
            wait: Some(wait_tx),
        })
        .await?;

        wait_rx
            .await
            .map_err(|_| RecorderError::channel_closed("Recorder dropped the finalize reply"))?
    }

    /// Blocking form of [`RecorderHandle::stop_and_wait`] for callers outside
    /// an async context.
    pub fn blocking_stop_and_wait(&self) -> CoreResult<PathBuf> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let (wait_tx, wait_rx) = oneshot::channel();
        self.send(RecorderCommand::Stop {
            reply: reply_tx,
            wait: Some(wait_tx),
        })?;

        reply_rx
            .blocking_recv()
            .map_err(|_| RecorderError::channel_closed("Recorder dropped the reply"))??;

        wait_rx
            .blocking_recv()
            .map_err(|_| RecorderError::channel_closed("Recorder dropped the finalize reply"))?
    }

    /// Finalize the current segment and continue paused into a new file.
    /// Returns the new path.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> CoreResult<PathBuf> {
        self.request(|reply| RecorderCommand::Reset { reply }).await
    }

    /// Current state, duration, and path. Never blocks.
    pub fn status(&self) -> RecorderStatus {
        self.status.borrow().current()
    }

    /// Deliver a platform interruption or route change to the state queue.
    pub fn notify(&self, signal: SessionSignal) -> CoreResult<()> {
        self.send(RecorderCommand::Signal(signal))
    }

    /// Apply an analyzer reconfiguration.
    pub async fn update_analyzer(&self, update: AnalyzerUpdate) -> CoreResult<()> {
        self.request(|reply| RecorderCommand::Analyzer { update, reply })
            .await
    }

    /// Speech gate floor in `[0, 1]`.
    pub async fn set_threshold(&self, threshold: f32) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::Threshold(threshold))
            .await
    }

    /// VAD window length, clamped to 3-20 frames.
    pub async fn set_window_size(&self, frames: usize) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::WindowSize(frames))
            .await
    }

    /// Calibration period, clamped to 500-5000 ms.
    pub async fn set_calibration_duration(&self, duration: Duration) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::CalibrationDuration(duration))
            .await
    }

    /// Toggle voice-band attenuation.
    pub async fn set_voice_band_filter(&self, enabled: bool) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::VoiceBandFilter(enabled))
            .await
    }

    /// Pin the gain factor, clamped to 5-50.
    pub async fn set_gain_factor(&self, gain: f32) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::GainFactor(gain))
            .await
    }

    /// Select the speech gating mode.
    pub async fn set_speech_mode(&self, mode: SpeechMode) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::SpeechMode(mode))
            .await
    }

    /// Waveform debounce interval, clamped to 10 ms - 1 h.
    pub async fn set_emission_interval(&self, interval: Duration) -> CoreResult<()> {
        self.update_analyzer(AnalyzerUpdate::EmissionInterval(interval))
            .await
    }

    #[track_caller]
    fn send(&self, command: RecorderCommand) -> CoreResult<()> {
        self.commands
            .send(command)
            .map_err(|_| RecorderError::channel_closed("Recorder state queue stopped"))
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> RecorderCommand) -> CoreResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx))?;

        reply_rx
            .await
            .map_err(|_| RecorderError::channel_closed("Recorder dropped the reply"))?
    }
}
