use crate::{
    CoreResult, RecorderError,
    analyzer::VoiceAnalyzer,
    audio::{AudioBackend, CaptureTap, InputFormat, SessionSignal},
    recorder::{
        AnalyzerUpdate, DurationClock, EventSender, PathResolver, PeriodicTask, RecorderEvent,
        RecorderSettings, RecorderStatus, RecordingState,
        command::{RecorderCommand, Reply},
        event::emit,
        pipeline::{FinalizeCallback, PipelineHandle, PipelineQueue},
        state::StatusSnapshot,
    },
    writer::{EncoderSettings, MuxWriter},
};

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Why a session sits in `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseCause {
    User,
    Interruption,
    DeviceLost,
}

#[derive(Debug, Clone)]
struct Target {
    path: PathBuf,
    bitrate: u32,
}

/// Resources of one live recording session.
struct Session<T> {
    id: Uuid,
    path: PathBuf,
    bitrate: u32,
    format: InputFormat,
    /// Read by the capture callback; the only state it sees.
    routing: Arc<AtomicBool>,
    tap: Option<T>,
    pipeline: Option<PipelineHandle>,
    cause: PauseCause,
    /// Finalize ticket of a segment retired by rotation, until it completes.
    rotation: Option<u64>,
    /// Most recent segment closed by rotation.
    last_segment: Option<PathBuf>,
}

struct FinalizeNotice {
    ticket: u64,
    result: CoreResult<PathBuf>,
}

struct PendingFinalize {
    session_id: Uuid,
    path: PathBuf,
    /// Fire `Finalized` on success.
    announce: bool,
    /// Completing this ticket ends the session.
    ends_session: bool,
    waiters: Vec<Reply<PathBuf>>,
}

/// Posts a finalize notice back to the state queue, even if the pipeline
/// thread goes away without calling back.
struct FinalizeNotifier {
    notices: mpsc::UnboundedSender<FinalizeNotice>,
    ticket: u64,
    sent: bool,
}

impl FinalizeNotifier {
    fn notify(mut self, result: CoreResult<PathBuf>) {
        self.sent = true;
        self.post(result);
    }

    fn post(&self, result: CoreResult<PathBuf>) {
        let notice = FinalizeNotice {
            ticket: self.ticket,
            result,
        };
        if self.notices.send(notice).is_err() {
            warn!(ticket = self.ticket, "State queue gone before finalize completed");
        }
    }
}

impl Drop for FinalizeNotifier {
    fn drop(&mut self) {
        if !self.sent {
            self.post(Err(RecorderError::writer(
                "Pipeline exited without finalizing",
            )));
        }
    }
}

/// The recorder's state queue.
///
/// Owns the backend, the active tap and pipeline, and every piece of session
/// bookkeeping. Commands, finalize notices, and duration ticks are handled one
/// at a time on a single thread.
pub(crate) struct RecorderActor<B: AudioBackend> {
    backend: B,
    resolver: Box<dyn PathResolver>,
    settings: RecorderSettings,
    commands: mpsc::UnboundedReceiver<RecorderCommand>,
    events: EventSender,
    status: watch::Sender<StatusSnapshot>,
    notice_tx: mpsc::UnboundedSender<FinalizeNotice>,
    notice_rx: mpsc::UnboundedReceiver<FinalizeNotice>,
    analyzer: Arc<Mutex<VoiceAnalyzer>>,
    clock: DurationClock,
    ticker: PeriodicTask,
    state: RecordingState,
    configured: Option<Target>,
    session: Option<Session<B::Tap>>,
    pending: HashMap<u64, PendingFinalize>,
    next_ticket: u64,
    last_path: Option<PathBuf>,
}

impl<B: AudioBackend> RecorderActor<B> {
    pub(crate) fn new(
        backend: B,
        resolver: Box<dyn PathResolver>,
        settings: RecorderSettings,
        commands: mpsc::UnboundedReceiver<RecorderCommand>,
        events: EventSender,
        status: watch::Sender<StatusSnapshot>,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let analyzer = Arc::new(Mutex::new(VoiceAnalyzer::new(settings.analyzer.clone())));
        let ticker = PeriodicTask::new(settings.duration_interval());

        Self {
            backend,
            resolver,
            settings,
            commands,
            events,
            status,
            notice_tx,
            notice_rx,
            analyzer,
            clock: DurationClock::default(),
            ticker,
            state: RecordingState::Idle,
            configured: None,
            session: None,
            pending: HashMap::new(),
            next_ticket: 0,
            last_path: None,
        }
    }

    /// Process messages until every handle is dropped, then stop any live
    /// session and wait for its file to be finalized.
    pub(crate) async fn run(mut self) {
        info!(backend = self.backend.name(), "Recorder state queue running");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },

                Some(notice) = self.notice_rx.recv() => {
                    self.on_finalized(notice);
                }

                _ = self.ticker.tick() => {
                    self.on_tick();
                }
            }
        }

        if self.state.is_active()
            && let Err(e) = self.stop(None)
        {
            error!(error = %e, "Failed to stop session on shutdown");
        }
        self.await_finalizations().await;

        info!("Recorder state queue stopped");
    }

    async fn handle(&mut self, command: RecorderCommand) {
        debug!(command = command.name(), state = %self.state, "Handling command");

        match command {
            RecorderCommand::Configure {
                path,
                bitrate,
                reply,
            } => {
                let _ = reply.send(self.configure(path, bitrate));
            }
            RecorderCommand::Start { reply } => {
                let result = self.start().await;
                let _ = reply.send(result);
            }
            RecorderCommand::Pause { reply } => {
                self.pause(PauseCause::User);
                let _ = reply.send(Ok(()));
            }
            RecorderCommand::Resume { reply } => {
                let result = self.resume().await;
                let _ = reply.send(result);
            }
            RecorderCommand::Stop { reply, wait } => {
                let _ = reply.send(self.stop(wait));
            }
            RecorderCommand::Reset { reply } => {
                let _ = reply.send(self.reset());
            }
            RecorderCommand::Analyzer { update, reply } => {
                self.update_analyzer(update);
                let _ = reply.send(Ok(()));
            }
            RecorderCommand::Signal(signal) => self.on_signal(signal).await,
        }
    }

    #[instrument(skip(self))]
    fn configure(&mut self, path: Option<PathBuf>, bitrate: Option<u32>) -> CoreResult<PathBuf> {
        if self.state.is_active() {
            return Err(RecorderError::session(format!(
                "Cannot configure while {}",
                self.state
            )));
        }

        let bitrate = bitrate.unwrap_or(self.settings.bitrate);
        if bitrate == 0 {
            return Err(RecorderError::encoding("Bitrate must be greater than zero"));
        }

        let path = self.resolver.resolve(path.as_deref())?;
        info!(path = ?path, bitrate, "Output configured");

        self.configured = Some(Target {
            path: path.clone(),
            bitrate,
        });
        self.publish();

        Ok(path)
    }

    #[instrument(skip(self))]
    async fn start(&mut self) -> CoreResult<PathBuf> {
        if self.state.is_active() {
            return Err(RecorderError::session(format!(
                "Cannot start while {}",
                self.state
            )));
        }

        // Only one container may be open at a time.
        self.await_finalizations().await;

        let target = match &self.configured {
            Some(target) => target.clone(),
            None => Target {
                path: self.resolver.resolve(None)?,
                bitrate: self.settings.bitrate,
            },
        };

        self.backend.activate()?;
        if !self.backend.input_available() {
            self.backend.deactivate();
            return Err(RecorderError::hardware("No input device available"));
        }

        let session_id = Uuid::new_v4();
        let routing = Arc::new(AtomicBool::new(false));
        let (tap, pipeline) =
            match self.open_segment(session_id, &target.path, target.bitrate, &routing) {
                Ok(opened) => opened,
                Err(e) => {
                    error!(error = %e, "Session setup failed, rolling back");
                    self.backend.deactivate();
                    return Err(e);
                }
            };

        let format = pipeline.format();
        self.configured = None;
        self.session = Some(Session {
            id: session_id,
            path: target.path.clone(),
            bitrate: target.bitrate,
            format,
            routing,
            tap: Some(tap),
            pipeline: Some(pipeline),
            cause: PauseCause::User,
            rotation: None,
            last_segment: None,
        });
        self.clock.reset();
        self.enter_recording();

        info!(
            session_id = %session_id,
            path = ?target.path,
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Recording started"
        );

        Ok(target.path)
    }

    /// Stop routing buffers. A no-op unless recording.
    fn pause(&mut self, cause: PauseCause) {
        if self.state != RecordingState::Recording {
            debug!(state = %self.state, "Pause ignored");
            return;
        }

        if let Some(session) = self.session.as_mut() {
            session.routing.store(false, Ordering::Release);
            session.cause = cause;
        }
        self.clock.pause();
        self.ticker.stop();
        self.state = RecordingState::Paused;

        emit(&self.events, RecorderEvent::StatusChanged(RecordingState::Paused));
        self.publish();
        info!(cause = ?cause, "Recording paused");
    }

    /// Resume routing, rebuilding whatever a reset or device loss tore down.
    /// A no-op unless paused.
    #[instrument(skip(self))]
    async fn resume(&mut self) -> CoreResult<()> {
        if self.state != RecordingState::Paused {
            debug!(state = %self.state, "Resume ignored");
            return Ok(());
        }

        // Recovery may have left the hardware session released, and a detached
        // tap may point at a device that is gone.
        let detached = self.session.as_ref().is_some_and(|s| s.tap.is_none());
        if detached
            || matches!(
                self.pause_cause(),
                Some(PauseCause::Interruption | PauseCause::DeviceLost)
            )
        {
            self.backend.activate()?;
            if !self.backend.input_available() {
                return Err(RecorderError::hardware("No input device available"));
            }
        }

        self.restore_session().await?;
        self.enter_recording();
        info!("Recording resumed");

        Ok(())
    }

    fn enter_recording(&mut self) {
        self.lock_analyzer().restart_clock();
        if let Some(session) = self.session.as_mut() {
            session.cause = PauseCause::User;
            session.routing.store(true, Ordering::Release);
        }
        self.clock.resume();
        self.ticker.start();
        self.state = RecordingState::Recording;

        emit(&self.events, RecorderEvent::StatusChanged(RecordingState::Recording));
        self.publish();
    }

    /// Make sure the session has a live tap feeding an open pipeline.
    async fn restore_session(&mut self) -> CoreResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(RecorderError::session("No session to resume"));
        };

        if session.pipeline.is_none() {
            return self.reopen_segment().await;
        }

        if session.tap.is_none() {
            return self.reinstall_tap().await;
        }

        match session.tap.as_mut() {
            Some(tap) => tap.play(),
            None => Ok(()),
        }
    }

    /// Open a fresh container at the session's current path.
    async fn reopen_segment(&mut self) -> CoreResult<()> {
        self.await_finalizations().await;

        let Some(session) = self.session.as_ref() else {
            return Err(RecorderError::session("No session to reopen"));
        };
        let (id, path, bitrate, routing) = (
            session.id,
            session.path.clone(),
            session.bitrate,
            Arc::clone(&session.routing),
        );

        let (tap, pipeline) = self.open_segment(id, &path, bitrate, &routing)?;

        if let Some(session) = self.session.as_mut() {
            session.format = pipeline.format();
            session.tap = Some(tap);
            session.pipeline = Some(pipeline);
        }
        self.publish();
        info!(session_id = %id, path = ?path, "Opened new segment");

        Ok(())
    }

    /// Attach a new tap to the open container. A format change rotates the
    /// segment first.
    async fn reinstall_tap(&mut self) -> CoreResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Err(RecorderError::session("No session to reattach"));
        };
        let Some(pipeline) = session.pipeline.as_ref() else {
            return self.reopen_segment().await;
        };
        let expected = pipeline.format();
        let sink = pipeline.sink(Arc::clone(&session.routing));

        let tap = self.backend.install_tap(sink)?;
        let actual = tap.format();

        if actual == expected {
            if let Some(session) = self.session.as_mut() {
                session.tap = Some(tap);
            }
            debug!("Tap reinstalled");
            return Ok(());
        }

        info!(expected = ?expected, actual = ?actual, "Input format changed, rotating segment");
        drop(tap);
        self.retire_segment()?;
        self.clock.reset();
        self.reopen_segment().await
    }

    /// Tap, container, and analyzer for one segment.
    fn open_segment(
        &mut self,
        session_id: Uuid,
        path: &Path,
        bitrate: u32,
        routing: &Arc<AtomicBool>,
    ) -> CoreResult<(B::Tap, PipelineHandle)> {
        let queue = PipelineQueue::new(self.settings.queue_depth);
        let tap = self.backend.install_tap(queue.sink(Arc::clone(routing)))?;

        let format = tap.format();
        let encoder = EncoderSettings::from_bitrate(format, bitrate)?;
        let writer = MuxWriter::create(path, encoder)?;

        self.lock_analyzer().prepare(format);
        let pipeline = queue.start(
            session_id,
            writer,
            Arc::clone(&self.analyzer),
            self.events.clone(),
            Arc::clone(routing),
        )?;

        debug!(
            session_id = %session_id,
            sample_rate = format.sample_rate,
            channels = format.channels,
            encoding = ?encoder.encoding,
            "Segment opened"
        );

        Ok((tap, pipeline))
    }

    /// Detach the tap, finalize the open container without announcing it, and
    /// move the session to the next path. Returns the new path.
    fn retire_segment(&mut self) -> CoreResult<PathBuf> {
        let Some(session) = self.session.as_mut() else {
            return Err(RecorderError::session("No active session"));
        };

        if session.pipeline.is_none() {
            // Nothing was written at the current path yet.
            return Ok(session.path.clone());
        }

        let next = self.resolver.rotate(&session.path)?;

        session.routing.store(false, Ordering::Release);
        session.tap = None;

        if let Some(mut pipeline) = session.pipeline.take() {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            self.pending.insert(
                ticket,
                PendingFinalize {
                    session_id: session.id,
                    path: pipeline.path().to_path_buf(),
                    announce: false,
                    ends_session: false,
                    waiters: Vec::new(),
                },
            );
            session.rotation = Some(ticket);
            pipeline.finalize(finalize_callback(self.notice_tx.clone(), ticket));
        }

        let previous = std::mem::replace(&mut session.path, next.clone());
        info!(session_id = %session.id, previous = ?previous, next = ?next, "Segment rotated");

        Ok(next)
    }

    #[instrument(skip(self))]
    fn reset(&mut self) -> CoreResult<PathBuf> {
        if !self.state.is_active() {
            return Err(RecorderError::session(format!(
                "Cannot reset while {}",
                self.state
            )));
        }

        let was_recording = self.state == RecordingState::Recording;
        let next = self.retire_segment()?;

        self.clock.reset();
        self.ticker.stop();
        self.lock_analyzer().reset();
        if let Some(session) = self.session.as_mut() {
            session.cause = PauseCause::User;
        }
        self.state = RecordingState::Paused;

        if was_recording {
            emit(&self.events, RecorderEvent::StatusChanged(RecordingState::Paused));
        }
        self.publish();

        Ok(next)
    }

    /// End the session. `Finalized` follows once the file is durable; `wait`
    /// receives the same outcome.
    #[instrument(skip(self, wait))]
    fn stop(&mut self, wait: Option<Reply<PathBuf>>) -> CoreResult<()> {
        if !self.state.is_active() {
            return Err(RecorderError::session(format!(
                "Cannot stop while {}",
                self.state
            )));
        }
        let Some(mut session) = self.session.take() else {
            return Err(RecorderError::session("No active session"));
        };

        session.routing.store(false, Ordering::Release);
        drop(session.tap.take());
        self.clock.pause();
        self.ticker.stop();
        self.state = RecordingState::Stopped;

        emit(&self.events, RecorderEvent::StatusChanged(RecordingState::Stopped));
        self.backend.deactivate();

        let waiters: Vec<_> = wait.into_iter().collect();

        if let Some(mut pipeline) = session.pipeline.take() {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            self.pending.insert(
                ticket,
                PendingFinalize {
                    session_id: session.id,
                    path: session.path.clone(),
                    announce: true,
                    ends_session: true,
                    waiters,
                },
            );
            self.last_path = Some(session.path.clone());
            pipeline.finalize(finalize_callback(self.notice_tx.clone(), ticket));
        } else if let Some(ticket) = session.rotation
            && let Some(pending) = self.pending.get_mut(&ticket)
        {
            // Reset right before stop: the retired segment is the session's file.
            pending.announce = true;
            pending.ends_session = true;
            pending.waiters.extend(waiters);
            self.last_path = Some(pending.path.clone());
        } else {
            match session.last_segment.take() {
                Some(path) => {
                    emit(&self.events, RecorderEvent::Finalized { path: path.clone() });
                    for waiter in waiters {
                        let _ = waiter.send(Ok(path.clone()));
                    }
                    self.last_path = Some(path);
                }
                None => {
                    let message = "Session ended without a finalized segment";
                    self.report(RecorderError::writer(message));
                    for waiter in waiters {
                        let _ = waiter.send(Err(RecorderError::writer(message)));
                    }
                }
            }
            self.state = RecordingState::Idle;
        }

        self.publish();
        info!(session_id = %session.id, "Recording stopped");

        Ok(())
    }

    fn on_finalized(&mut self, notice: FinalizeNotice) {
        let Some(pending) = self.pending.remove(&notice.ticket) else {
            warn!(ticket = notice.ticket, "Finalize notice for unknown ticket");
            return;
        };

        if let Some(session) = self.session.as_mut()
            && session.id == pending.session_id
            && session.rotation == Some(notice.ticket)
        {
            session.rotation = None;
            if let Ok(path) = &notice.result {
                session.last_segment = Some(path.clone());
            }
        }

        match &notice.result {
            Ok(path) => {
                info!(session_id = %pending.session_id, path = ?path, "Segment finalized");
                if pending.announce {
                    emit(&self.events, RecorderEvent::Finalized { path: path.clone() });
                }
            }
            Err(e) => {
                error!(session_id = %pending.session_id, error = %e, "Finalize failed");
                emit(&self.events, RecorderEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        for waiter in pending.waiters {
            let reply = match &notice.result {
                Ok(path) => Ok(path.clone()),
                Err(e) => Err(RecorderError::writer(format!("Finalize failed: {}", e))),
            };
            let _ = waiter.send(reply);
        }

        if pending.ends_session && self.state == RecordingState::Stopped {
            self.state = RecordingState::Idle;
            self.publish();
        }
    }

    async fn await_finalizations(&mut self) {
        while !self.pending.is_empty() {
            match self.notice_rx.recv().await {
                Some(notice) => self.on_finalized(notice),
                None => break,
            }
        }
    }

    #[instrument(skip(self))]
    async fn on_signal(&mut self, signal: SessionSignal) {
        info!(state = %self.state, "Session signal received");

        match signal {
            SessionSignal::InterruptionBegan => self.on_interruption_began(),
            SessionSignal::InterruptionEnded { should_resume } => {
                self.on_interruption_ended(should_resume).await
            }
            SessionSignal::RouteChanged {
                input_available: false,
            } => self.on_input_lost(),
            SessionSignal::RouteChanged {
                input_available: true,
            } => self.on_input_restored().await,
            SessionSignal::InputSwitched => self.on_input_switched().await,
        }
    }

    fn on_interruption_began(&mut self) {
        if self.state != RecordingState::Recording {
            return;
        }

        if let Some(tap) = self.session.as_mut().and_then(|s| s.tap.as_mut())
            && let Err(e) = tap.pause()
        {
            warn!(error = %e, "Failed to pause hardware engine");
        }
        self.pause(PauseCause::Interruption);
    }

    async fn on_interruption_ended(&mut self, should_resume: bool) {
        if self.pause_cause() != Some(PauseCause::Interruption) {
            debug!("No interruption to recover from");
            return;
        }

        if let Err(e) = self.backend.activate() {
            self.report(RecorderError::recovery(format!(
                "Failed to reactivate audio session: {}",
                e
            )));
            return;
        }

        if !self.backend.input_available() {
            self.set_pause_cause(PauseCause::DeviceLost);
            self.report(RecorderError::recovery(
                "No input device available after interruption",
            ));
            return;
        }

        if !should_resume {
            self.set_pause_cause(PauseCause::User);
            info!("Interruption ended, waiting for explicit resume");
            return;
        }

        self.recover().await;
    }

    fn on_input_lost(&mut self) {
        match self.state {
            RecordingState::Recording => {
                if let Some(session) = self.session.as_mut() {
                    session.routing.store(false, Ordering::Release);
                    session.tap = None;
                }
                self.pause(PauseCause::DeviceLost);
                self.report(RecorderError::recovery(
                    "Input device disconnected, recording paused",
                ));
            }
            RecordingState::Paused => {
                if let Some(session) = self.session.as_mut() {
                    session.tap = None;
                    if session.cause == PauseCause::Interruption {
                        session.cause = PauseCause::DeviceLost;
                    }
                }
                debug!("Input device disconnected while paused");
            }
            RecordingState::Idle | RecordingState::Stopped => {}
        }
    }

    async fn on_input_restored(&mut self) {
        if self.pause_cause() != Some(PauseCause::DeviceLost) {
            return;
        }

        if let Err(e) = self.backend.activate() {
            self.report(RecorderError::recovery(format!(
                "Failed to reactivate audio session: {}",
                e
            )));
            return;
        }

        self.recover().await;
    }

    /// Move the tap to the new default device without leaving `Recording`.
    /// A format change rotates the segment like a route restore.
    async fn on_input_switched(&mut self) {
        match self.state {
            RecordingState::Recording => {
                if let Some(session) = self.session.as_mut() {
                    session.tap = None;
                }

                let switched = match self.backend.activate() {
                    Ok(()) => self.reinstall_tap().await,
                    Err(e) => Err(e),
                };

                match switched {
                    Ok(()) => {
                        if let Some(session) = self.session.as_mut() {
                            session.routing.store(true, Ordering::Release);
                        }
                        self.clock.resume();
                        self.publish();
                        info!("Input device switched");
                    }
                    Err(e) => {
                        self.pause(PauseCause::DeviceLost);
                        self.report(RecorderError::recovery(format!(
                            "Failed to switch input device, recording paused: {}",
                            e
                        )));
                    }
                }
            }
            RecordingState::Paused => {
                // Resume reattaches to whichever device is current then.
                if let Some(session) = self.session.as_mut() {
                    session.tap = None;
                }
                debug!("Input device switched while paused");
            }
            RecordingState::Idle | RecordingState::Stopped => {}
        }
    }

    async fn recover(&mut self) {
        match self.restore_session().await {
            Ok(()) => {
                self.enter_recording();
                info!("Recording recovered");
            }
            Err(e) => self.report(RecorderError::recovery(format!(
                "Failed to resume recording: {}",
                e
            ))),
        }
    }

    fn update_analyzer(&mut self, update: AnalyzerUpdate) {
        let mut analyzer = self.lock_analyzer();
        match update {
            AnalyzerUpdate::Threshold(value) => analyzer.set_threshold(value),
            AnalyzerUpdate::WindowSize(frames) => analyzer.set_window_size(frames),
            AnalyzerUpdate::CalibrationDuration(duration) => {
                analyzer.set_calibration_duration(duration)
            }
            AnalyzerUpdate::VoiceBandFilter(enabled) => analyzer.set_voice_band_filter(enabled),
            AnalyzerUpdate::GainFactor(gain) => analyzer.set_gain_factor(gain),
            AnalyzerUpdate::SpeechMode(mode) => analyzer.set_speech_mode(mode),
            AnalyzerUpdate::EmissionInterval(interval) => analyzer.set_emission_interval(interval),
        }
    }

    fn on_tick(&self) {
        if self.state == RecordingState::Recording {
            emit(&self.events, RecorderEvent::DurationTick {
                seconds: self.clock.elapsed().as_secs_f64(),
            });
        }
    }

    fn pause_cause(&self) -> Option<PauseCause> {
        match self.state {
            RecordingState::Paused => self.session.as_ref().map(|s| s.cause),
            _ => None,
        }
    }

    fn set_pause_cause(&mut self, cause: PauseCause) {
        if let Some(session) = self.session.as_mut() {
            session.cause = cause;
        }
    }

    fn report(&self, error: RecorderError) {
        error!(error = %error, "Recorder error");
        emit(&self.events, RecorderEvent::Error {
            message: error.to_string(),
        });
    }

    fn lock_analyzer(&self) -> MutexGuard<'_, VoiceAnalyzer> {
        self.analyzer.lock().unwrap_or_else(|e| {
            error!("Analyzer lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn publish(&self) {
        let session = self.session.as_ref();
        let path = session
            .map(|s| s.path.clone())
            .or_else(|| self.configured.as_ref().map(|t| t.path.clone()))
            .or_else(|| self.last_path.clone());

        let status = RecorderStatus {
            state: self.state,
            duration: self.clock.elapsed(),
            path,
            session_id: session.map(|s| s.id),
            format: session.map(|s| s.format),
        };

        self.status.send_replace(StatusSnapshot {
            status,
            clock: self.clock.clone(),
        });
    }
}

fn finalize_callback(notices: mpsc::UnboundedSender<FinalizeNotice>, ticket: u64) -> FinalizeCallback {
    let notifier = FinalizeNotifier {
        notices,
        ticket,
        sent: false,
    };
    Box::new(move |result| notifier.notify(result))
}
