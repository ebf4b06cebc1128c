use crate::{
    CoreResult, RecorderError,
    analyzer::VoiceAnalyzer,
    audio::{BufferCallback, InputFormat, PcmBuffer},
    recorder::{EventSender, RecorderEvent, event::emit},
    writer::MuxWriter,
};

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{self, Receiver, SyncSender, TrySendError},
    },
    time::Duration,
};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Invoked exactly once on the pipeline thread when the container is closed.
pub(crate) type FinalizeCallback = Box<dyn FnOnce(CoreResult<PathBuf>) + Send + 'static>;

enum PipelineMessage {
    Buffer(PcmBuffer),
    /// Look at the finalize slot.
    Wake,
}

/// Finalize request parked beside the buffer queue, so asking for finalize
/// never waits for queue space.
#[derive(Default)]
struct FinalizeSlot {
    requested: AtomicBool,
    callback: Mutex<Option<FinalizeCallback>>,
}

impl FinalizeSlot {
    fn park(&self, on_done: FinalizeCallback) {
        *self.lock() = Some(on_done);
        self.requested.store(true, Ordering::SeqCst);
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<FinalizeCallback> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<FinalizeCallback>> {
        self.callback.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Producer side shared by every tap that feeds one pipeline.
#[derive(Clone)]
struct Intake {
    tx: SyncSender<PipelineMessage>,
    /// End of the last routed buffer, in microseconds on the pipeline timeline.
    high_water_us: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl Intake {
    /// Build the real-time callback for a tap.
    ///
    /// The callback reads only the routing flag and never blocks: when the queue
    /// is full the buffer is dropped and counted. A tap installed after another
    /// one continues the timeline where the previous tap stopped.
    fn sink(&self, routing: Arc<AtomicBool>) -> BufferCallback {
        let tx = self.tx.clone();
        let high_water = Arc::clone(&self.high_water_us);
        let dropped = Arc::clone(&self.dropped);
        let offset = Duration::from_micros(high_water.load(Ordering::Acquire));

        Box::new(move |buffer: PcmBuffer| {
            if !routing.load(Ordering::Acquire) {
                return;
            }

            let buffer = buffer.shifted(offset);
            let end = buffer.timestamp() + buffer.duration();
            high_water.fetch_max(
                u64::try_from(end.as_micros()).unwrap_or(u64::MAX),
                Ordering::AcqRel,
            );

            match tx.try_send(PipelineMessage::Buffer(buffer)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        })
    }
}

/// Queue created before the tap so the tap's callback can be wired up before
/// the hardware format, and therefore the writer, is known.
pub(crate) struct PipelineQueue {
    intake: Intake,
    rx: Receiver<PipelineMessage>,
}

impl PipelineQueue {
    pub(crate) fn new(depth: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(depth.max(1));
        Self {
            intake: Intake {
                tx,
                high_water_us: Arc::new(AtomicU64::new(0)),
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        }
    }

    pub(crate) fn sink(&self, routing: Arc<AtomicBool>) -> BufferCallback {
        self.intake.sink(routing)
    }

    /// Spawn the pipeline thread that owns `writer`.
    ///
    /// Wave levels are emitted only while `routing` is set, so none trails a
    /// pause or stop.
    #[track_caller]
    pub(crate) fn start(
        self,
        session_id: Uuid,
        writer: MuxWriter,
        analyzer: Arc<Mutex<VoiceAnalyzer>>,
        events: EventSender,
        routing: Arc<AtomicBool>,
    ) -> CoreResult<PipelineHandle> {
        let path = writer.path().to_path_buf();
        let format = writer.settings().format;
        let slot = Arc::new(FinalizeSlot::default());
        let context = PipelineContext {
            session_id,
            analyzer,
            events,
            routing,
            dropped: Arc::clone(&self.intake.dropped),
            slot: Arc::clone(&slot),
        };
        let rx = self.rx;

        std::thread::Builder::new()
            .name("recorder-pipeline".to_string())
            .spawn(move || run_pipeline(rx, writer, context))
            .map_err(|e| RecorderError::writer(format!("Failed to spawn pipeline thread: {}", e)))?;

        debug!(session_id = %session_id, path = ?path, "Pipeline started");

        Ok(PipelineHandle {
            intake: self.intake,
            slot,
            session_id,
            path,
            format,
            finalize_requested: false,
        })
    }
}

/// The state machine's handle on one open container.
pub(crate) struct PipelineHandle {
    intake: Intake,
    slot: Arc<FinalizeSlot>,
    session_id: Uuid,
    path: PathBuf,
    format: InputFormat,
    finalize_requested: bool,
}

impl PipelineHandle {
    /// Callback for a replacement tap feeding this same container.
    pub(crate) fn sink(&self, routing: Arc<AtomicBool>) -> BufferCallback {
        self.intake.sink(routing)
    }

    pub(crate) fn format(&self) -> InputFormat {
        self.format
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Buffers the real-time callback could not queue.
    pub(crate) fn dropped(&self) -> u64 {
        self.intake.dropped.load(Ordering::Relaxed)
    }

    /// Finalize after the buffers already accepted are written. Never blocks.
    ///
    /// Returns `false` without invoking `on_done` if finalize was already
    /// requested.
    pub(crate) fn finalize(&mut self, on_done: FinalizeCallback) -> bool {
        if self.finalize_requested {
            return false;
        }
        self.finalize_requested = true;
        self.slot.park(on_done);
        debug!(session_id = %self.session_id, dropped = self.dropped(), "Finalize requested");

        match self.intake.tx.try_send(PipelineMessage::Wake) {
            // A full queue keeps the pipeline thread busy; it checks the slot
            // after every buffer.
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                if let Some(on_done) = self.slot.take() {
                    on_done(Err(RecorderError::writer(
                        "Pipeline thread exited before finalize",
                    )));
                }
            }
        }

        true
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        if self.finalize_requested {
            return;
        }
        let session_id = self.session_id;
        let requested = self.finalize(Box::new(move |result| {
            if let Err(e) = result {
                warn!(session_id = %session_id, error = %e, "Discarded pipeline failed to finalize");
            }
        }));
        debug!(session_id = %session_id, requested, "Pipeline handle dropped");
    }
}

struct PipelineContext {
    session_id: Uuid,
    analyzer: Arc<Mutex<VoiceAnalyzer>>,
    events: EventSender,
    routing: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    slot: Arc<FinalizeSlot>,
}

impl PipelineContext {
    /// Write one buffer and publish its level. Reports only the first write
    /// failure.
    fn process(&self, writer: &mut MuxWriter, buffer: &PcmBuffer, write_failed: &mut bool) {
        if let Err(e) = writer.append(buffer)
            && !*write_failed
        {
            *write_failed = true;
            error!(session_id = %self.session_id, error = %e, "Container write failed");
            emit(&self.events, RecorderEvent::Error {
                message: e.to_string(),
            });
        }

        let level = self
            .analyzer
            .lock()
            .unwrap_or_else(|e| {
                error!("Analyzer lock poisoned, recovering: {}", e);
                e.into_inner()
            })
            .analyze(buffer);

        if let Some(level) = level
            && self.routing.load(Ordering::Acquire)
        {
            emit(&self.events, RecorderEvent::WaveLevel {
                level,
                timestamp_ms: Utc::now().timestamp_millis(),
            });
        }
    }
}

fn run_pipeline(rx: Receiver<PipelineMessage>, mut writer: MuxWriter, context: PipelineContext) {
    let session_id = context.session_id;
    let mut write_failed = false;

    while let Ok(message) = rx.recv() {
        if let PipelineMessage::Buffer(buffer) = message {
            context.process(&mut writer, &buffer, &mut write_failed);
        }

        if !context.slot.is_requested() {
            continue;
        }

        // Everything queued before the request belongs in the container.
        loop {
            match rx.try_recv() {
                Ok(PipelineMessage::Buffer(buffer)) => {
                    context.process(&mut writer, &buffer, &mut write_failed)
                }
                Ok(PipelineMessage::Wake) => {}
                Err(_) => break,
            }
        }

        let result = writer.finalize();
        info!(
            session_id = %session_id,
            frames = writer.frames_written(),
            dropped = context.dropped.load(Ordering::Relaxed),
            ok = result.is_ok(),
            "Pipeline finished"
        );
        if let Some(on_done) = context.slot.take() {
            on_done(result);
        }
        return;
    }

    debug!(session_id = %session_id, "Pipeline queue closed without finalize request");
}
