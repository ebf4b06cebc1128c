use crate::{
    AnalyzerSettings, EncoderSettings, InputFormat, MuxWriter, RecorderEvent, VoiceAnalyzer,
    recorder::pipeline::{FinalizeCallback, PipelineQueue},
    tests::support::{MONO_16K, tone, wav_frames},
};

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
    },
    time::Duration,
};

use tempfile::tempdir;
use tokio::sync::mpsc::unbounded_channel;
use uuid::Uuid;

#[allow(clippy::unwrap_used)]
fn writer(path: &Path, format: InputFormat) -> MuxWriter {
    MuxWriter::create(path, EncoderSettings::from_bitrate(format, 128_000).unwrap()).unwrap()
}

fn analyzer(format: InputFormat) -> Arc<Mutex<VoiceAnalyzer>> {
    let mut analyzer = VoiceAnalyzer::new(AnalyzerSettings::default());
    analyzer.prepare(format);
    Arc::new(Mutex::new(analyzer))
}

fn completion() -> (FinalizeCallback, Receiver<crate::CoreResult<PathBuf>>) {
    let (tx, rx) = mpsc::channel();
    let callback: FinalizeCallback = Box::new(move |result| {
        let _ = tx.send(result);
    });
    (callback, rx)
}

/// WHAT: A stalled pipeline drops buffers and still finalizes without blocking
/// WHY: The hardware callback and the state queue must never wait on disk or analysis
#[test]
#[allow(clippy::unwrap_used)]
fn given_stalled_pipeline_when_queue_full_then_buffers_dropped_and_finalize_returns() {
    // Given: A one-slot queue holding a buffer, and a pipeline stuck on the analyzer
    let dir = tempdir().unwrap();
    let path = dir.path().join("busy.wav");
    let routing = Arc::new(AtomicBool::new(true));
    let queue = PipelineQueue::new(1);
    let mut sink = queue.sink(Arc::clone(&routing));
    sink(tone(MONO_16K, 160, 0.2, Duration::ZERO));

    let analyzer = analyzer(MONO_16K);
    let stall = analyzer.lock().unwrap();
    let (events, _event_rx) = unbounded_channel();
    let mut pipeline = queue
        .start(
            Uuid::new_v4(),
            writer(&path, MONO_16K),
            Arc::clone(&analyzer),
            events,
            Arc::clone(&routing),
        )
        .unwrap();

    // When: Four more buffers arrive and finalize is requested while stalled
    for n in 1..5 {
        sink(tone(MONO_16K, 160, 0.2, Duration::from_millis(n * 10)));
    }
    let (on_done, done) = completion();
    assert!(pipeline.finalize(on_done));
    let early = done.try_recv();
    drop(stall);
    let finalized = done.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();

    // Then: Finalize waited for the stall, and every buffer was either written or dropped
    assert!(early.is_err());
    assert_eq!(finalized, path);
    let written = u64::from(wav_frames(&path)) / 160;
    assert!(pipeline.dropped() >= 3, "dropped {}", pipeline.dropped());
    assert!((1..=2).contains(&written), "written {}", written);
    assert_eq!(written + pipeline.dropped(), 5);
}

/// WHAT: Buffers still queued when routing stops are written without levels
/// WHY: No wave level may follow a pause or stop notification
#[test]
#[allow(clippy::unwrap_used)]
fn given_queued_buffers_when_routing_stopped_then_written_without_wave_levels() {
    // Given: Three loud buffers queued while routing
    let dir = tempdir().unwrap();
    let path = dir.path().join("tail.wav");
    let routing = Arc::new(AtomicBool::new(true));
    let queue = PipelineQueue::new(8);
    let mut sink = queue.sink(Arc::clone(&routing));
    for n in 0..3 {
        sink(tone(MONO_16K, 160, 0.8, Duration::from_millis(n * 10)));
    }

    // When: Routing stops before the pipeline drains them
    routing.store(false, Ordering::Release);
    let (events, mut event_rx) = unbounded_channel();
    let mut pipeline = queue
        .start(
            Uuid::new_v4(),
            writer(&path, MONO_16K),
            analyzer(MONO_16K),
            events,
            Arc::clone(&routing),
        )
        .unwrap();
    let (on_done, done) = completion();
    pipeline.finalize(on_done);
    done.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();

    // Then: All audio landed in the file and no level was published
    assert_eq!(wav_frames(&path), 3 * 160);
    while let Ok(event) = event_rx.try_recv() {
        assert!(
            !matches!(event, RecorderEvent::WaveLevel { .. }),
            "{:?}",
            event
        );
    }
}

/// WHAT: A second finalize request is refused without calling back
/// WHY: Each container is closed exactly once
#[test]
#[allow(clippy::unwrap_used)]
fn given_finalize_requested_when_requested_again_then_refused() {
    // Given: A pipeline already asked to finalize
    let dir = tempdir().unwrap();
    let path = dir.path().join("once.wav");
    let routing = Arc::new(AtomicBool::new(true));
    let (events, _event_rx) = unbounded_channel();
    let mut pipeline = PipelineQueue::new(4)
        .start(
            Uuid::new_v4(),
            writer(&path, MONO_16K),
            analyzer(MONO_16K),
            events,
            routing,
        )
        .unwrap();
    let (first, first_done) = completion();
    assert!(pipeline.finalize(first));

    // When: Finalize is requested again
    let (second, second_done) = completion();
    let accepted = pipeline.finalize(second);

    // Then: Only the first callback fires
    assert!(!accepted);
    assert_eq!(
        first_done.recv_timeout(Duration::from_secs(2)).unwrap().unwrap(),
        path
    );
    assert!(second_done.recv_timeout(Duration::from_millis(100)).is_err());
}
