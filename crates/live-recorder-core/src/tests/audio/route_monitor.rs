use crate::{
    RecordingState, RouteMonitor, SessionSignal, route_signals,
    tests::support::{FakeDevice, MONO_16K, spawn_recorder, wav_frames},
};

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tempfile::tempdir;

/// WHAT: Route transitions map onto availability signals
/// WHY: A device swap is a switch, not a loss followed by a gain
#[test]
fn given_route_transitions_when_mapping_then_expected_signals() {
    // Given: The four kinds of transition
    let lost = SessionSignal::RouteChanged {
        input_available: false,
    };
    let gained = SessionSignal::RouteChanged {
        input_available: true,
    };

    // When/Then: Unplug, plug, swap, and no change
    assert_eq!(route_signals(Some("mic"), None), vec![lost]);
    assert_eq!(route_signals(None, Some("mic")), vec![gained]);
    assert_eq!(
        route_signals(Some("mic"), Some("headset")),
        vec![SessionSignal::InputSwitched]
    );
    assert!(route_signals(Some("mic"), Some("mic")).is_empty());
    assert!(route_signals(None, None).is_empty());
}

/// WHAT: The monitor pauses a recording when the input disappears
/// WHY: Desktop hosts learn about unplugged devices only by polling
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_monitored_recording_when_device_disappears_then_paused() {
    // Given: A recording watched by a monitor over a scripted probe
    let dir = tempdir().unwrap();
    let device = FakeDevice::new(MONO_16K);
    let (recorder, mut events) = spawn_recorder(&device, dir.path());
    recorder.start().await.unwrap();

    let current = Arc::new(Mutex::new(Some("built-in".to_string())));
    let probes = Arc::new(AtomicUsize::new(0));
    let probe_state = Arc::clone(&current);
    let probe_count = Arc::clone(&probes);
    let monitor = RouteMonitor::spawn(
        recorder.clone(),
        Box::new(move || {
            let device = probe_state.lock().unwrap().clone();
            probe_count.fetch_add(1, Ordering::SeqCst);
            device
        }),
        Duration::from_millis(10),
    )
    .unwrap();
    for _ in 0..200 {
        if probes.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // When: The device goes away
    *current.lock().unwrap() = None;

    // Then: The session pauses with an error
    events.wait_for_status(RecordingState::Paused).await;
    let message = events.wait_for_error().await;
    assert!(message.contains("disconnected"), "{}", message);
    monitor.stop();
}

/// WHAT: The monitor moves a recording to a newly chosen default input
/// WHY: An input stayed available, so no pause or error may be reported
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_monitored_recording_when_default_device_changes_then_keeps_recording() {
    // Given: A recording watched by a monitor over a scripted device list
    let dir = tempdir().unwrap();
    let device = FakeDevice::new(MONO_16K);
    let (recorder, mut events) = spawn_recorder(&device, dir.path());
    let path = recorder.start().await.unwrap();
    device.feed_many(2, 160);

    let current = Arc::new(Mutex::new(Some("built-in".to_string())));
    let polls = Arc::new(AtomicUsize::new(0));
    let poll_state = Arc::clone(&current);
    let poll_count = Arc::clone(&polls);
    let monitor = RouteMonitor::spawn(
        recorder.clone(),
        Box::new(move || {
            let device = poll_state.lock().unwrap().clone();
            poll_count.fetch_add(1, Ordering::SeqCst);
            device
        }),
        Duration::from_millis(10),
    )
    .unwrap();
    for _ in 0..200 {
        if polls.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // When: The default input changes to a headset
    *current.lock().unwrap() = Some("headset".to_string());
    for _ in 0..200 {
        if device.installs() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    monitor.stop();
    recorder.resume().await.unwrap();
    device.feed_many(2, 160);
    recorder.stop_and_wait().await.unwrap();
    events.drain();

    // Then: The tap moved, the file continued, and nothing was reported
    assert_eq!(device.installs(), 2);
    assert_eq!(wav_frames(&path), 4 * 160);
    assert_eq!(
        events.statuses(),
        vec![RecordingState::Recording, RecordingState::Stopped]
    );
    assert!(events.errors().is_empty(), "{:?}", events.errors());
}
