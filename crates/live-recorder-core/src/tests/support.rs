//! Scripted hardware and event helpers shared by the recorder tests.

#![allow(clippy::unwrap_used, clippy::panic)]

use crate::{
    AudioBackend, BufferCallback, CaptureTap, CoreResult, DefaultPathResolver, EventReceiver,
    InputFormat, PcmBuffer, Recorder, RecorderError, RecorderEvent, RecorderHandle,
    RecorderSettings, RecordingState,
};

use std::{
    f32::consts::TAU,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

pub(crate) const MONO_16K: InputFormat = InputFormat {
    sample_rate: 16_000,
    channels: 1,
};

pub(crate) const STEREO_48K: InputFormat = InputFormat {
    sample_rate: 48_000,
    channels: 2,
};

/// A 440 Hz sine block, identical on every channel.
pub(crate) fn tone(format: InputFormat, frames: usize, amplitude: f32, timestamp: Duration) -> PcmBuffer {
    let channels = usize::from(format.channels);
    let mut samples = Vec::with_capacity(frames * channels);
    for n in 0..frames {
        let t = n as f32 / format.sample_rate as f32;
        let value = amplitude * (TAU * 440.0 * t).sin();
        samples.extend(std::iter::repeat_n(value, channels));
    }
    PcmBuffer::new(samples, format, timestamp)
}

struct FakeHardware {
    format: InputFormat,
    active: bool,
    input_available: bool,
    fail_activation: bool,
    callback: Option<BufferCallback>,
    live_tap: u64,
    next_tap: u64,
    playing: bool,
    /// Frames delivered on the live tap; timestamps restart with every tap.
    tap_frames: u64,
    installs: usize,
}

/// Test double for the input hardware.
///
/// Clones share one device, so a test keeps a clone to script the hardware
/// while the recorder owns the backend built from it.
#[derive(Clone)]
pub(crate) struct FakeDevice {
    hw: Arc<Mutex<FakeHardware>>,
}

impl FakeDevice {
    pub(crate) fn new(format: InputFormat) -> Self {
        Self {
            hw: Arc::new(Mutex::new(FakeHardware {
                format,
                active: false,
                input_available: true,
                fail_activation: false,
                callback: None,
                live_tap: 0,
                next_tap: 1,
                playing: false,
                tap_frames: 0,
                installs: 0,
            })),
        }
    }

    fn hw(&self) -> MutexGuard<'_, FakeHardware> {
        self.hw.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn backend(&self) -> impl FnOnce() -> CoreResult<FakeBackend> + Send + 'static {
        let hw = Arc::clone(&self.hw);
        move || Ok(FakeBackend { hw })
    }

    pub(crate) fn set_format(&self, format: InputFormat) {
        self.hw().format = format;
    }

    pub(crate) fn set_input_available(&self, available: bool) {
        self.hw().input_available = available;
    }

    pub(crate) fn fail_activation(&self, fail: bool) {
        self.hw().fail_activation = fail;
    }

    pub(crate) fn has_tap(&self) -> bool {
        self.hw().callback.is_some()
    }

    pub(crate) fn installs(&self) -> usize {
        self.hw().installs
    }

    /// Deliver one tone block of `frames` on the live tap, as the hardware
    /// callback would. Returns whether a running tap received it.
    pub(crate) fn feed(&self, frames: usize, amplitude: f32) -> bool {
        let mut hw = self.hw();
        if !hw.playing {
            return false;
        }

        let format = hw.format;
        let timestamp =
            Duration::from_secs_f64(hw.tap_frames as f64 / f64::from(format.sample_rate));
        hw.tap_frames += frames as u64;

        match hw.callback.as_mut() {
            Some(callback) => {
                callback(tone(format, frames, amplitude, timestamp));
                true
            }
            None => false,
        }
    }

    /// Feed `count` blocks of `frames`; returns how many were delivered.
    pub(crate) fn feed_many(&self, count: usize, frames: usize) -> usize {
        (0..count).filter(|_| self.feed(frames, 0.2)).count()
    }
}

pub(crate) struct FakeBackend {
    hw: Arc<Mutex<FakeHardware>>,
}

impl FakeBackend {
    fn hw(&self) -> MutexGuard<'_, FakeHardware> {
        self.hw.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AudioBackend for FakeBackend {
    type Tap = FakeTap;

    fn name(&self) -> &str {
        "fake"
    }

    fn activate(&mut self) -> CoreResult<()> {
        let mut hw = self.hw();
        if hw.fail_activation {
            return Err(RecorderError::hardware("Microphone permission revoked"));
        }
        hw.active = true;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.hw().active = false;
    }

    fn input_available(&self) -> bool {
        self.hw().input_available
    }

    fn install_tap(&mut self, on_buffer: BufferCallback) -> CoreResult<FakeTap> {
        let mut hw = self.hw();
        if !hw.active {
            return Err(RecorderError::hardware("Input session is not active"));
        }

        let id = hw.next_tap;
        hw.next_tap += 1;
        hw.live_tap = id;
        hw.callback = Some(on_buffer);
        hw.playing = true;
        hw.tap_frames = 0;
        hw.installs += 1;

        Ok(FakeTap {
            hw: Arc::clone(&self.hw),
            id,
            format: hw.format,
        })
    }
}

pub(crate) struct FakeTap {
    hw: Arc<Mutex<FakeHardware>>,
    id: u64,
    format: InputFormat,
}

impl FakeTap {
    fn hw(&self) -> MutexGuard<'_, FakeHardware> {
        self.hw.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CaptureTap for FakeTap {
    fn format(&self) -> InputFormat {
        self.format
    }

    fn pause(&mut self) -> CoreResult<()> {
        let id = self.id;
        let mut hw = self.hw();
        if hw.live_tap == id {
            hw.playing = false;
        }
        Ok(())
    }

    fn play(&mut self) -> CoreResult<()> {
        let id = self.id;
        let mut hw = self.hw();
        if hw.live_tap == id {
            hw.playing = true;
        }
        Ok(())
    }
}

impl Drop for FakeTap {
    fn drop(&mut self) {
        let id = self.id;
        let mut hw = self.hw();
        if hw.live_tap == id {
            hw.callback = None;
            hw.playing = false;
        }
    }
}

/// Records every event seen so assertions can look back over a session.
pub(crate) struct EventLog {
    rx: EventReceiver,
    pub(crate) seen: Vec<RecorderEvent>,
}

impl EventLog {
    pub(crate) fn new(rx: EventReceiver) -> Self {
        Self {
            rx,
            seen: Vec::new(),
        }
    }

    /// Wait up to two seconds for an event matching `predicate`.
    pub(crate) async fn wait_for(
        &mut self,
        predicate: impl Fn(&RecorderEvent) -> bool,
    ) -> RecorderEvent {
        let wait = async {
            loop {
                match self.rx.recv().await {
                    Some(event) => {
                        self.seen.push(event.clone());
                        if predicate(&event) {
                            return event;
                        }
                    }
                    None => panic!("event channel closed"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .unwrap()
    }

    pub(crate) async fn wait_for_status(&mut self, state: RecordingState) {
        self.wait_for(|e| *e == RecorderEvent::StatusChanged(state))
            .await;
    }

    pub(crate) async fn wait_for_error(&mut self) -> String {
        match self
            .wait_for(|e| matches!(e, RecorderEvent::Error { .. }))
            .await
        {
            RecorderEvent::Error { message } => message,
            other => panic!("unexpected event {:?}", other),
        }
    }

    /// Pull everything already queued.
    pub(crate) fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.seen.push(event);
        }
    }

    pub(crate) fn statuses(&self) -> Vec<RecordingState> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::StatusChanged(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn finalized(&self) -> Vec<PathBuf> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::Finalized { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::Error { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Recorder over a fake device writing into `dir`.
pub(crate) fn spawn_recorder(device: &FakeDevice, dir: &Path) -> (RecorderHandle, EventLog) {
    spawn_recorder_with_depth(device, dir, 1024)
}

/// Like [`spawn_recorder`] with a pipeline queue of `queue_depth` buffers.
pub(crate) fn spawn_recorder_with_depth(
    device: &FakeDevice,
    dir: &Path,
    queue_depth: usize,
) -> (RecorderHandle, EventLog) {
    let settings = RecorderSettings {
        output_dir: Some(dir.to_path_buf()),
        queue_depth,
        ..RecorderSettings::default()
    };
    let (recorder, events) = Recorder::spawn_with_resolver(
        device.backend(),
        settings,
        DefaultPathResolver::new(Some(dir.to_path_buf())),
    )
    .unwrap();
    (recorder, EventLog::new(events))
}

/// Frames stored in a finished WAV file.
pub(crate) fn wav_frames(path: &Path) -> u32 {
    hound::WavReader::open(path).unwrap().duration()
}

/// Header of a finished WAV file.
pub(crate) fn wav_spec(path: &Path) -> hound::WavSpec {
    hound::WavReader::open(path).unwrap().spec()
}
