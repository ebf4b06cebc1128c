use crate::{
    CoreResult, RecorderError,
    audio::{AudioBackend, BufferCallback, CaptureTap, InputFormat, PcmBuffer},
};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cpal::{
    Device, SampleFormat, Stream, StreamConfig, StreamInstant,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{debug, error, info, instrument, warn};

/// Production backend on top of the platform's default `cpal` host.
///
/// `activate` picks the current default input device, so a backend reused after
/// a route change follows the new default.
pub struct CpalBackend {
    host: cpal::Host,
    device: Option<Device>,
}

impl CpalBackend {
    /// Create a backend for the default host. No device is opened until
    /// [`AudioBackend::activate`].
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            device: None,
        }
    }
}

impl CpalBackend {
    /// Identity of the default input device, if one is present.
    ///
    /// Used as the probe for [`crate::RouteMonitor`].
    pub fn default_input_id() -> Option<String> {
        let device = cpal::default_host().default_input_device()?;
        Some(match device.id() {
            Ok(id) => format!("{:?}", id),
            Err(_) => "unidentified".to_string(),
        })
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    type Tap = CpalTap;

    fn name(&self) -> &str {
        "cpal"
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn activate(&mut self) -> CoreResult<()> {
        let device = self
            .host
            .default_input_device()
            .ok_or_else(|| RecorderError::hardware("No microphone found"))?;

        // Probing the default config surfaces permission and busy-device
        // failures before any tap is installed.
        let config = device
            .default_input_config()
            .map_err(|e| RecorderError::hardware(format!("Failed to get config: {}", e)))?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            sample_format = ?config.sample_format(),
            "Input session activated"
        );

        self.device = Some(device);

        Ok(())
    }

    fn deactivate(&mut self) {
        if self.device.take().is_some() {
            debug!("Input session deactivated");
        }
    }

    fn input_available(&self) -> bool {
        self.host.default_input_device().is_some()
    }

    #[track_caller]
    #[instrument(skip(self, on_buffer))]
    fn install_tap(&mut self, on_buffer: BufferCallback) -> CoreResult<CpalTap> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| RecorderError::hardware("Input session is not active"))?;

        let supported = device
            .default_input_config()
            .map_err(|e| RecorderError::hardware(format!("Failed to get config: {}", e)))?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let format = InputFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        let detached = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(device, &config, format, &detached, on_buffer),
            SampleFormat::I16 => build_stream::<i16>(device, &config, format, &detached, on_buffer),
            SampleFormat::U16 => build_stream::<u16>(device, &config, format, &detached, on_buffer),
            SampleFormat::I32 => build_stream::<i32>(device, &config, format, &detached, on_buffer),
            other => {
                return Err(RecorderError::encoding(format!(
                    "Unsupported hardware sample format: {:?}",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| RecorderError::hardware(format!("Failed to start stream: {}", e)))?;

        info!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Capture tap installed"
        );

        Ok(CpalTap {
            stream,
            format,
            detached,
            playing: true,
        })
    }
}

#[track_caller]
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    format: InputFormat,
    detached: &Arc<AtomicBool>,
    mut on_buffer: BufferCallback,
) -> CoreResult<Stream>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let detached = Arc::clone(detached);
    let mut origin: Option<StreamInstant> = None;

    device
        .build_input_stream(
            config,
            move |data: &[T], info: &cpal::InputCallbackInfo| {
                // Once the tap is dropped no further block is handed out, even
                // if the backend fires one more callback before the stream dies.
                if detached.load(Ordering::Acquire) {
                    return;
                }

                let capture = info.timestamp().capture;
                let start = *origin.get_or_insert(capture);
                let timestamp = capture.duration_since(&start).unwrap_or_default();

                let samples: Vec<f32> = data
                    .iter()
                    .map(|&s| <f32 as cpal::Sample>::from_sample(s))
                    .collect();

                on_buffer(PcmBuffer::new(samples, format, timestamp));
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| RecorderError::hardware(format!("Failed to build stream: {}", e)))
}

/// Tap over a running `cpal` input stream.
pub struct CpalTap {
    stream: Stream,
    format: InputFormat,
    detached: Arc<AtomicBool>,
    playing: bool,
}

impl CaptureTap for CpalTap {
    fn format(&self) -> InputFormat {
        self.format
    }

    #[track_caller]
    fn pause(&mut self) -> CoreResult<()> {
        if !self.playing {
            return Ok(());
        }

        self.stream
            .pause()
            .map_err(|e| RecorderError::hardware(format!("Failed to pause stream: {}", e)))?;
        self.playing = false;
        debug!("Capture engine paused");

        Ok(())
    }

    #[track_caller]
    fn play(&mut self) -> CoreResult<()> {
        if self.playing {
            return Ok(());
        }

        self.stream
            .play()
            .map_err(|e| RecorderError::hardware(format!("Failed to resume stream: {}", e)))?;
        self.playing = true;
        debug!("Capture engine resumed");

        Ok(())
    }
}

impl Drop for CpalTap {
    fn drop(&mut self) {
        self.detached.store(true, Ordering::Release);
        if self.playing
            && let Err(e) = self.stream.pause()
        {
            warn!(error = %e, "Failed to pause stream while detaching tap");
        }
        info!("Capture tap detached");
    }
}
