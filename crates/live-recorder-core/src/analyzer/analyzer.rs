use crate::{
    analyzer::{
        AnalyzerSettings, SpeechMode, level,
        settings::{
            DEFAULT_GAIN, HIGH_RATE_GAIN, MAX_CALIBRATION_MS, MAX_EMISSION_INTERVAL_MS, MAX_GAIN,
            MAX_WINDOW_SIZE, MIN_CALIBRATION_MS, MIN_EMISSION_INTERVAL_MS, MIN_GAIN,
            MIN_WINDOW_SIZE,
        },
        vad::{Calibration, VadWindow},
    },
    audio::{InputFormat, PcmBuffer},
};

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

/// Safety factor over the measured noise floor in threshold mode.
pub(crate) const NOISE_SAFETY_MARGIN: f32 = 1.2;
/// Absolute headroom added to the noise floor before gating.
pub(crate) const NOISE_GATE_MARGIN: f32 = 0.02;
/// Factor over average calibration energy that marks speech in VAD mode.
pub(crate) const VAD_ENERGY_MULTIPLIER: f32 = 1.5;

/// Debounce gate keyed on hardware timestamps.
#[derive(Debug, Clone)]
struct EmissionClock {
    interval: Duration,
    last: Option<Duration>,
}

impl EmissionClock {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    fn should_emit(&mut self, timestamp: Duration) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => timestamp.saturating_sub(last) >= self.interval,
        };
        if due {
            self.last = Some(timestamp);
        }
        due
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Turns PCM buffers into a normalized waveform level, optionally gated by
/// speech detection.
///
/// The analyzer does no I/O. The pipeline thread calls [`VoiceAnalyzer::analyze`]
/// for every routed buffer; reconfiguration arrives through the recorder's state
/// queue.
#[derive(Debug, Clone)]
pub struct VoiceAnalyzer {
    settings: AnalyzerSettings,
    format: Option<InputFormat>,
    clock: EmissionClock,
    calibration: Calibration,
    window: VadWindow,
}

impl VoiceAnalyzer {
    /// Create an analyzer. Out-of-range settings are clamped.
    pub fn new(settings: AnalyzerSettings) -> Self {
        let settings = settings.normalized();
        Self {
            clock: EmissionClock::new(settings.emission_interval()),
            calibration: Calibration::new(settings.calibration_frames()),
            window: VadWindow::new(settings.window_size),
            format: None,
            settings,
        }
    }

    /// Current parameters.
    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Bind the analyzer to a session's hardware format and drop all state.
    #[instrument(skip(self))]
    pub fn prepare(&mut self, format: InputFormat) {
        self.format = Some(format);
        self.reset();
        debug!(gain = self.gain(), "Analyzer prepared");
    }

    /// Drop calibration, window history and the debounce clock.
    pub fn reset(&mut self) {
        self.calibration = Calibration::new(self.settings.calibration_frames());
        self.window = VadWindow::new(self.settings.window_size);
        self.clock = EmissionClock::new(self.settings.emission_interval());
    }

    /// Gain in effect: the pinned value, or a default for the bound format.
    pub fn gain(&self) -> f32 {
        if let Some(gain) = self.settings.gain_factor {
            return gain;
        }
        match self.format {
            Some(f) if f.sample_rate >= 48_000 || f.channels >= 2 => HIGH_RATE_GAIN,
            _ => DEFAULT_GAIN,
        }
    }

    /// Whether the calibration period is over.
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_complete()
    }

    /// Background estimate produced by calibration, already scaled for the mode.
    pub fn background_level(&self) -> Option<f32> {
        self.calibration.background()
    }

    /// Frames the calibration period spans.
    pub fn calibration_frames(&self) -> usize {
        self.calibration.frames_needed()
    }

    /// Debounced entry point: returns a level only when one is due.
    pub fn analyze(&mut self, buffer: &PcmBuffer) -> Option<f32> {
        if !self.clock.should_emit(buffer.timestamp()) {
            return None;
        }
        Some(self.process(buffer))
    }

    /// Classify one frame and return the level to report.
    ///
    /// Frames inside the calibration period and frames judged not to be speech
    /// report `0.0`.
    pub fn process(&mut self, buffer: &PcmBuffer) -> f32 {
        let level = self.measure(buffer);

        match self.settings.speech_mode {
            SpeechMode::Off => level,
            SpeechMode::Threshold => self.gate_threshold(level),
            SpeechMode::Vad => self.gate_vad(level),
        }
    }

    /// Raw level of a buffer with the current gain and filter settings.
    pub fn measure(&self, buffer: &PcmBuffer) -> f32 {
        level::level(buffer, self.settings.voice_band_filter, self.gain())
    }

    fn gate_threshold(&mut self, level: f32) -> f32 {
        if !self.calibration.is_complete() {
            if let Some(noise) = self.calibration.feed(level, NOISE_SAFETY_MARGIN) {
                info!(background_noise = noise, "Noise calibration complete");
            }
            return 0.0;
        }

        let noise = self.calibration.background().unwrap_or(0.0);
        let gate = self.settings.threshold.max(noise + NOISE_GATE_MARGIN);

        if level > gate { level } else { 0.0 }
    }

    fn gate_vad(&mut self, level: f32) -> f32 {
        if !self.calibration.is_complete() {
            if let Some(energy) = self.calibration.feed(level, VAD_ENERGY_MULTIPLIER) {
                info!(background_energy = energy, "VAD calibration complete");
            }
            return 0.0;
        }

        let energy = self.calibration.background().unwrap_or(0.0);
        let threshold = energy.max(self.settings.threshold);

        self.window.push(level);
        let ratio = self.window.ratio_above(threshold);

        if level > threshold && ratio >= self.settings.min_speech_ratio {
            level
        } else {
            0.0
        }
    }

    /// Set the speech threshold. Calibration is kept.
    pub fn set_threshold(&mut self, threshold: f32) {
        let threshold = threshold.clamp(0.0, 1.0);
        if (self.settings.threshold - threshold).abs() < f32::EPSILON {
            return;
        }
        self.settings.threshold = threshold;
        debug!(threshold, "Threshold updated");
    }

    /// Resize the VAD window. History is cleared, calibration kept.
    pub fn set_window_size(&mut self, frames: usize) {
        let clamped = frames.clamp(MIN_WINDOW_SIZE, MAX_WINDOW_SIZE);
        if clamped != frames {
            warn!(requested = frames, applied = clamped, "Window size clamped");
        }
        if self.settings.window_size == clamped {
            return;
        }
        self.settings.window_size = clamped;
        self.window = VadWindow::new(clamped);
        debug!(window_size = self.window.capacity(), "Window resized");
    }

    /// Change the calibration length. Restarts calibration.
    pub fn set_calibration_duration(&mut self, duration: Duration) {
        let requested = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let clamped = requested.clamp(MIN_CALIBRATION_MS, MAX_CALIBRATION_MS);
        if clamped != requested {
            warn!(requested_ms = requested, applied_ms = clamped, "Calibration duration clamped");
        }
        if self.settings.calibration_ms == clamped {
            return;
        }
        self.settings.calibration_ms = clamped;
        self.recalibrate("calibration duration changed");
    }

    /// Toggle the voice-band filter. Restarts calibration.
    pub fn set_voice_band_filter(&mut self, enabled: bool) {
        if self.settings.voice_band_filter == enabled {
            return;
        }
        self.settings.voice_band_filter = enabled;
        self.recalibrate("voice band filter toggled");
    }

    /// Pin the level gain. Restarts calibration.
    pub fn set_gain_factor(&mut self, gain: f32) {
        let clamped = gain.clamp(MIN_GAIN, MAX_GAIN);
        if (clamped - gain).abs() > f32::EPSILON {
            warn!(requested = gain, applied = clamped, "Gain factor clamped");
        }
        if self
            .settings
            .gain_factor
            .is_some_and(|g| (g - clamped).abs() < f32::EPSILON)
        {
            return;
        }
        self.settings.gain_factor = Some(clamped);
        self.recalibrate("gain factor changed");
    }

    /// Switch speech gating. Enabling or switching modes restarts calibration.
    pub fn set_speech_mode(&mut self, mode: SpeechMode) {
        if self.settings.speech_mode == mode {
            return;
        }
        self.settings.speech_mode = mode;
        if mode.is_enabled() {
            self.recalibrate("speech detection enabled");
        } else {
            debug!("Speech detection disabled");
        }
    }

    /// Change the debounce interval. Restarts calibration because the frame
    /// count of the calibration period depends on it.
    pub fn set_emission_interval(&mut self, interval: Duration) {
        let requested = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        let clamped = requested.clamp(MIN_EMISSION_INTERVAL_MS, MAX_EMISSION_INTERVAL_MS);
        if clamped != requested {
            warn!(requested_ms = requested, applied_ms = clamped, "Emission interval clamped");
        }
        if self.settings.emission_interval_ms == clamped {
            return;
        }
        self.settings.emission_interval_ms = clamped;
        self.recalibrate("emission interval changed");
    }

    fn recalibrate(&mut self, reason: &str) {
        self.calibration = Calibration::new(self.settings.calibration_frames());
        self.window.clear();
        self.clock = EmissionClock::new(self.settings.emission_interval());
        debug!(
            reason,
            calibration_frames = self.calibration.frames_needed(),
            "Analyzer recalibrating"
        );
    }

    /// Restart the debounce clock so the next buffer emits immediately.
    pub(crate) fn restart_clock(&mut self) {
        self.clock.reset();
    }
}
