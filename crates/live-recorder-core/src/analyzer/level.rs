//! Per-buffer level measurement.

use crate::audio::PcmBuffer;

use std::ops::RangeInclusive;

/// Lowest fundamental counted as speech, in Hz.
pub(crate) const VOICE_BAND_LOW_HZ: f32 = 85.0;
/// Highest frequency counted as speech, in Hz.
pub(crate) const VOICE_BAND_HIGH_HZ: f32 = 3_400.0;
/// Gain applied to channels whose crossing rate is outside the voice band.
pub(crate) const OUT_OF_BAND_ATTENUATION: f32 = 0.3;

/// Count sign changes between consecutive samples.
pub fn zero_crossings(samples: impl IntoIterator<Item = f32>) -> usize {
    let mut iter = samples.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0;
    };

    let mut crossings = 0;
    for sample in iter {
        if (previous < 0.0) != (sample < 0.0) {
            crossings += 1;
        }
        previous = sample;
    }
    crossings
}

/// Crossing counts a voice-band signal can produce over `frames` samples.
///
/// A tone at `f` Hz crosses zero `2f` times per second.
pub fn voice_band_crossings(sample_rate: u32, frames: usize) -> RangeInclusive<f32> {
    if sample_rate == 0 {
        return 0.0..=0.0;
    }
    let seconds = frames as f32 / sample_rate as f32;
    (2.0 * VOICE_BAND_LOW_HZ * seconds)..=(2.0 * VOICE_BAND_HIGH_HZ * seconds)
}

/// RMS over all channels, optionally attenuating out-of-band channels.
pub fn rms(buffer: &PcmBuffer, voice_band_filter: bool) -> f32 {
    let samples = buffer.samples();
    if samples.is_empty() {
        return 0.0;
    }

    let band = voice_band_crossings(buffer.sample_rate(), buffer.frames());
    let mut sum_squares = 0.0f32;

    for channel in 0..usize::from(buffer.channels().max(1)) {
        let energy: f32 = buffer.channel(channel).map(|s| s * s).sum();

        let attenuation = if voice_band_filter {
            let crossings = zero_crossings(buffer.channel(channel)) as f32;
            if band.contains(&crossings) {
                1.0
            } else {
                OUT_OF_BAND_ATTENUATION
            }
        } else {
            1.0
        };

        sum_squares += energy * attenuation * attenuation;
    }

    (sum_squares / samples.len() as f32).sqrt()
}

/// Scaled level in `[0, 1]`.
pub fn level(buffer: &PcmBuffer, voice_band_filter: bool, gain: f32) -> f32 {
    let scaled = rms(buffer, voice_band_filter) * gain;
    if scaled.is_finite() {
        scaled.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
