use crate::{
    InputFormat, PcmBuffer,
    analyzer::level::{level, rms, voice_band_crossings, zero_crossings},
    tests::support::{MONO_16K, tone},
};

use std::time::Duration;

/// Alternating full-scale samples: a tone at half the sample rate.
fn hiss(format: InputFormat, frames: usize, amplitude: f32) -> PcmBuffer {
    let samples: Vec<f32> = (0..frames)
        .map(|n| if n % 2 == 0 { amplitude } else { -amplitude })
        .collect();
    PcmBuffer::new(samples, format, Duration::ZERO)
}

/// WHAT: Every sign change is counted
/// WHY: Zero-crossing rate is the spectral proxy for the voice band
#[test]
fn given_alternating_signs_when_counting_then_each_change_counted() {
    // Given: Four samples with three sign changes
    let samples = [1.0, -1.0, 1.0, -1.0];

    // When: Counting crossings
    let count = zero_crossings(samples);

    // Then: Three
    assert_eq!(count, 3);
    assert_eq!(zero_crossings([0.5, 0.2, 0.1]), 0);
    assert_eq!(zero_crossings(std::iter::empty()), 0);
}

/// WHAT: Voice band range scales with rate and length
/// WHY: The expected crossings depend on the buffer's real sample rate
#[test]
fn given_rate_and_length_when_deriving_band_then_85_to_3400_hz_range() {
    // Given: 100 ms at 16 kHz
    let frames = 1_600;

    // When: Deriving the range
    let band = voice_band_crossings(16_000, frames);

    // Then: 2 * 85 * 0.1 ..= 2 * 3400 * 0.1
    assert!((band.start() - 17.0).abs() < 1e-3);
    assert!((band.end() - 680.0).abs() < 1e-3);
}

/// WHAT: Out-of-band content is attenuated, not muted
/// WHY: Hiss should drop to 30% while borderline content stays visible
#[test]
fn given_hiss_when_filter_enabled_then_level_attenuated() {
    // Given: A buffer crossing zero on every sample (8 kHz at 16 kHz)
    let buffer = hiss(MONO_16K, 160, 0.1);

    // When: Measuring with and without the filter
    let unfiltered = rms(&buffer, false);
    let filtered = rms(&buffer, true);

    // Then: Filtered RMS is 0.3 of the unfiltered one
    assert!((unfiltered - 0.1).abs() < 1e-4);
    assert!((filtered - 0.03).abs() < 1e-4);
}

/// WHAT: In-band speech passes the filter untouched
/// WHY: The filter must not dampen voice
#[test]
fn given_voice_tone_when_filter_enabled_then_level_unchanged() {
    // Given: A 440 Hz tone
    let buffer = tone(MONO_16K, 160, 0.1, Duration::ZERO);

    // When: Measuring with and without the filter
    let unfiltered = rms(&buffer, false);
    let filtered = rms(&buffer, true);

    // Then: Equal
    assert!((unfiltered - filtered).abs() < f32::EPSILON);
}

/// WHAT: Level is clamped into [0, 1]
/// WHY: Visualization consumers expect a normalized value
#[test]
fn given_loud_buffer_when_leveling_with_gain_then_clamped_to_one() {
    // Given: A full-scale tone
    let buffer = tone(MONO_16K, 160, 1.0, Duration::ZERO);

    // When: Applying gain 20
    let value = level(&buffer, true, 20.0);

    // Then: Clamped
    assert_eq!(value, 1.0);
    assert_eq!(level(&PcmBuffer::new(Vec::new(), MONO_16K, Duration::ZERO), true, 20.0), 0.0);
}
