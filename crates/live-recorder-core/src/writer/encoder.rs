use crate::{CoreResult, RecorderError, audio::InputFormat};

use hound::{SampleFormat, WavSpec};

/// Sample encoding written into the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// 16-bit signed integer PCM.
    Int16,
    /// 24-bit signed integer PCM.
    Int24,
    /// 32-bit IEEE float.
    Float32,
}

impl SampleEncoding {
    /// Bits per stored sample.
    pub fn bits(self) -> u16 {
        match self {
            SampleEncoding::Int16 => 16,
            SampleEncoding::Int24 => 24,
            SampleEncoding::Float32 => 32,
        }
    }
}

/// Target encoding for one session, derived from the hardware format and the
/// requested bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Hardware format carried through unchanged.
    pub format: InputFormat,
    /// Per-sample encoding.
    pub encoding: SampleEncoding,
}

impl EncoderSettings {
    /// Pick the richest encoding the requested bitrate pays for.
    ///
    /// Bitrates below 16 bits per sample still encode as 16-bit; the container
    /// never stores fewer.
    #[track_caller]
    pub fn from_bitrate(format: InputFormat, bitrate: u32) -> CoreResult<Self> {
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(RecorderError::encoding(format!(
                "Hardware reported an unusable format: {} Hz, {} channels",
                format.sample_rate, format.channels
            )));
        }
        if bitrate == 0 {
            return Err(RecorderError::encoding("Bitrate must be greater than zero"));
        }

        let per_second = u64::from(format.sample_rate) * u64::from(format.channels);
        let bits = u64::from(bitrate) / per_second;

        let encoding = match bits {
            32.. => SampleEncoding::Float32,
            24..=31 => SampleEncoding::Int24,
            _ => SampleEncoding::Int16,
        };

        Ok(Self { format, encoding })
    }

    /// Bitrate actually written, in bits per second.
    pub fn effective_bitrate(&self) -> u64 {
        u64::from(self.format.sample_rate)
            * u64::from(self.format.channels)
            * u64::from(self.encoding.bits())
    }

    pub(crate) fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: self.encoding.bits(),
            sample_format: match self.encoding {
                SampleEncoding::Float32 => SampleFormat::Float,
                SampleEncoding::Int16 | SampleEncoding::Int24 => SampleFormat::Int,
            },
        }
    }
}
