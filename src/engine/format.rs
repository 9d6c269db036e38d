//! Stream format negotiation
//!
//! A [`Format`] is produced once per run from the decoded input and stays
//! immutable afterwards. Both the codec boundary and the batch segmenter
//! consume it.

use crate::error::{BeatmillError, Result};

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

/// Sample encoding of the raw stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// Signed 16-bit integer PCM
    #[default]
    S16,
}

impl SampleFormat {
    /// Bytes per single-channel sample
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::S16 => 2,
        }
    }
}

/// Byte order of the raw interleaved stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Negotiated stream format
///
/// The time base is the rational duration of one frame (`1 / sample_rate`),
/// kept explicit so downstream timing math never re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub channel_layout: ChannelLayout,
    pub sample_format: SampleFormat,
    /// Duration of one frame as a rational (numerator, denominator)
    pub time_base: (u32, u32),
    /// Frames per second
    pub sample_rate: u32,
    /// Byte order of the raw sample stream
    pub endianness: Endianness,
}

impl Format {
    /// Internal processing format: 16-bit signed stereo at the given rate
    pub fn stereo_s16(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatmillError::Config {
                reason: "sample rate must be positive".to_string(),
            });
        }
        Ok(Self {
            channel_layout: ChannelLayout::Stereo,
            sample_format: SampleFormat::S16,
            time_base: (1, sample_rate),
            sample_rate,
            endianness: Endianness::Little,
        })
    }

    /// Bytes per interleaved frame (all channels)
    pub fn bytes_per_frame(&self) -> usize {
        self.channel_layout.num_channels() * self.sample_format.bytes_per_sample()
    }

    /// Number of frames covered by `millis` milliseconds of audio
    pub fn frames_for_millis(&self, millis: u64) -> usize {
        (millis * self.sample_rate as u64 / 1000) as usize
    }
}
