//! Per-batch sample transformations
//!
//! Every transformation implements the [`SampleModifier`] trait: given one
//! batch of mono samples and its index, produce the replacement samples.
//! Each channel of a stereo batch is passed through the same modifier with
//! the same batch index, so channel outputs always agree in length.
//!
//! Most variants are selection-based ([`SampleSelector`]): they pick a list
//! of sub-ranges of the batch and concatenate them. The time-stretch engine
//! is the exception; it synthesizes entirely new samples.

mod beat_swap;
mod identity;
mod measure_reverse;
mod pattern_drop;
mod pattern_reverse;
mod percentage;
mod random;
mod selection;
mod stretch;
mod window;

pub use beat_swap::BeatSwapper;
pub use identity::Identity;
pub use measure_reverse::MeasureReverser;
pub use pattern_drop::PatternBeatDropper;
pub use pattern_reverse::PatternBeatReverser;
pub use percentage::PercentageBeatDropper;
pub use random::{RandomBeatDropper, RandomSampleDropper};
pub use selection::{build_measure, extract_selection, SampleSelection};
pub use stretch::TimeStretcher;
pub use window::WindowFunction;

use crate::error::{BeatmillError, Result};

/// A pluggable per-batch transformation
pub trait SampleModifier: Send + Sync {
    /// Transform one channel's worth of batch samples.
    ///
    /// Must be a pure function of `(samples, batch)`: the pipeline invokes
    /// it once per channel and relies on equal output lengths.
    fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>>;

    /// Requested batch time window in milliseconds.
    ///
    /// The segmenter converts this to a frame count using the negotiated
    /// sample rate.
    fn requested_time_ms(&self) -> u64;

    /// Short human-readable summary of the configured modification
    fn describe(&self) -> String;
}

/// The selection-based modifier family: choose ranges, concatenate them.
///
/// Implementors get [`SampleModifier`] for free via a blanket impl.
pub trait SampleSelector: Send + Sync {
    /// Ranges to keep, in output order (which need not be ascending)
    fn select_samples(&self, samples_len: usize, batch: usize) -> Vec<SampleSelection>;

    /// See [`SampleModifier::requested_time_ms`]
    fn requested_time_ms(&self) -> u64;

    /// See [`SampleModifier::describe`]
    fn describe(&self) -> String;
}

impl<T: SampleSelector> SampleModifier for T {
    fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
        let ranges = self.select_samples(samples.len(), batch);
        Ok(extract_selection(samples, &ranges))
    }

    fn requested_time_ms(&self) -> u64 {
        SampleSelector::requested_time_ms(self)
    }

    fn describe(&self) -> String {
        SampleSelector::describe(self)
    }
}

/// Milliseconds in one beat at `bpm` beats per minute
pub fn millis_per_beat(bpm: u32) -> u64 {
    (60_000.0 / bpm as f64) as u64
}

/// Reject a zero tempo at configuration time
pub(crate) fn validate_bpm(bpm: u32) -> Result<()> {
    if bpm == 0 {
        return Err(BeatmillError::Config {
            reason: "bpm must be positive".to_string(),
        });
    }
    Ok(())
}

/// Validate a cycled 0/1 pattern string at configuration time
pub(crate) fn validate_bit_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(BeatmillError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must not be empty".to_string(),
        });
    }
    if let Some(bad) = pattern.chars().find(|c| *c != '0' && *c != '1') {
        return Err(BeatmillError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("unexpected character `{bad}` (only 0 and 1 are allowed)"),
        });
    }
    Ok(())
}

/// True when the pattern bit for `batch` is `'1'`
pub(crate) fn pattern_bit(pattern: &str, batch: usize) -> bool {
    pattern.as_bytes()[batch % pattern.len()] == b'1'
}
