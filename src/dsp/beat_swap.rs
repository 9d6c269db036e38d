//! Beat reordering within a measure

use crate::dsp::selection::{build_measure, SampleSelection};
use crate::dsp::{millis_per_beat, validate_bpm, SampleSelector};
use crate::error::{BeatmillError, Result};

/// Reorders the beats of each measure according to a 1-based index pattern.
///
/// The pattern is colon-separated, e.g. `1:4:3:2` emits beat 0, then beat 3,
/// then beat 2, then beat 1. Indices must fall within the measure; a beat
/// may appear more than once or not at all.
#[derive(Debug, Clone)]
pub struct BeatSwapper {
    bpm: u32,
    measure_size: usize,
    pattern: String,
    /// 0-based beat indices in output order
    order: Vec<usize>,
}

impl BeatSwapper {
    pub fn new(bpm: u32, measure_size: usize, pattern: &str) -> Result<Self> {
        validate_bpm(bpm)?;
        if measure_size == 0 {
            return Err(BeatmillError::Config {
                reason: "measure size must be positive".to_string(),
            });
        }
        let order = Self::parse_pattern(pattern, measure_size)?;
        Ok(Self {
            bpm,
            measure_size,
            pattern: pattern.to_string(),
            order,
        })
    }

    fn parse_pattern(pattern: &str, measure_size: usize) -> Result<Vec<usize>> {
        let invalid = |reason: String| BeatmillError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern must not be empty".to_string()));
        }
        pattern
            .split(':')
            .map(|token| {
                let index: usize = token
                    .parse()
                    .map_err(|_| invalid(format!("`{token}` is not a beat index")))?;
                if index == 0 || index > measure_size {
                    return Err(invalid(format!(
                        "beat index {index} outside measure of {measure_size}"
                    )));
                }
                Ok(index - 1)
            })
            .collect()
    }
}

impl SampleSelector for BeatSwapper {
    fn select_samples(&self, samples_len: usize, _batch: usize) -> Vec<SampleSelection> {
        // samples here represent one measure
        let by_beat = build_measure(self.measure_size, samples_len);
        self.order.iter().map(|&beat| by_beat[beat]).collect()
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm) * self.measure_size as u64
    }

    fn describe(&self) -> String {
        format!(
            "Swap[bpm={},msize={},pattern={}]",
            self.bpm, self.measure_size, self.pattern
        )
    }
}
