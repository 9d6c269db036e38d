//! Pattern-based beat dropping

use crate::dsp::selection::SampleSelection;
use crate::dsp::{millis_per_beat, pattern_bit, validate_bit_pattern, validate_bpm, SampleSelector};
use crate::error::Result;

/// Drops beats according to a cycled pattern of `0`s and `1`s.
///
/// A `0` at the batch's pattern position drops the whole beat; a `1` keeps
/// it. To drop every other beat, use `"10"`; for the opposite phase, `"01"`.
#[derive(Debug, Clone)]
pub struct PatternBeatDropper {
    bpm: u32,
    pattern: String,
}

impl PatternBeatDropper {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self> {
        validate_bpm(bpm)?;
        validate_bit_pattern(pattern)?;
        Ok(Self {
            bpm,
            pattern: pattern.to_string(),
        })
    }
}

impl SampleSelector for PatternBeatDropper {
    fn select_samples(&self, samples_len: usize, batch: usize) -> Vec<SampleSelection> {
        // samples here represent one beat
        let keep = pattern_bit(&self.pattern, batch);
        vec![SampleSelection::new(0, if keep { samples_len } else { 0 })]
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm)
    }

    fn describe(&self) -> String {
        format!("Pattern[bpm={},pattern={}]", self.bpm, self.pattern)
    }
}
