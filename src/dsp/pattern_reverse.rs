//! Pattern-based beat reversal

use crate::dsp::{millis_per_beat, pattern_bit, validate_bit_pattern, validate_bpm, SampleModifier};
use crate::error::Result;

/// Reverses the sample order of beats selected by a cycled 0/1 pattern,
/// passing the others through unchanged.
#[derive(Debug, Clone)]
pub struct PatternBeatReverser {
    bpm: u32,
    pattern: String,
}

impl PatternBeatReverser {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self> {
        validate_bpm(bpm)?;
        validate_bit_pattern(pattern)?;
        Ok(Self {
            bpm,
            pattern: pattern.to_string(),
        })
    }
}

impl SampleModifier for PatternBeatReverser {
    fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
        let mut out = samples.to_vec();
        if pattern_bit(&self.pattern, batch) {
            out.reverse();
        }
        Ok(out)
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm)
    }

    fn describe(&self) -> String {
        format!("PatternReverseBeat[bpm={},pattern={}]", self.bpm, self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverses_selected_beats() {
        let modifier = PatternBeatReverser::new(120, "01").unwrap();
        let samples: Vec<i16> = vec![1, 2, 3, 4];

        assert_eq!(modifier.modify_samples(&samples, 0).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(modifier.modify_samples(&samples, 1).unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(modifier.modify_samples(&samples, 2).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_length_always_preserved() {
        let modifier = PatternBeatReverser::new(90, "10").unwrap();
        let samples = vec![5i16; 321];
        for batch in 0..3 {
            assert_eq!(modifier.modify_samples(&samples, batch).unwrap().len(), 321);
        }
    }
}
