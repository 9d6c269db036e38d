//! Percentage-based beat trimming

use crate::dsp::selection::SampleSelection;
use crate::dsp::{millis_per_beat, validate_bpm, SampleSelector};
use crate::error::{BeatmillError, Result};

/// Keeps only the leading fraction of every beat, dropping the tail.
///
/// `percentage` is given in `[0, 100]`; 0 drops each beat entirely and 100
/// keeps it whole.
#[derive(Debug, Clone)]
pub struct PercentageBeatDropper {
    bpm: u32,
    /// Kept fraction of each beat, in [0, 1]
    fraction: f64,
}

impl PercentageBeatDropper {
    pub fn new(bpm: u32, percentage: f64) -> Result<Self> {
        validate_bpm(bpm)?;
        if !(0.0..=100.0).contains(&percentage) {
            return Err(BeatmillError::PercentageOutOfRange { value: percentage });
        }
        Ok(Self {
            bpm,
            fraction: percentage / 100.0,
        })
    }
}

impl SampleSelector for PercentageBeatDropper {
    fn select_samples(&self, samples_len: usize, _batch: usize) -> Vec<SampleSelection> {
        // samples here represent one beat
        vec![SampleSelection::new(
            0,
            (self.fraction * samples_len as f64) as usize,
        )]
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm)
    }

    fn describe(&self) -> String {
        format!("Percentage[bpm={},{}%]", self.bpm, self.fraction * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::SampleModifier;
    use test_case::test_case;

    #[test_case(0.0, 100, 0; "zero keeps nothing")]
    #[test_case(100.0, 100, 100; "hundred keeps everything")]
    #[test_case(50.0, 100, 50; "half keeps half")]
    #[test_case(33.0, 10, 3; "length floors")]
    fn test_kept_length(percentage: f64, len: usize, expected: usize) {
        let modifier = PercentageBeatDropper::new(120, percentage).unwrap();
        let samples = vec![7i16; len];
        assert_eq!(modifier.modify_samples(&samples, 0).unwrap().len(), expected);
    }

    #[test]
    fn test_keeps_leading_samples() {
        let modifier = PercentageBeatDropper::new(120, 50.0).unwrap();
        let samples: Vec<i16> = (0..8).collect();
        assert_eq!(modifier.modify_samples(&samples, 0).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(PercentageBeatDropper::new(120, -0.5).is_err());
        assert!(PercentageBeatDropper::new(120, 100.5).is_err());
    }
}
