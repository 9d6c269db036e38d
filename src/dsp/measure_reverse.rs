//! Measure reversal

use crate::dsp::selection::{build_measure, SampleSelection};
use crate::dsp::{millis_per_beat, validate_bpm, SampleSelector};
use crate::error::{BeatmillError, Result};

/// Reverses the order of beats within each measure.
///
/// The batch window covers one full measure; it is partitioned into
/// `measure_size` equal beats which are emitted last-to-first.
#[derive(Debug, Clone)]
pub struct MeasureReverser {
    bpm: u32,
    measure_size: usize,
}

impl MeasureReverser {
    pub fn new(bpm: u32, measure_size: usize) -> Result<Self> {
        validate_bpm(bpm)?;
        if measure_size == 0 {
            return Err(BeatmillError::Config {
                reason: "measure size must be positive".to_string(),
            });
        }
        Ok(Self { bpm, measure_size })
    }
}

impl SampleSelector for MeasureReverser {
    fn select_samples(&self, samples_len: usize, _batch: usize) -> Vec<SampleSelection> {
        // samples here represent one measure
        let mut by_beat = build_measure(self.measure_size, samples_len);
        by_beat.reverse();
        by_beat
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm) * self.measure_size as u64
    }

    fn describe(&self) -> String {
        format!("ReverseMeasure[bpm={},msize={}]", self.bpm, self.measure_size)
    }
}
