//! Sample range math
//!
//! Selection-based modifiers describe their output as a list of half-open
//! index ranges over the input batch, concatenated in caller-chosen order.

/// A half-open sub-range `[low, high)` of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleSelection {
    pub low: usize,
    pub high: usize,
}

impl SampleSelection {
    /// Create a selection; `low` must not exceed `high`.
    pub fn new(low: usize, high: usize) -> Self {
        debug_assert!(low <= high, "selection bounds out of order: [{low}, {high})");
        Self { low, high }
    }

    pub fn len(&self) -> usize {
        self.high - self.low
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }
}

/// Partition `samples_len` into exactly `measure_size` equal beats.
///
/// Beat size is `samples_len / measure_size` by integer division; remainder
/// samples past the last beat boundary are not covered by any beat.
pub fn build_measure(measure_size: usize, samples_len: usize) -> Vec<SampleSelection> {
    let beat_size = samples_len / measure_size;
    (0..measure_size)
        .map(|beat| SampleSelection::new(beat * beat_size, (beat + 1) * beat_size))
        .collect()
}

/// Concatenate the selected sub-ranges of `buffer`, in the order given.
pub fn extract_selection(buffer: &[i16], ranges: &[SampleSelection]) -> Vec<i16> {
    let total: usize = ranges.iter().map(SampleSelection::len).sum();
    let mut selected = Vec::with_capacity(total);
    for range in ranges {
        selected.extend_from_slice(&buffer[range.low..range.high]);
    }
    selected
}
