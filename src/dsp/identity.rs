//! Identity pass-through

use crate::dsp::selection::SampleSelection;
use crate::dsp::SampleSelector;

/// Requested batch window when no timing information is needed
const IDENTITY_WINDOW_MS: u64 = 8192;

/// Passes every batch through unchanged.
///
/// Useful for exercising the whole pipeline (decode, segment, schedule,
/// gather, encode) without altering the audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self
    }
}

impl SampleSelector for Identity {
    fn select_samples(&self, samples_len: usize, _batch: usize) -> Vec<SampleSelection> {
        vec![SampleSelection::new(0, samples_len)]
    }

    fn requested_time_ms(&self) -> u64 {
        IDENTITY_WINDOW_MS
    }

    fn describe(&self) -> String {
        "Identity".to_string()
    }
}
