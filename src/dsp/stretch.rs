//! Overlap-add time stretching
//!
//! Doubles the duration of beats selected by a cycled 0/1 pattern, keeping
//! pitch intact. Synthesis windows are laid out at half-window spacing over
//! the stretched output; each pulls its samples from the inverse-scaled
//! analysis position in the input, nudged by a cross-correlation alignment
//! against the previous window's natural progression so waveform phase
//! stays continuous across window boundaries.
//!
//! Each window contributes at a single weight: the squared-window table
//! entry selected by that window's ordinal, constant across the window's
//! samples. The accumulated weights are divided back out afterwards, so
//! wherever neighbouring weights climb past the epsilon floor the signal
//! reconstructs exactly; below it the contribution stays attenuated.
//!
//! Accumulation runs in `f64` rather than arbitrary-precision decimal;
//! double precision keeps the drift from overlapping additions well below
//! one 16-bit quantization step.

use rayon::prelude::*;

use crate::dsp::window::WindowFunction;
use crate::dsp::{millis_per_beat, pattern_bit, validate_bit_pattern, validate_bpm, SampleModifier};
use crate::error::{BeatmillError, Result};

const WIN_LEN: usize = 1024;
const WIN_LEN_HALF: usize = WIN_LEN / 2;
/// Cross-correlation search span, in samples
const TOLERANCE: usize = 512;
/// Playback speed of stretched beats; 0.5 doubles their duration
const STRETCH_FACTOR: f64 = 0.5;
/// Accumulated window weights below this renormalize against 1.0 instead
const WEIGHT_EPSILON: f64 = 1e-4;
/// Scale between 16-bit integer samples and normalized reals in [-1, 1)
const S16_SCALE: f64 = 32768.0;

/// Per-window accumulation buffers: weighted samples and the weights
/// themselves, combined by component-wise addition once all windows finish.
struct WindowAccumulator {
    output: Vec<f64>,
    weights: Vec<f64>,
}

impl WindowAccumulator {
    fn zeroed(len: usize) -> Self {
        Self {
            output: vec![0.0; len],
            weights: vec![0.0; len],
        }
    }

    fn merge(mut self, other: &WindowAccumulator) -> Self {
        for (acc, v) in self.output.iter_mut().zip(&other.output) {
            *acc += v;
        }
        for (acc, v) in self.weights.iter_mut().zip(&other.weights) {
            *acc += v;
        }
        self
    }
}

/// Stretches pattern-selected beats to double duration via windowed
/// overlap-add with cross-correlation synchronization.
pub struct TimeStretcher {
    bpm: u32,
    pattern: String,
    /// Squared Hann table; entry `w` weighs the whole of synthesis window `w`
    window: Vec<f64>,
}

impl TimeStretcher {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self> {
        validate_bpm(bpm)?;
        validate_bit_pattern(pattern)?;
        Ok(Self {
            bpm,
            pattern: pattern.to_string(),
            window: WindowFunction::Hann.squared(WIN_LEN),
        })
    }

    /// Output position of input position `i` under the stretch
    fn scaled_index(i: usize) -> usize {
        (i as f64 / STRETCH_FACTOR).ceil() as usize
    }

    /// Analysis position of synthesis position `s` (the inverse mapping)
    fn analysis_index(s: usize) -> usize {
        (s as f64 * STRETCH_FACTOR).floor() as usize
    }

    fn ola(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let output_length = Self::scaled_index(samples.len());
        // synthesis centers, spaced half a window apart across the output
        let syn_starts: Vec<usize> = (0..output_length)
            .step_by(WIN_LEN_HALF)
            .map(|i| i + WIN_LEN_HALF)
            .collect();
        // one weight-table entry per window, so a beat cannot span more
        // windows than the table has entries
        if syn_starts.len() > WIN_LEN {
            return Err(BeatmillError::Processing {
                batch,
                reason: format!(
                    "beat spans {} synthesis windows, more than the {WIN_LEN}-entry weight table",
                    syn_starts.len()
                ),
            });
        }
        let ana_starts: Vec<usize> = syn_starts
            .iter()
            .map(|&s| Self::analysis_index(s))
            .collect();

        // pad so every window and the correlation search stay in bounds;
        // the left pad also absorbs negative alignment offsets
        let pad_left = WIN_LEN_HALF + TOLERANCE;
        let last_ana = ana_starts.last().copied().unwrap_or(0);
        let padded_len = last_ana + WIN_LEN + TOLERANCE + pad_left;
        let mut padded = vec![0.0; padded_len];
        for (i, &s) in samples.iter().enumerate() {
            padded[i + pad_left] = f64::from(s) / S16_SCALE;
        }

        let placements = Self::place_windows(&padded, &syn_starts, &ana_starts);

        let accumulator_len = output_length + 2 * WIN_LEN;
        let partials: Vec<WindowAccumulator> = placements
            .par_iter()
            .enumerate()
            .map(|(win, &(syn_start, ana_start))| {
                Self::process_window(
                    accumulator_len,
                    syn_start,
                    ana_start,
                    self.window[win],
                    &padded,
                )
            })
            .collect();
        // windows only read the shared padded input; their overlapping
        // contributions are combined here in window order, so the reduction
        // is deterministic across runs
        let combined = partials
            .iter()
            .fold(WindowAccumulator::zeroed(accumulator_len), |acc, t| {
                acc.merge(t)
            });

        // re-normalize by removing the accumulated window weights
        let mut output = combined.output;
        for (sample, &weight) in output.iter_mut().zip(&combined.weights) {
            let divisor = if weight < WEIGHT_EPSILON { 1.0 } else { weight };
            *sample /= divisor;
        }

        // unpad and convert back to 16-bit
        Ok(output[WIN_LEN_HALF..WIN_LEN_HALF + output_length]
            .iter()
            .map(|&d| (d * S16_SCALE).clamp(-32768.0, 32767.0) as i16)
            .collect())
    }

    /// Resolve each window's analysis start, carrying the cross-correlation
    /// alignment offset from one window into the next.
    fn place_windows(
        padded: &[f64],
        syn_starts: &[usize],
        ana_starts: &[usize],
    ) -> Vec<(usize, usize)> {
        let mut placements = Vec::with_capacity(syn_starts.len());
        let mut delta: isize = 0;
        for i in 0..syn_starts.len() {
            let ana_start = (ana_starts[i] as isize + delta + TOLERANCE as isize)
                .clamp(0, (padded.len() - WIN_LEN) as isize) as usize;
            placements.push((syn_starts[i], ana_start));

            if i + 1 < syn_starts.len() {
                // how the signal would continue past the current window
                let natural = &padded[ana_start + WIN_LEN_HALF..ana_start + WIN_LEN_HALF + WIN_LEN];
                // the next window's analysis region, widened by the search
                // span; for the first windows the region clips at the start
                // of the padding, shortening the searched span
                let next_lo = ana_starts[i + 1].saturating_sub(TOLERANCE);
                let next_hi = ana_starts[i + 1] + WIN_LEN + TOLERANCE;
                let next = &padded[next_lo..next_hi];
                let cc = cross_correlate(next, natural);
                delta = 1 - max_index(&cc) as isize;
            }
        }
        placements
    }

    /// One synthesis window's contribution, carried at the window's own
    /// table weight for every sample position.
    fn process_window(
        len: usize,
        syn_start: usize,
        ana_start: usize,
        weight: f64,
        padded: &[f64],
    ) -> WindowAccumulator {
        let mut result = WindowAccumulator::zeroed(len);
        for pos in 0..WIN_LEN {
            result.output[syn_start + pos] += padded[ana_start + pos] * weight;
            result.weights[syn_start + pos] += weight;
        }
        result
    }
}

impl SampleModifier for TimeStretcher {
    fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
        // samples here represent one beat
        if pattern_bit(&self.pattern, batch) {
            self.ola(samples, batch)
        } else {
            Ok(samples.to_vec())
        }
    }

    fn requested_time_ms(&self) -> u64 {
        millis_per_beat(self.bpm)
    }

    fn describe(&self) -> String {
        format!("Stretch[bpm={},pattern={}]", self.bpm, self.pattern)
    }
}

/// Cross-correlation of `u` against `v`, trimmed to the lag search span.
fn cross_correlate(u: &[f64], v: &[f64]) -> Vec<f64> {
    let reversed: Vec<f64> = u.iter().rev().copied().collect();
    conv(&reversed, v, WIN_LEN, WIN_LEN + 1)
}

/// Direct convolution of `u` and `v` with `start_chop`/`end_chop` output
/// elements trimmed, so the caller never copies the discarded lags.
fn conv(u: &[f64], v: &[f64], start_chop: usize, end_chop: usize) -> Vec<f64> {
    let m = u.len();
    let n = v.len();
    let full = m + n - 1;
    if full <= start_chop + end_chop {
        return vec![0.0];
    }
    let mut result = vec![0.0; full - (start_chop + end_chop)];
    for k in start_chop..start_chop + result.len() {
        let start = (k + 1).saturating_sub(n);
        let end = k.min(m - 1);
        let mut sum = 0.0;
        for j in start..=end {
            sum += u[j] * v[k - j];
        }
        result[k - start_chop] = sum;
    }
    result
}

/// Index of the largest element; ties resolve to the earliest.
fn max_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
