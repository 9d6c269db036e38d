//! Window functions
//!
//! Shared by the time-stretch engine. Values are memoized in a process-wide
//! concurrent cache keyed by `(function, index, length)`; window values are
//! pure, so concurrent inserts of the same key are harmless.

use std::f64::consts::PI;
use std::sync::OnceLock;

use dashmap::DashMap;

static CACHE: OnceLock<DashMap<(WindowFunction, u32, u32), f64>> = OnceLock::new();

/// Standard analysis/synthesis window shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFunction {
    Hann,
    Hamming,
}

impl WindowFunction {
    /// Window value at position `i` of an `nn`-point window
    pub fn value(&self, i: usize, nn: usize) -> f64 {
        let cache = CACHE.get_or_init(DashMap::new);
        *cache
            .entry((*self, i as u32, nn as u32))
            .or_insert_with(|| self.compute(i, nn))
    }

    fn compute(&self, i: usize, nn: usize) -> f64 {
        let phase = 2.0 * PI * i as f64 / (nn - 1) as f64;
        match self {
            WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
            WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
        }
    }

    /// Multiply `data` pointwise by this window
    pub fn window(&self, data: &[f64]) -> Vec<f64> {
        let nn = data.len();
        data.iter()
            .enumerate()
            .map(|(i, &v)| v * self.value(i, nn))
            .collect()
    }

    /// The window applied twice to a unit signal: `w(i)^2` for an `nn`-point
    /// window. This is the weight table the overlap-add engine uses.
    pub fn squared(&self, nn: usize) -> Vec<f64> {
        self.window(&self.window(&vec![1.0; nn]))
    }
}
