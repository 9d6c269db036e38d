//! Beatmill - beat-sliced audio stream processor
//!
//! Beatmill slices a 16-bit stereo PCM stream into fixed-size batches,
//! applies a configurable per-batch transformation (drop, reorder, reverse,
//! swap, time-stretch), and reassembles the output in strict input order
//! while overlapping I/O with computation.
//!
//! # Architecture
//!
//! - `engine`: codec boundary, batch segmentation, and the concurrent
//!   pipeline that decouples completion order from output order
//! - `dsp`: the [`dsp::SampleModifier`] trait and its variants, including
//!   the overlap-add time-stretch engine
//! - `cli`: one subcommand per modifier variant

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;

pub use error::{BeatmillError, Result};
