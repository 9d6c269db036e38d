//! Batch type for pipeline processing
//!
//! A batch is one fixed-size slice of the stream, split into left/right
//! channel buffers. Buffers are always exactly as long as the data they
//! hold; the final batch of a stream may be shorter than the configured
//! batch length.

use crate::error::{BeatmillError, Result};

/// One unit of pipeline work: equal-length left and right channel samples
/// plus the batch's position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position in submission order, starting at 0
    pub index: usize,
    pub left: Vec<i16>,
    pub right: Vec<i16>,
}

impl Batch {
    /// Create a batch, checking the channel-length invariant
    pub fn new(index: usize, left: Vec<i16>, right: Vec<i16>) -> Result<Self> {
        if left.len() != right.len() {
            return Err(BeatmillError::ChannelMismatch {
                batch: index,
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Self { index, left, right })
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}
