//! Batch segmentation
//!
//! Reads a byte-oriented sample source into fixed-length stereo batches.
//! Each batch gets freshly allocated, exact-sized channel buffers, so a
//! short final batch can never expose stale samples from a previous read.

use std::io::Read;

use crate::engine::format::{Endianness, Format};
use crate::engine::Batch;
use crate::error::Result;

/// Lazily yields [`Batch`] values of `batch_len` frames from an interleaved
/// 16-bit stereo byte stream. The last batch may be shorter; a trailing
/// partial frame (fewer bytes than one L/R pair) is discarded.
pub struct BatchReader<R> {
    source: R,
    batch_len: usize,
    endianness: Endianness,
    next_index: usize,
    finished: bool,
}

impl<R: Read> BatchReader<R> {
    /// Create a reader producing batches of `batch_len` frames.
    ///
    /// `batch_len` is derived from the active modifier's requested time
    /// window and the stream's frame rate; it must be positive.
    pub fn new(source: R, format: &Format, batch_len: usize) -> Self {
        debug_assert!(batch_len > 0, "batch length must be positive");
        Self {
            source,
            batch_len,
            endianness: format.endianness,
            next_index: 0,
            finished: false,
        }
    }

    /// Read until `buf` is full or the source is exhausted, returning the
    /// number of bytes read. Interrupted reads are retried.
    fn read_full(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn read_batch(&mut self) -> Result<Option<Batch>> {
        let mut bytes = vec![0u8; self.batch_len * 4];
        let filled = self.read_full(&mut bytes)?;
        let frames = filled / 4;
        if frames == 0 {
            self.finished = true;
            return Ok(None);
        }
        if frames < self.batch_len {
            self.finished = true;
        }

        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in bytes[..frames * 4].chunks_exact(4) {
            let (l, r) = match self.endianness {
                Endianness::Little => (
                    i16::from_le_bytes([frame[0], frame[1]]),
                    i16::from_le_bytes([frame[2], frame[3]]),
                ),
                Endianness::Big => (
                    i16::from_be_bytes([frame[0], frame[1]]),
                    i16::from_be_bytes([frame[2], frame[3]]),
                ),
            };
            left.push(l);
            right.push(r);
        }

        let batch = Batch::new(self.next_index, left, right)?;
        self.next_index += 1;
        Ok(Some(batch))
    }
}

impl<R: Read> Iterator for BatchReader<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
