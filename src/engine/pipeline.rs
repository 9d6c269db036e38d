//! Concurrent batch pipeline
//!
//! Decouples batch production order from transformation completion order
//! while keeping the output stream in production order. The segmenter runs
//! on its own thread so batch `i + 1` is being read while batch `i` is
//! still being transformed; each batch's transformation is dispatched to a
//! worker pool, and the gatherer awaits results strictly in submission
//! order.

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver};
use log::{debug, info};
use rayon::ThreadPoolBuilder;

use crate::dsp::SampleModifier;
use crate::engine::format::{Endianness, Format};
use crate::engine::segmenter::BatchReader;
use crate::engine::Batch;
use crate::error::{BeatmillError, Result};

/// Extra pool threads beyond the processor count, absorbing scheduling
/// stalls while the segmenter or serializer holds a worker up
const WORKER_HEADROOM: usize = 8;

/// Upper bound on pool size regardless of processor count
const WORKER_CAP: usize = 32;

/// Counters reported after a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub batches: usize,
    pub frames_out: usize,
}

fn worker_count() -> usize {
    let processors = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    (processors + WORKER_HEADROOM).min(WORKER_CAP)
}

/// Run the full pipeline: segment `source` into batches sized by the
/// modifier's requested time window, transform them concurrently, and write
/// the results to `sink` in input order.
///
/// `source` and `sink` carry raw interleaved 16-bit stereo samples in the
/// format's declared endianness. The first error anywhere in the run (read,
/// transform, or write) aborts it; output written before the failure is not
/// rolled back.
pub fn process<R, W>(
    source: R,
    sink: W,
    format: &Format,
    modifier: Arc<dyn SampleModifier>,
) -> Result<PipelineStats>
where
    R: Read + Send,
    W: Write,
{
    let batch_len = format.frames_for_millis(modifier.requested_time_ms());
    if batch_len == 0 {
        return Err(BeatmillError::Config {
            reason: format!(
                "requested time window of {} ms is shorter than one frame",
                modifier.requested_time_ms()
            ),
        });
    }

    let workers = worker_count();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("beatmill-worker-{i}"))
        .build()
        .map_err(|e| BeatmillError::Config {
            reason: format!("failed to build worker pool: {e}"),
        })?;
    debug!("pipeline: batch length {batch_len} frames, {workers} workers");

    // Bounded queue of per-batch result receivers. The bound is the
    // backpressure: when transformation falls behind segmentation, the
    // reader blocks here instead of queueing unbounded batches.
    let (pending_tx, pending_rx) = bounded::<Receiver<Result<Batch>>>(workers * 2);

    thread::scope(|scope| {
        let pool = &pool;
        scope.spawn(move || {
            let reader = BatchReader::new(source, format, batch_len);
            for read in reader {
                let (result_tx, result_rx) = bounded(1);
                match read {
                    Ok(batch) => {
                        // the task owns its batch outright; nothing is
                        // shared with the next read
                        let modifier = Arc::clone(&modifier);
                        pool.spawn(move || {
                            let _ = result_tx.send(transform(modifier.as_ref(), batch));
                        });
                    }
                    Err(e) => {
                        let _ = result_tx.send(Err(e));
                    }
                }
                if pending_tx.send(result_rx).is_err() {
                    // gatherer gave up; stop segmenting
                    return;
                }
            }
        });

        gather(pending_rx, sink, format.endianness)
    })
}

fn transform(modifier: &dyn SampleModifier, batch: Batch) -> Result<Batch> {
    let index = batch.index;
    let frames_in = batch.len();
    let left = modifier.modify_samples(&batch.left, index)?;
    let right = modifier.modify_samples(&batch.right, index)?;
    debug!("batch {index}: {frames_in} -> {} frames", left.len());
    Batch::new(index, left, right)
}

/// Collect transformed batches strictly in submission order and serialize
/// them as interleaved frames.
fn gather<W: Write>(
    pending: Receiver<Receiver<Result<Batch>>>,
    mut sink: W,
    endianness: Endianness,
) -> Result<PipelineStats> {
    let mut stats = PipelineStats::default();
    for result_rx in pending.iter() {
        let batch = result_rx
            .recv()
            .map_err(|_| BeatmillError::WorkerLost {
                batch: stats.batches,
            })??;
        if batch.left.len() != batch.right.len() {
            return Err(BeatmillError::ChannelMismatch {
                batch: batch.index,
                left: batch.left.len(),
                right: batch.right.len(),
            });
        }
        write_frames(&mut sink, &batch, endianness)?;
        stats.batches += 1;
        stats.frames_out += batch.len();
    }
    sink.flush()?;
    info!(
        "pipeline complete: {} batches, {} frames out",
        stats.batches, stats.frames_out
    );
    Ok(stats)
}

fn write_frames<W: Write>(sink: &mut W, batch: &Batch, endianness: Endianness) -> Result<()> {
    let mut bytes = Vec::with_capacity(batch.len() * 4);
    for (&l, &r) in batch.left.iter().zip(&batch.right) {
        match endianness {
            Endianness::Little => {
                bytes.extend_from_slice(&l.to_le_bytes());
                bytes.extend_from_slice(&r.to_le_bytes());
            }
            Endianness::Big => {
                bytes.extend_from_slice(&l.to_be_bytes());
                bytes.extend_from_slice(&r.to_be_bytes());
            }
        }
    }
    sink.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Identity, SampleModifier};
    use crate::error::BeatmillError;
    use std::io::Cursor;
    use std::time::Duration;

    fn interleave_le(frames: &[(i16, i16)]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(frames.len() * 4);
        for &(l, r) in frames {
            bytes.extend_from_slice(&l.to_le_bytes());
            bytes.extend_from_slice(&r.to_le_bytes());
        }
        bytes
    }

    /// Tags each batch with its index and stalls for a pseudo-random time,
    /// so completion order scrambles while output order must not.
    struct JitterTag;

    impl SampleModifier for JitterTag {
        fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
            // pseudo-random latency per batch, up to ~20ms
            let stall = (batch.wrapping_mul(2654435761) >> 16) % 20;
            std::thread::sleep(Duration::from_millis(stall as u64));
            Ok(samples.iter().map(|_| batch as i16).collect())
        }

        fn requested_time_ms(&self) -> u64 {
            1000
        }

        fn describe(&self) -> String {
            "JitterTag".to_string()
        }
    }

    struct FailOnBatch(usize);

    impl SampleModifier for FailOnBatch {
        fn modify_samples(&self, samples: &[i16], batch: usize) -> Result<Vec<i16>> {
            if batch == self.0 {
                Err(BeatmillError::Processing {
                    batch,
                    reason: "synthetic failure".to_string(),
                })
            } else {
                Ok(samples.to_vec())
            }
        }

        fn requested_time_ms(&self) -> u64 {
            1000
        }

        fn describe(&self) -> String {
            format!("FailOnBatch[{}]", self.0)
        }
    }

    fn format_1khz() -> Format {
        // 1 kHz keeps test batch sizes tiny: 1000 ms window = 1000 frames
        Format::stereo_s16(1000).unwrap()
    }

    #[test]
    fn test_identity_roundtrip() {
        let frames: Vec<(i16, i16)> = (0..2500).map(|i| (i as i16, -(i as i16))).collect();
        let input = interleave_le(&frames);
        let mut output = Vec::new();

        let stats = process(
            Cursor::new(input.clone()),
            &mut output,
            &format_1khz(),
            Arc::new(Identity::new()),
        )
        .unwrap();

        assert_eq!(stats.batches, 3); // 1000 + 1000 + 500
        assert_eq!(stats.frames_out, 2500);
        assert_eq!(output, input);
    }

    #[test]
    fn test_output_order_matches_submission_order() {
        // 40 batches with scrambled completion latency
        let frames: Vec<(i16, i16)> = (0..40_000).map(|_| (0, 0)).collect();
        let input = interleave_le(&frames);
        let mut output = Vec::new();

        let stats = process(
            Cursor::new(input),
            &mut output,
            &format_1khz(),
            Arc::new(JitterTag),
        )
        .unwrap();
        assert_eq!(stats.batches, 40);

        // every frame of batch k must carry tag k, in order
        for (frame_idx, frame) in output.chunks_exact(4).enumerate() {
            let tag = i16::from_le_bytes([frame[0], frame[1]]);
            let expected = (frame_idx / 1000) as i16;
            assert_eq!(tag, expected, "frame {frame_idx} out of order");
        }
    }

    #[test]
    fn test_modifier_failure_aborts_run() {
        let frames: Vec<(i16, i16)> = (0..5000).map(|_| (1, 1)).collect();
        let input = interleave_le(&frames);
        let mut output = Vec::new();

        let err = process(
            Cursor::new(input),
            &mut output,
            &format_1khz(),
            Arc::new(FailOnBatch(2)),
        )
        .unwrap_err();
        assert!(matches!(err, BeatmillError::Processing { batch: 2, .. }));
    }

    #[test]
    fn test_empty_input() {
        let mut output = Vec::new();
        let stats = process(
            Cursor::new(Vec::new()),
            &mut output,
            &format_1khz(),
            Arc::new(Identity::new()),
        )
        .unwrap();
        assert_eq!(stats.batches, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_dropping_modifier_shrinks_stream() {
        use crate::dsp::PatternBeatDropper;

        let frames: Vec<(i16, i16)> = (0..4000).map(|i| (i as i16, i as i16)).collect();
        let input = interleave_le(&frames);
        let mut output = Vec::new();

        let modifier = Arc::new(PatternBeatDropper::new(60, "10").unwrap());
        let stats = process(Cursor::new(input), &mut output, &format_1khz(), modifier).unwrap();

        assert_eq!(stats.batches, 4);
        // batches 0 and 2 kept, 1 and 3 dropped
        assert_eq!(stats.frames_out, 2000);
        assert_eq!(output.len(), 2000 * 4);
    }

    #[test]
    fn test_window_shorter_than_one_frame_rejected() {
        struct TinyWindow;
        impl SampleModifier for TinyWindow {
            fn modify_samples(&self, samples: &[i16], _batch: usize) -> Result<Vec<i16>> {
                Ok(samples.to_vec())
            }
            fn requested_time_ms(&self) -> u64 {
                0
            }
            fn describe(&self) -> String {
                "TinyWindow".to_string()
            }
        }

        let err = process(
            Cursor::new(vec![0u8; 8]),
            &mut Vec::new(),
            &format_1khz(),
            Arc::new(TinyWindow),
        )
        .unwrap_err();
        assert!(matches!(err, BeatmillError::Config { .. }));
    }
}
