//! Stream plumbing
//!
//! Everything between the codec boundary and the per-batch transforms:
//! format negotiation, batch segmentation, the concurrent pipeline, and the
//! WAV container boundary itself.

pub mod batch;
pub mod codec;
pub mod format;
pub mod pipeline;
pub mod segmenter;

pub use batch::Batch;
pub use codec::{WavDecoder, WavEncoder};
pub use format::{ChannelLayout, Endianness, Format, SampleFormat};
pub use pipeline::{process, PipelineStats};
pub use segmenter::BatchReader;
