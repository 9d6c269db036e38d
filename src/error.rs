//! Error handling for Beatmill
//!
//! Every error surfaces to the top-level run and terminates it; there is no
//! local recovery and no retry anywhere in the pipeline.

use thiserror::Error;

/// Result type alias for Beatmill operations
pub type Result<T> = std::result::Result<T, BeatmillError>;

/// Main error type for Beatmill operations
#[derive(Error, Debug)]
pub enum BeatmillError {
    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Percentage out of range: {value} (must be within [0, 100])")]
    PercentageOutOfRange { value: f64 },

    // Stream Errors
    #[error("Invalid audio input: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Processing Errors
    #[error("Processing error in batch {batch}: {reason}")]
    Processing { batch: usize, reason: String },

    #[error("Channel length mismatch in batch {batch}: left {left} != right {right}")]
    ChannelMismatch {
        batch: usize,
        left: usize,
        right: usize,
    },

    #[error("Pipeline worker disappeared before delivering batch {batch}")]
    WorkerLost { batch: usize },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BeatmillError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BeatmillError::Config { .. } => "CONFIG",
            BeatmillError::InvalidPattern { .. } => "INVALID_PATTERN",
            BeatmillError::PercentageOutOfRange { .. } => "PERCENTAGE_OUT_OF_RANGE",
            BeatmillError::InvalidAudio { .. } => "INVALID_AUDIO",
            BeatmillError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            BeatmillError::Processing { .. } => "PROCESSING",
            BeatmillError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            BeatmillError::WorkerLost { .. } => "WORKER_LOST",
            BeatmillError::Io(_) => "IO_ERROR",
        }
    }

    /// Check whether this error was detected before any audio was processed
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BeatmillError::Config { .. }
                | BeatmillError::InvalidPattern { .. }
                | BeatmillError::PercentageOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BeatmillError::InvalidPattern {
            pattern: "1:9".to_string(),
            reason: "index out of range".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_PATTERN");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_channel_mismatch_display() {
        let err = BeatmillError::ChannelMismatch {
            batch: 3,
            left: 100,
            right: 99,
        };
        assert!(err.to_string().contains("batch 3"));
        assert!(!err.is_configuration());
    }
}
