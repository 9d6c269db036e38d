//! Command-line surface
//!
//! One subcommand per modifier variant. The subcommand enum doubles as the
//! factory registry: [`Commands::build_modifier`] maps the parsed name and
//! options onto a configured [`SampleModifier`], failing fast on bad
//! options before any audio is read.

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::dsp::{
    BeatSwapper, Identity, MeasureReverser, PatternBeatDropper, PatternBeatReverser,
    PercentageBeatDropper, RandomBeatDropper, RandomSampleDropper, SampleModifier, TimeStretcher,
};
use crate::error::Result;

/// Beatmill - beat-sliced audio stream processor
#[derive(Parser, Debug)]
#[command(name = "beatmill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Stream arguments shared by every subcommand
#[derive(Args, Debug)]
pub struct IoArgs {
    /// Input WAV file; `-` reads from stdin
    pub input: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit raw interleaved 16-bit samples instead of a WAV container
    /// (stdout when no output file is given)
    #[arg(long)]
    pub raw: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pass the stream through unchanged
    Identity {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Keep only the leading percentage of every beat
    #[command(name = "percentage")]
    PercentageDrop {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Kept fraction of each beat, 0 to 100
        #[arg(short, long)]
        percentage: f64,
    },

    /// Drop beats according to a cycled 0/1 pattern
    #[command(name = "pattern-drop")]
    PatternDrop {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Pattern of 0 (drop) and 1 (keep), cycled by beat index
        #[arg(long)]
        pattern: String,
    },

    /// Drop a random subset of beats, decided from a seed
    #[command(name = "random-drop")]
    RandomDrop {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Chance of keeping each beat, 0 to 100
        #[arg(short, long)]
        percentage: f64,

        /// Seed for the per-beat decisions
        #[arg(short, long, default_value = "beatmill")]
        seed: String,
    },

    /// Drop a random subset of fixed-duration windows
    #[command(name = "random-sample")]
    RandomSample {
        #[command(flatten)]
        io: IoArgs,

        /// Window duration in milliseconds
        #[arg(long, default_value_t = 250)]
        sample_size: u64,

        /// Chance of keeping each window, 0 to 100
        #[arg(short, long)]
        percentage: f64,

        /// Seed for the per-window decisions
        #[arg(short, long, default_value = "beatmill")]
        seed: String,
    },

    /// Reverse the order of beats within each measure
    #[command(name = "reverse")]
    MeasureReverse {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Beats per measure
        #[arg(short, long, default_value_t = 4)]
        measure_size: usize,
    },

    /// Reorder the beats of each measure by a 1-based index pattern
    #[command(name = "swap")]
    BeatSwap {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Beats per measure
        #[arg(short, long, default_value_t = 4)]
        measure_size: usize,

        /// Colon-separated output beat order, e.g. 1:4:3:2
        #[arg(long)]
        pattern: String,
    },

    /// Reverse the samples of beats selected by a cycled 0/1 pattern
    #[command(name = "pattern-reverse")]
    PatternReverse {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Pattern of 0 (keep) and 1 (reverse), cycled by beat index
        #[arg(long)]
        pattern: String,
    },

    /// Stretch pattern-selected beats to double duration, keeping pitch
    #[command(name = "stretch")]
    Stretch {
        #[command(flatten)]
        io: IoArgs,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: u32,

        /// Pattern of 0 (pass) and 1 (stretch), cycled by beat index
        #[arg(long, default_value = "1")]
        pattern: String,
    },
}

impl Commands {
    /// The stream arguments of whichever subcommand was parsed
    pub fn io(&self) -> &IoArgs {
        match self {
            Commands::Identity { io } => io,
            Commands::PercentageDrop { io, .. } => io,
            Commands::PatternDrop { io, .. } => io,
            Commands::RandomDrop { io, .. } => io,
            Commands::RandomSample { io, .. } => io,
            Commands::MeasureReverse { io, .. } => io,
            Commands::BeatSwap { io, .. } => io,
            Commands::PatternReverse { io, .. } => io,
            Commands::Stretch { io, .. } => io,
        }
    }

    /// Build the configured modifier, validating every option up front
    pub fn build_modifier(&self) -> Result<Arc<dyn SampleModifier>> {
        Ok(match self {
            Commands::Identity { .. } => Arc::new(Identity::new()),
            Commands::PercentageDrop {
                bpm, percentage, ..
            } => Arc::new(PercentageBeatDropper::new(*bpm, *percentage)?),
            Commands::PatternDrop { bpm, pattern, .. } => {
                Arc::new(PatternBeatDropper::new(*bpm, pattern)?)
            }
            Commands::RandomDrop {
                bpm,
                percentage,
                seed,
                ..
            } => Arc::new(RandomBeatDropper::new(*bpm, *percentage, seed)?),
            Commands::RandomSample {
                sample_size,
                percentage,
                seed,
                ..
            } => Arc::new(RandomSampleDropper::new(*sample_size, *percentage, seed)?),
            Commands::MeasureReverse {
                bpm, measure_size, ..
            } => Arc::new(MeasureReverser::new(*bpm, *measure_size)?),
            Commands::BeatSwap {
                bpm,
                measure_size,
                pattern,
                ..
            } => Arc::new(BeatSwapper::new(*bpm, *measure_size, pattern)?),
            Commands::PatternReverse { bpm, pattern, .. } => {
                Arc::new(PatternBeatReverser::new(*bpm, pattern)?)
            }
            Commands::Stretch { bpm, pattern, .. } => {
                Arc::new(TimeStretcher::new(*bpm, pattern)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_swap_command_builds_modifier() {
        let cli = parse(&[
            "beatmill", "swap", "in.wav", "-o", "out.wav", "--bpm", "128", "--pattern", "1:4:3:2",
        ]);
        let modifier = cli.command.build_modifier().unwrap();
        assert_eq!(modifier.describe(), "Swap[bpm=128,msize=4,pattern=1:4:3:2]");
        assert!(!cli.command.io().raw);
    }

    #[test]
    fn test_invalid_options_fail_at_build() {
        let cli = parse(&[
            "beatmill", "swap", "in.wav", "--bpm", "128", "--pattern", "1:9",
        ]);
        assert!(cli.command.build_modifier().is_err());

        let cli = parse(&[
            "beatmill",
            "percentage",
            "in.wav",
            "--bpm",
            "120",
            "--percentage",
            "150",
        ]);
        assert!(cli.command.build_modifier().is_err());
    }

    #[test]
    fn test_stdin_marker_and_raw_flag() {
        let cli = parse(&["beatmill", "identity", "-", "--raw"]);
        let io = cli.command.io();
        assert_eq!(io.input.as_os_str(), "-");
        assert!(io.raw);
        assert!(io.output.is_none());
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["beatmill", "wobble", "in.wav"]).is_err());
    }
}
