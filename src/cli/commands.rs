//! Command execution
//!
//! Opens the codec streams for the parsed command, builds its modifier, and
//! drives the pipeline. All configuration errors surface here before the
//! first batch is read.

use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

use log::info;

use crate::cli::{Cli, IoArgs};
use crate::dsp::SampleModifier;
use crate::engine::codec::{WavDecoder, WavEncoder};
use crate::engine::pipeline::{self, PipelineStats};
use crate::error::{BeatmillError, Result};

/// Run the parsed command to completion
pub fn run(cli: &Cli) -> Result<PipelineStats> {
    let modifier = cli.command.build_modifier()?;
    let io_args = cli.command.io();
    info!("modifier: {}", modifier.describe());

    let stats = if io_args.input.as_os_str() == "-" {
        run_streams(io::stdin(), io_args, modifier)?
    } else {
        run_streams(File::open(&io_args.input)?, io_args, modifier)?
    };

    info!(
        "wrote {} frames across {} batches",
        stats.frames_out, stats.batches
    );
    Ok(stats)
}

fn run_streams<R: Read + Send>(
    source: R,
    io_args: &IoArgs,
    modifier: Arc<dyn SampleModifier>,
) -> Result<PipelineStats> {
    let decoder = WavDecoder::new(source)?;
    let format = *decoder.format();
    info!("input: {} Hz, 16-bit stereo", format.sample_rate);

    match (&io_args.output, io_args.raw) {
        (Some(path), false) => {
            let mut encoder = WavEncoder::create(path, &format)?;
            let stats = pipeline::process(decoder, &mut encoder, &format, modifier)?;
            encoder.finalize()?;
            Ok(stats)
        }
        (Some(path), true) => pipeline::process(decoder, File::create(path)?, &format, modifier),
        (None, true) => pipeline::process(decoder, io::stdout().lock(), &format, modifier),
        (None, false) => Err(BeatmillError::Config {
            reason: "container output needs --output; pass --raw to stream raw samples to stdout"
                .to_string(),
        }),
    }
}
