//! WAV codec boundary
//!
//! The external codec collaborator. [`WavDecoder`] validates a WAV
//! container, negotiates the sample rate, and exposes the audio data as a
//! raw byte stream of interleaved little-endian 16-bit stereo samples.
//! [`WavEncoder`] consumes the same byte convention and writes it back into
//! a container. Resampling and non-WAV containers live outside this crate.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat as WavSampleFormat, WavIntoSamples, WavReader, WavSpec, WavWriter};

use crate::engine::format::Format;
use crate::error::{BeatmillError, Result};

fn wav_io_error(e: hound::Error) -> std::io::Error {
    match e {
        hound::Error::IoError(io) => io,
        other => std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
    }
}

/// Streaming WAV decoder.
///
/// Validates the header on construction (16-bit integer stereo PCM only)
/// and then acts as a [`Read`] of raw interleaved sample bytes, so the
/// segmenter never sees the container.
pub struct WavDecoder<R: Read> {
    samples: WavIntoSamples<BufReader<R>, i16>,
    format: Format,
    /// Second byte of a sample split across `read` calls
    carry: Option<u8>,
}

impl<R: Read> std::fmt::Debug for WavDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavDecoder")
            .field("samples", &"<WavIntoSamples>")
            .field("format", &self.format)
            .field("carry", &self.carry)
            .finish()
    }
}

impl<R: Read> WavDecoder<R> {
    pub fn new(source: R) -> Result<Self> {
        let reader =
            WavReader::new(BufReader::new(source)).map_err(|e| BeatmillError::InvalidAudio {
                reason: format!("failed to read WAV header: {e}"),
                source: Some(Box::new(e)),
            })?;

        let spec = reader.spec();
        if spec.channels != 2 {
            return Err(BeatmillError::UnsupportedFormat {
                format: format!("{}-channel audio (stereo input required)", spec.channels),
            });
        }
        if spec.bits_per_sample != 16 || spec.sample_format != WavSampleFormat::Int {
            return Err(BeatmillError::UnsupportedFormat {
                format: format!(
                    "{}-bit {} samples (16-bit integer PCM required)",
                    spec.bits_per_sample,
                    match spec.sample_format {
                        WavSampleFormat::Int => "integer",
                        WavSampleFormat::Float => "float",
                    }
                ),
            });
        }

        let format = Format::stereo_s16(spec.sample_rate)?;
        Ok(Self {
            samples: reader.into_samples(),
            format,
            carry: None,
        })
    }

    /// The negotiated stream format
    pub fn format(&self) -> &Format {
        &self.format
    }
}

impl<R: Read> Read for WavDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut filled = 0;
        if let Some(byte) = self.carry.take() {
            buf[filled] = byte;
            filled += 1;
        }
        while filled < buf.len() {
            match self.samples.next() {
                Some(Ok(sample)) => {
                    let bytes = sample.to_le_bytes();
                    buf[filled] = bytes[0];
                    filled += 1;
                    if filled < buf.len() {
                        buf[filled] = bytes[1];
                        filled += 1;
                    } else {
                        self.carry = Some(bytes[1]);
                    }
                }
                Some(Err(e)) => return Err(wav_io_error(e)),
                None => break,
            }
        }
        Ok(filled)
    }
}

/// Streaming WAV encoder.
///
/// A [`Write`] sink for raw interleaved little-endian 16-bit sample bytes;
/// pairs are handed to the container writer as they complete. Call
/// [`WavEncoder::finalize`] to patch up the RIFF sizes, which is why
/// container output needs a seekable sink.
pub struct WavEncoder<W: Write + Seek> {
    writer: WavWriter<W>,
    /// First byte of a sample split across `write` calls
    carry: Option<u8>,
}

impl WavEncoder<BufWriter<File>> {
    /// Create an encoder writing a container file at `path`
    pub fn create(path: &Path, format: &Format) -> Result<Self> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec).map_err(|e| BeatmillError::InvalidAudio {
            reason: format!("failed to create WAV output: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            writer,
            carry: None,
        })
    }
}

impl<W: Write + Seek> WavEncoder<W> {
    /// Create an encoder over an arbitrary seekable sink
    pub fn new(sink: W, format: &Format) -> Result<Self> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        };
        let writer = WavWriter::new(sink, spec).map_err(|e| BeatmillError::InvalidAudio {
            reason: format!("failed to create WAV output: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            writer,
            carry: None,
        })
    }

    /// Finish the container. A trailing half-written sample byte, if any,
    /// is discarded.
    pub fn finalize(self) -> Result<()> {
        self.writer
            .finalize()
            .map_err(|e| BeatmillError::Io(wav_io_error(e)))
    }
}

impl<W: Write + Seek> Write for WavEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut data = buf;
        if let Some(first) = self.carry.take() {
            if let Some((&second, rest)) = data.split_first() {
                self.writer
                    .write_sample(i16::from_le_bytes([first, second]))
                    .map_err(wav_io_error)?;
                data = rest;
            } else {
                self.carry = Some(first);
                return Ok(0);
            }
        }
        for pair in data.chunks_exact(2) {
            self.writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(wav_io_error)?;
        }
        if let [last] = data.chunks_exact(2).remainder() {
            self.carry = Some(*last);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush().map_err(wav_io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn stereo_wav(sample_rate: u32, interleaved: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &s in interleaved {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decoder_negotiates_format_and_streams_bytes() {
        let interleaved = [100i16, -100, 200, -200, 300, -300];
        let wav = stereo_wav(22050, &interleaved);

        let mut decoder = WavDecoder::new(Cursor::new(wav)).unwrap();
        assert_eq!(decoder.format().sample_rate, 22050);

        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, sample_bytes(&interleaved));
    }

    #[test]
    fn test_decoder_survives_tiny_reads() {
        let interleaved = [1i16, 2, 3, 4];
        let wav = stereo_wav(44100, &interleaved);
        let mut decoder = WavDecoder::new(Cursor::new(wav)).unwrap();

        // one byte at a time forces the carry path
        let mut bytes = Vec::new();
        let mut one = [0u8; 1];
        loop {
            match decoder.read(&mut one).unwrap() {
                0 => break,
                n => bytes.extend_from_slice(&one[..n]),
            }
        }
        assert_eq!(bytes, sample_bytes(&interleaved));
    }

    #[test]
    fn test_decoder_rejects_mono() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let err = WavDecoder::new(Cursor::new(cursor.into_inner())).unwrap_err();
        assert!(matches!(err, BeatmillError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decoder_rejects_wrong_bit_depth() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 24,
            sample_format: WavSampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0i32).unwrap();
        writer.write_sample(0i32).unwrap();
        writer.finalize().unwrap();

        let err = WavDecoder::new(Cursor::new(cursor.into_inner())).unwrap_err();
        assert!(matches!(err, BeatmillError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decoder_rejects_garbage() {
        let err = WavDecoder::new(Cursor::new(b"not a wav file".to_vec())).unwrap_err();
        assert!(matches!(err, BeatmillError::InvalidAudio { .. }));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let format = Format::stereo_s16(48000).unwrap();
        let interleaved = [7i16, -7, 12000, -12000];

        let mut cursor = Cursor::new(Vec::new());
        let mut encoder = WavEncoder::new(&mut cursor, &format).unwrap();
        encoder.write_all(&sample_bytes(&interleaved)).unwrap();
        encoder.finalize().unwrap();

        let mut decoder = WavDecoder::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(decoder.format().sample_rate, 48000);
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, sample_bytes(&interleaved));
    }

    #[test]
    fn test_encoder_reassembles_split_samples() {
        let format = Format::stereo_s16(44100).unwrap();
        let bytes = sample_bytes(&[258i16, -2]);

        let mut cursor = Cursor::new(Vec::new());
        let mut encoder = WavEncoder::new(&mut cursor, &format).unwrap();
        for byte in &bytes {
            encoder.write_all(std::slice::from_ref(byte)).unwrap();
        }
        encoder.finalize().unwrap();

        let mut decoder = WavDecoder::new(Cursor::new(cursor.into_inner())).unwrap();
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, bytes);
    }
}
