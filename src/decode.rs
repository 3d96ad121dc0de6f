//! Audio decoding
//!
//! [`SymphoniaDecoder`] turns any container symphonia understands (WAV, FLAC,
//! MP3, OGG/Vorbis, ...) into an interleaved `f32` [`SampleBuffer`]. The
//! analyzer only sees the [`AudioDecoder`] trait, so tests can hand it
//! synthetic buffers instead of files.

use crate::error::{AnalysisError, DecodeError};
use log::debug;
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Fully decoded audio: interleaved samples plus their layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

impl SampleBuffer {
    /// `None` when the sample rate or channel count is zero, or the sample
    /// count isn't a whole number of frames.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Option<Self> {
        if sample_rate == 0 || channels == 0 || samples.len() % channels != 0 {
            return None;
        }
        Some(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn interleaved(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// De-interleave one channel (zero-based) into `f64`.
    pub fn channel(&self, index: usize) -> Result<Vec<f64>, AnalysisError> {
        if index >= self.channels {
            return Err(AnalysisError::ChannelOutOfRange {
                channel: index,
                channels: self.channels,
            });
        }
        Ok(self
            .samples
            .iter()
            .skip(index)
            .step_by(self.channels)
            .map(|&s| s as f64)
            .collect())
    }
}

/// Anything that can turn a file into samples.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<SampleBuffer, DecodeError>;
}

/// Decoder backed by symphonia's default codec and format registries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<SampleBuffer, DecodeError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::UnsupportedContainer(e.to_string()))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::UnsupportedContainer("no decodable audio track".to_string()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedContainer(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut pcm: Option<PcmBuffer<f32>> = None;
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(DecodeError::CorruptFile(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(_)) => {
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(DecodeError::CorruptFile(e.to_string())),
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count();

            // Packets may grow; reallocate whenever the current buffer is too small
            let needed = decoded.capacity() * channels;
            if pcm.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                pcm = Some(PcmBuffer::new(decoded.capacity() as u64, spec));
            }

            if let Some(buf) = pcm.as_mut() {
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
        }

        if skipped_packets > 0 {
            debug!("{}: skipped {} undecodable packets", path.display(), skipped_packets);
        }

        if samples.is_empty() {
            return Err(DecodeError::CorruptFile("stream contains no audio samples".to_string()));
        }

        debug!(
            "{}: decoded {} samples, {} Hz, {} channel(s)",
            path.display(),
            samples.len(),
            sample_rate,
            channels
        );

        SampleBuffer::new(samples, sample_rate, channels)
            .ok_or_else(|| DecodeError::CorruptFile("inconsistent sample layout".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_buffer_layout() {
        let buffer = SampleBuffer::new(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 48000, 2).unwrap();
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.channels(), 2);
        assert!((buffer.duration_secs() - 3.0 / 48000.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_buffer_rejects_bad_layout() {
        assert!(SampleBuffer::new(vec![0.0; 4], 0, 1).is_none());
        assert!(SampleBuffer::new(vec![0.0; 4], 44100, 0).is_none());
        assert!(SampleBuffer::new(vec![0.0; 5], 44100, 2).is_none());
    }

    #[test]
    fn test_channel_deinterleave() {
        let buffer = SampleBuffer::new(vec![1.0, -1.0, 0.5, -0.5], 8000, 2).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), vec![1.0, 0.5]);
        assert_eq!(buffer.channel(1).unwrap(), vec![-1.0, -0.5]);
    }

    #[test]
    fn test_channel_out_of_range() {
        let buffer = SampleBuffer::new(vec![0.0; 4], 8000, 2).unwrap();
        assert!(matches!(
            buffer.channel(2),
            Err(AnalysisError::ChannelOutOfRange { channel: 2, channels: 2 })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SymphoniaDecoder.decode(Path::new("/no/such/file.wav"));
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"this is not a riff file at all").unwrap();
        assert!(matches!(
            SymphoniaDecoder.decode(&path),
            Err(DecodeError::UnsupportedContainer(_))
        ));
    }
}
