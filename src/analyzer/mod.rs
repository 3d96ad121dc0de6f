//! Analysis pipeline
//!
//! One file goes through three steps, all synchronous:
//!
//! ```text
//! path ──► AudioDecoder ──► one channel ──► SpectralProfiler ──► rolloff Hz
//!   │                                                               │
//!   └──► BitrateReader (MP3 only) ──► bitrate ──► Classifier ◄──────┘
//!                                                    │
//!                                                    ▼
//!                                                 Verdict
//! ```
//!
//! The decoder and bitrate reader are traits so tests (and other front ends)
//! can swap them out. An [`Analyzer`] holds no mutable state and can be
//! shared across threads.

pub mod expectation;
pub mod spectral;

pub use expectation::{Classifier, ContainerFormat, ExpectationRow, ExpectationTable, Verdict};
pub use spectral::{RolloffEstimate, SpectralProfiler, Spectrogram};

use crate::config::AnalysisConfig;
use crate::decode::{AudioDecoder, SampleBuffer, SymphoniaDecoder};
use crate::error::AnalysisError;
use crate::mp3::{BitrateReader, Mp3BitrateReader};
use log::debug;
use std::path::Path;

/// Main analyzer: decode, profile, classify.
#[derive(Debug, Clone)]
pub struct Analyzer<D = SymphoniaDecoder, R = Mp3BitrateReader> {
    decoder: D,
    bitrate_reader: R,
    channel: usize,
    profiler: SpectralProfiler,
    classifier: Classifier,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Analyzer with the symphonia decoder, the MP3 frame reader and default settings.
    pub fn new() -> Self {
        Self::with_collaborators(SymphoniaDecoder, Mp3BitrateReader)
    }
}

impl<D: AudioDecoder, R: BitrateReader> Analyzer<D, R> {
    pub fn with_collaborators(decoder: D, bitrate_reader: R) -> Self {
        let config = AnalysisConfig::default();
        Self {
            decoder,
            bitrate_reader,
            channel: config.channel,
            profiler: config.profiler(),
            classifier: config.classifier(),
        }
    }

    /// Apply every setting from `config`.
    pub fn with_config(mut self, config: &AnalysisConfig) -> Self {
        self.channel = config.channel;
        self.profiler = config.profiler();
        self.classifier = config.classifier();
        self
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_profiler(mut self, profiler: SpectralProfiler) -> Self {
        self.profiler = profiler;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn profiler(&self) -> &SpectralProfiler {
        &self.profiler
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Analyze one file.
    ///
    /// Decoding and profiling always run, so even an unrecognized container
    /// reports its measured rolloff. The bitrate is only read for lossy formats.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<Verdict, AnalysisError> {
        let path = path.as_ref();
        let format = ContainerFormat::from_path(path);

        let buffer = self.decoder.decode(path)?;
        let estimate = self.profile_buffer(&buffer)?;

        let bitrate_kbps = if format.is_lossy() {
            Some(self.bitrate_reader.bitrate_kbps(path)?)
        } else {
            None
        };

        Ok(self
            .classifier
            .classify(path, format, bitrate_kbps, estimate.frequency_hz))
    }

    /// Estimate the rolloff of the configured channel of an already decoded buffer.
    pub fn profile_buffer(&self, buffer: &SampleBuffer) -> Result<RolloffEstimate, AnalysisError> {
        let samples = buffer.channel(self.channel)?;
        if samples.is_empty() {
            return Err(AnalysisError::EmptySignal);
        }

        let estimate = self.profiler.profile(&samples, buffer.sample_rate())?;
        debug!(
            "channel {} of {}: rolloff {:.0} Hz over {} frames",
            self.channel,
            buffer.channels(),
            estimate.frequency_hz,
            estimate.frames
        );
        Ok(estimate)
    }
}
