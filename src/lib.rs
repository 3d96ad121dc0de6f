//! Bandcheck - Check whether audio files deliver the bandwidth they claim
//!
//! A WAV or FLAC file should carry content up to nearly the Nyquist frequency,
//! and an MP3 at a given bitrate should reach at least the lowpass its encoder
//! normally uses. Files produced from a lower-quality source give themselves
//! away: their energy stops well short of what the label promises.
//!
//! # Overview
//!
//! Each file is decoded, one channel is turned into a spectrogram, and the
//! spectrogram is reduced to a single *rolloff frequency*: the highest
//! frequency carrying sustained energy. That number is compared against an
//! expectation for the file's format (and bitrate, for MP3).
//!
//! # Quick Start
//!
//! ```no_run
//! use bandcheck::{Analyzer, Verdict};
//!
//! let analyzer = Analyzer::new();
//! match analyzer.analyze("suspicious.flac") {
//!     Ok(verdict @ Verdict::FailBelowExpectation { .. }) => println!("Fake? {}", verdict),
//!     Ok(verdict) => println!("{}", verdict),
//!     Err(e) => eprintln!("Couldn't analyze: {}", e),
//! }
//! ```
//!
//! # Verdicts
//!
//! | Verdict | Meaning |
//! |---------|---------|
//! | Pass | Rolloff at or above the expectation |
//! | FailBelowExpectation | Rolloff below the expectation; likely upsampled or transcoded |
//! | UnknownFormat | No expectation for this container |
//!
//! # Modules
//!
//! - [`analyzer`]: Spectral profiler, expectation classifier and the pipeline tying them together
//! - [`decode`]: Audio decoding via symphonia
//! - [`mp3`]: MP3 frame parsing and declared bitrate
//! - [`config`]: Tunable settings, loadable from JSON
//! - [`report`]: Output formatters (JSON, CSV)

pub mod analyzer;
pub mod config;
pub mod decode;
pub mod error;
pub mod mp3;
pub mod report;
pub mod walk;

pub use analyzer::{Analyzer, Classifier, ContainerFormat, ExpectationTable, Verdict};
pub use config::AnalysisConfig;
pub use decode::{AudioDecoder, SampleBuffer, SymphoniaDecoder};
pub use error::{AnalysisError, ConfigError, DecodeError, MetadataError};
pub use mp3::{BitrateReader, Mp3BitrateReader};
pub use walk::audio_files;
