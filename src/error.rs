//! Error types
//!
//! Every failure is attributed to a single file. A batch never stops because
//! one file could not be decoded or analyzed; the CLI prints the error next to
//! the path and moves on.

use std::io;
use thiserror::Error;

/// Failures of the audio decoder collaborator.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot open file: {0}")]
    Io(#[from] io::Error),

    /// The container or codec is not one we can decode.
    #[error("unsupported container: {0}")]
    UnsupportedContainer(String),

    /// The container was recognized but its audio could not be read.
    #[error("corrupt audio data: {0}")]
    CorruptFile(String),
}

/// Failures of the bitrate reader collaborator.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot read metadata: {0}")]
    Io(#[from] io::Error),

    #[error("no bitrate metadata found")]
    MissingMetadata,
}

/// Everything that can go wrong while analyzing one file.
///
/// The spectral variants (`EmptySignal`, `NoPositiveEnergy`, `NoQualifyingBin`)
/// mean the rolloff estimate is undefined; they are distinct from a failing
/// verdict.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("signal has no samples")]
    EmptySignal,

    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("channel {channel} requested but the file has {channels} channel(s)")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("signal contains NaN or infinite samples")]
    NonFiniteSamples,

    #[error("spectrogram has no positive energy (silent signal)")]
    NoPositiveEnergy,

    #[error("no frequency bin carries sustained energy")]
    NoQualifyingBin,

    #[error("invalid analysis window: {0}")]
    InvalidWindow(String),
}

/// Problems loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid expectation table: {0}")]
    InvalidTable(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts_into_analysis_error() {
        let err: AnalysisError = DecodeError::CorruptFile("truncated".into()).into();
        assert!(matches!(err, AnalysisError::Decode(DecodeError::CorruptFile(_))));
        assert_eq!(err.to_string(), "corrupt audio data: truncated");
    }

    #[test]
    fn test_metadata_error_converts_into_analysis_error() {
        let err: AnalysisError = MetadataError::MissingMetadata.into();
        assert_eq!(err.to_string(), "no bitrate metadata found");
    }

    #[test]
    fn test_channel_error_message_names_both_counts() {
        let err = AnalysisError::ChannelOutOfRange { channel: 3, channels: 2 };
        assert_eq!(
            err.to_string(),
            "channel 3 requested but the file has 2 channel(s)"
        );
    }
}
