//! Analysis settings
//!
//! Everything tunable about a run lives in [`AnalysisConfig`]. It can be
//! loaded from a JSON file; missing keys fall back to the defaults, and
//! command line flags override whatever the file says.
//!
//! ```json
//! {
//!   "window": { "seconds": 0.05 },
//!   "taper": { "kind": "tukey", "alpha": 0.25 },
//!   "lossless_min_rolloff_hz": 19500,
//!   "expectations": [
//!     { "bitrate_kbps": 0, "min_rolloff_hz": 0 },
//!     { "bitrate_kbps": 128, "min_rolloff_hz": 15000 }
//!   ]
//! }
//! ```

use crate::analyzer::expectation::{Classifier, ExpectationTable, DEFAULT_LOSSLESS_MIN_ROLLOFF_HZ};
use crate::analyzer::spectral::{
    BinSelection, NoQualifyingBinPolicy, RolloffParams, SpectralProfiler, SpectrogramParams, Taper,
    WindowLength, DEFAULT_OVERLAP, DEFAULT_SUSTAIN_DIVISOR,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window: WindowLength,
    /// Zero-based channel to analyze.
    pub channel: usize,
    pub taper: Taper,
    pub overlap: f64,
    pub sustain_divisor: f64,
    pub bin_selection: BinSelection,
    pub no_qualifying_bin: NoQualifyingBinPolicy,
    pub lossless_min_rolloff_hz: f64,
    /// MP3 bitrate → minimum rolloff.
    pub expectations: ExpectationTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: WindowLength::default(),
            channel: 0,
            taper: Taper::default(),
            overlap: DEFAULT_OVERLAP,
            sustain_divisor: DEFAULT_SUSTAIN_DIVISOR,
            bin_selection: BinSelection::default(),
            no_qualifying_bin: NoQualifyingBinPolicy::default(),
            lossless_min_rolloff_hz: DEFAULT_LOSSLESS_MIN_ROLLOFF_HZ,
            expectations: ExpectationTable::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let WindowLength::Seconds(secs) = self.window {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "window must be a positive number of seconds, got {}",
                    secs
                )));
            }
        }
        if let Taper::Tukey { alpha } = self.taper {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ConfigError::Invalid(format!(
                    "tukey alpha must be in [0, 1], got {}",
                    alpha
                )));
            }
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ConfigError::Invalid(format!(
                "overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }
        if self.sustain_divisor.is_nan() || self.sustain_divisor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sustain_divisor must be positive, got {}",
                self.sustain_divisor
            )));
        }
        if !self.lossless_min_rolloff_hz.is_finite() || self.lossless_min_rolloff_hz < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lossless_min_rolloff_hz must be non-negative, got {}",
                self.lossless_min_rolloff_hz
            )));
        }
        Ok(())
    }

    pub fn profiler(&self) -> SpectralProfiler {
        SpectralProfiler::new(
            SpectrogramParams {
                window: self.window,
                taper: self.taper,
                overlap: self.overlap,
            },
            RolloffParams {
                sustain_divisor: self.sustain_divisor,
                selection: self.bin_selection,
                no_qualifying_bin: self.no_qualifying_bin,
            },
        )
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.lossless_min_rolloff_hz, self.expectations.clone())
    }
}
