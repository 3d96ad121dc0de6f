//! Expectation classifier
//!
//! Compares a measured rolloff against what the file's container (and, for
//! MP3, its declared bitrate) should deliver.
//!
//! ```text
//! Container | Expected minimum rolloff
//! ----------|-----------------------------------------------
//! WAV, FLAC | 19000 Hz
//! MP3       | looked up by bitrate in an ExpectationTable
//! other     | no expectation (UnknownFormat)
//! ```
//!
//! The default MP3 table mirrors typical LAME lowpass choices:
//!
//! ```text
//! Bitrate  | Minimum rolloff
//! ---------|----------------
//!   0 kbps |      0 Hz
//!  16 kbps |   4000 Hz
//!  64 kbps |  10000 Hz
//! 128 kbps |  15000 Hz
//! 192 kbps |  16000 Hz
//! 320 kbps |  18000 Hz
//! ```
//!
//! A bitrate uses the row with the largest threshold not above it, so
//! 160 kbps expects 15000 Hz and 127 kbps expects 10000 Hz.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rolloff a genuine lossless file is expected to reach.
pub const DEFAULT_LOSSLESS_MIN_ROLLOFF_HZ: f64 = 19000.0;

/// Container format as declared by the file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    Wav,
    Flac,
    Mp3,
    /// Anything else, holding the lowercased extension (empty when missing).
    Unknown(String),
}

impl ContainerFormat {
    /// Classify a path by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "wav" => ContainerFormat::Wav,
            "flac" => ContainerFormat::Flac,
            "mp3" => ContainerFormat::Mp3,
            _ => ContainerFormat::Unknown(ext),
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, ContainerFormat::Wav | ContainerFormat::Flac)
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, ContainerFormat::Mp3)
    }

    /// Upper-case name used in report lines ("WAV", "FLAC", "MP3").
    pub fn name(&self) -> String {
        match self {
            ContainerFormat::Wav => "WAV".to_string(),
            ContainerFormat::Flac => "FLAC".to_string(),
            ContainerFormat::Mp3 => "MP3".to_string(),
            ContainerFormat::Unknown(ext) if ext.is_empty() => "UNKNOWN".to_string(),
            ContainerFormat::Unknown(ext) => ext.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One row of an [`ExpectationTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectationRow {
    pub bitrate_kbps: u32,
    pub min_rolloff_hz: f64,
}

impl ExpectationRow {
    pub const fn new(bitrate_kbps: u32, min_rolloff_hz: f64) -> Self {
        Self {
            bitrate_kbps,
            min_rolloff_hz,
        }
    }
}

/// Bitrate threshold → minimum expected rolloff, strictly ascending by bitrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ExpectationRow>", into = "Vec<ExpectationRow>")]
pub struct ExpectationTable {
    rows: Vec<ExpectationRow>,
}

impl ExpectationTable {
    /// Build a table, rejecting empty or non-ascending rows.
    pub fn new(rows: Vec<ExpectationRow>) -> Result<Self, ConfigError> {
        if rows.is_empty() {
            return Err(ConfigError::InvalidTable("table has no rows".to_string()));
        }
        for pair in rows.windows(2) {
            if pair[1].bitrate_kbps <= pair[0].bitrate_kbps {
                return Err(ConfigError::InvalidTable(format!(
                    "bitrates must be strictly ascending ({} kbps follows {} kbps)",
                    pair[1].bitrate_kbps, pair[0].bitrate_kbps
                )));
            }
        }
        if let Some(row) = rows.iter().find(|r| !r.min_rolloff_hz.is_finite() || r.min_rolloff_hz < 0.0) {
            return Err(ConfigError::InvalidTable(format!(
                "minimum rolloff for {} kbps must be a non-negative number, got {}",
                row.bitrate_kbps, row.min_rolloff_hz
            )));
        }
        Ok(Self { rows })
    }

    /// The table of typical MP3 encoder lowpass frequencies.
    pub fn mp3_default() -> Self {
        Self {
            rows: vec![
                ExpectationRow::new(0, 0.0),
                ExpectationRow::new(16, 4000.0),
                ExpectationRow::new(64, 10000.0),
                ExpectationRow::new(128, 15000.0),
                ExpectationRow::new(192, 16000.0),
                ExpectationRow::new(320, 18000.0),
            ],
        }
    }

    pub fn rows(&self) -> &[ExpectationRow] {
        &self.rows
    }

    /// Minimum rolloff for the largest threshold not above `bitrate_kbps`.
    ///
    /// `None` when the bitrate is below the first threshold.
    pub fn expected_rolloff(&self, bitrate_kbps: u32) -> Option<f64> {
        let idx = self.rows.partition_point(|r| r.bitrate_kbps <= bitrate_kbps);
        idx.checked_sub(1).map(|i| self.rows[i].min_rolloff_hz)
    }
}

impl Default for ExpectationTable {
    fn default() -> Self {
        Self::mp3_default()
    }
}

impl TryFrom<Vec<ExpectationRow>> for ExpectationTable {
    type Error = ConfigError;

    fn try_from(rows: Vec<ExpectationRow>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<ExpectationTable> for Vec<ExpectationRow> {
    fn from(table: ExpectationTable) -> Self {
        table.rows
    }
}

/// Outcome of comparing one file against its expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Pass {
        path: PathBuf,
        format: ContainerFormat,
        rolloff_hz: f64,
        expected_hz: f64,
        bitrate_kbps: Option<u32>,
    },
    FailBelowExpectation {
        path: PathBuf,
        format: ContainerFormat,
        rolloff_hz: f64,
        expected_hz: f64,
        bitrate_kbps: Option<u32>,
    },
    UnknownFormat {
        path: PathBuf,
        format: ContainerFormat,
        rolloff_hz: f64,
        bitrate_kbps: Option<u32>,
    },
}

impl Verdict {
    pub fn path(&self) -> &Path {
        match self {
            Verdict::Pass { path, .. }
            | Verdict::FailBelowExpectation { path, .. }
            | Verdict::UnknownFormat { path, .. } => path,
        }
    }

    pub fn format(&self) -> &ContainerFormat {
        match self {
            Verdict::Pass { format, .. }
            | Verdict::FailBelowExpectation { format, .. }
            | Verdict::UnknownFormat { format, .. } => format,
        }
    }

    pub fn rolloff_hz(&self) -> f64 {
        match self {
            Verdict::Pass { rolloff_hz, .. }
            | Verdict::FailBelowExpectation { rolloff_hz, .. }
            | Verdict::UnknownFormat { rolloff_hz, .. } => *rolloff_hz,
        }
    }

    pub fn bitrate_kbps(&self) -> Option<u32> {
        match self {
            Verdict::Pass { bitrate_kbps, .. }
            | Verdict::FailBelowExpectation { bitrate_kbps, .. }
            | Verdict::UnknownFormat { bitrate_kbps, .. } => *bitrate_kbps,
        }
    }

    pub fn expected_hz(&self) -> Option<f64> {
        match self {
            Verdict::Pass { expected_hz, .. } | Verdict::FailBelowExpectation { expected_hz, .. } => {
                Some(*expected_hz)
            }
            Verdict::UnknownFormat { .. } => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::FailBelowExpectation { .. })
    }

    /// Short label for tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass { .. } => "PASS",
            Verdict::FailBelowExpectation { .. } => "FAIL",
            Verdict::UnknownFormat { .. } => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass {
                path,
                bitrate_kbps: Some(kbps),
                ..
            } => write!(f, "{} seems good [{} kbps].", path.display(), kbps),
            Verdict::Pass { path, .. } => write!(f, "{} seems good.", path.display()),
            Verdict::FailBelowExpectation {
                path,
                format,
                rolloff_hz,
                bitrate_kbps: Some(kbps),
                ..
            } => write!(
                f,
                "{} is {} [{} kbps], but has max frequency about {:.0} Hz.",
                path.display(),
                format,
                kbps,
                rolloff_hz
            ),
            Verdict::FailBelowExpectation {
                path,
                format,
                rolloff_hz,
                ..
            } => write!(
                f,
                "{} is {}, but has max frequency about {:.0} Hz.",
                path.display(),
                format,
                rolloff_hz
            ),
            Verdict::UnknownFormat { path, .. } => {
                write!(f, "Don't know what to expect for {}.", path.display())
            }
        }
    }
}

/// Maps a format, bitrate and measured rolloff to a [`Verdict`]. Performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    lossless_min_rolloff_hz: f64,
    lossy_table: ExpectationTable,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOSSLESS_MIN_ROLLOFF_HZ, ExpectationTable::default())
    }
}

impl Classifier {
    pub fn new(lossless_min_rolloff_hz: f64, lossy_table: ExpectationTable) -> Self {
        Self {
            lossless_min_rolloff_hz,
            lossy_table,
        }
    }

    pub fn lossless_min_rolloff_hz(&self) -> f64 {
        self.lossless_min_rolloff_hz
    }

    pub fn lossy_table(&self) -> &ExpectationTable {
        &self.lossy_table
    }

    /// The minimum rolloff this format (and bitrate) should reach, if any.
    pub fn expected_rolloff(&self, format: &ContainerFormat, bitrate_kbps: Option<u32>) -> Option<f64> {
        match format {
            f if f.is_lossless() => Some(self.lossless_min_rolloff_hz),
            f if f.is_lossy() => bitrate_kbps.and_then(|b| self.lossy_table.expected_rolloff(b)),
            _ => None,
        }
    }

    pub fn classify(
        &self,
        path: &Path,
        format: ContainerFormat,
        bitrate_kbps: Option<u32>,
        rolloff_hz: f64,
    ) -> Verdict {
        let path = path.to_path_buf();
        let bitrate_kbps = if format.is_lossy() { bitrate_kbps } else { None };

        match self.expected_rolloff(&format, bitrate_kbps) {
            Some(expected_hz) if rolloff_hz >= expected_hz => Verdict::Pass {
                path,
                format,
                rolloff_hz,
                expected_hz,
                bitrate_kbps,
            },
            Some(expected_hz) => Verdict::FailBelowExpectation {
                path,
                format,
                rolloff_hz,
                expected_hz,
                bitrate_kbps,
            },
            None => Verdict::UnknownFormat {
                path,
                format,
                rolloff_hz,
                bitrate_kbps,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // FORMAT DETECTION TESTS
    // ==========================================================================

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ContainerFormat::from_path(Path::new("a/b.wav")), ContainerFormat::Wav);
        assert_eq!(ContainerFormat::from_path(Path::new("b.flac")), ContainerFormat::Flac);
        assert_eq!(ContainerFormat::from_path(Path::new("c.mp3")), ContainerFormat::Mp3);
        assert_eq!(
            ContainerFormat::from_path(Path::new("d.ogg")),
            ContainerFormat::Unknown("ogg".to_string())
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("README")),
            ContainerFormat::Unknown(String::new())
        );
    }

    #[test]
    fn test_format_ignores_case() {
        assert_eq!(ContainerFormat::from_path(Path::new("LOUD.WAV")), ContainerFormat::Wav);
        assert_eq!(ContainerFormat::from_path(Path::new("Mixed.FlAc")), ContainerFormat::Flac);
        assert_eq!(ContainerFormat::from_path(Path::new("song.MP3")), ContainerFormat::Mp3);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ContainerFormat::Wav.to_string(), "WAV");
        assert_eq!(ContainerFormat::Flac.to_string(), "FLAC");
        assert_eq!(ContainerFormat::Mp3.to_string(), "MP3");
        assert_eq!(ContainerFormat::Unknown("ogg".into()).to_string(), "OGG");
    }

    // ==========================================================================
    // EXPECTATION TABLE TESTS
    // ==========================================================================
    //
    // Lookup is "largest threshold <= bitrate". Bitrates between rows inherit
    // the lower row; exact hits use their own row.
    // ==========================================================================

    #[test]
    fn test_table_lookup_exact_rows() {
        let table = ExpectationTable::mp3_default();
        assert_eq!(table.expected_rolloff(0), Some(0.0));
        assert_eq!(table.expected_rolloff(16), Some(4000.0));
        assert_eq!(table.expected_rolloff(64), Some(10000.0));
        assert_eq!(table.expected_rolloff(128), Some(15000.0));
        assert_eq!(table.expected_rolloff(192), Some(16000.0));
        assert_eq!(table.expected_rolloff(320), Some(18000.0));
    }

    #[test]
    fn test_table_lookup_between_rows() {
        let table = ExpectationTable::mp3_default();
        assert_eq!(table.expected_rolloff(127), Some(10000.0));
        assert_eq!(table.expected_rolloff(129), Some(15000.0));
        assert_eq!(table.expected_rolloff(140), Some(15000.0));
        assert_eq!(table.expected_rolloff(256), Some(16000.0));
        assert_eq!(table.expected_rolloff(500), Some(18000.0));
    }

    #[test]
    fn test_table_below_first_threshold() {
        let table = ExpectationTable::new(vec![ExpectationRow::new(32, 8000.0)]).unwrap();
        assert_eq!(table.expected_rolloff(31), None);
        assert_eq!(table.expected_rolloff(32), Some(8000.0));
    }

    #[test]
    fn test_table_rejects_bad_rows() {
        assert!(ExpectationTable::new(vec![]).is_err());
        assert!(ExpectationTable::new(vec![
            ExpectationRow::new(128, 15000.0),
            ExpectationRow::new(64, 10000.0),
        ])
        .is_err());
        assert!(ExpectationTable::new(vec![
            ExpectationRow::new(64, 10000.0),
            ExpectationRow::new(64, 11000.0),
        ])
        .is_err());
        assert!(ExpectationTable::new(vec![ExpectationRow::new(64, f64::NAN)]).is_err());
    }

    #[test]
    fn test_table_json_round_trip_validates() {
        let json = r#"[{"bitrate_kbps": 0, "min_rolloff_hz": 0}, {"bitrate_kbps": 96, "min_rolloff_hz": 12000}]"#;
        let table: ExpectationTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.expected_rolloff(100), Some(12000.0));

        let unsorted = r#"[{"bitrate_kbps": 96, "min_rolloff_hz": 0}, {"bitrate_kbps": 0, "min_rolloff_hz": 0}]"#;
        assert!(serde_json::from_str::<ExpectationTable>(unsorted).is_err());
    }

    // ==========================================================================
    // CLASSIFIER TESTS
    // ==========================================================================

    fn classify(format: ContainerFormat, bitrate: Option<u32>, rolloff: f64) -> Verdict {
        Classifier::default().classify(Path::new("x"), format, bitrate, rolloff)
    }

    #[test]
    fn test_lossless_threshold_is_inclusive() {
        assert!(classify(ContainerFormat::Wav, None, 19000.0).is_pass());
        assert!(classify(ContainerFormat::Flac, None, 21000.0).is_pass());
        assert!(classify(ContainerFormat::Wav, None, 18999.0).is_fail());
    }

    #[test]
    fn test_mp3_128_with_14k_fails() {
        let verdict = classify(ContainerFormat::Mp3, Some(128), 14000.0);
        assert_eq!(
            verdict,
            Verdict::FailBelowExpectation {
                path: PathBuf::from("x"),
                format: ContainerFormat::Mp3,
                rolloff_hz: 14000.0,
                expected_hz: 15000.0,
                bitrate_kbps: Some(128),
            }
        );
    }

    #[test]
    fn test_mp3_passes_at_expectation() {
        assert!(classify(ContainerFormat::Mp3, Some(320), 18000.0).is_pass());
        assert!(classify(ContainerFormat::Mp3, Some(64), 10500.0).is_pass());
    }

    #[test]
    fn test_unknown_extension_ignores_rolloff() {
        for rolloff in [0.0, 10000.0, 22050.0] {
            let verdict = classify(ContainerFormat::Unknown("ogg".into()), None, rolloff);
            assert!(matches!(verdict, Verdict::UnknownFormat { .. }));
            assert_eq!(verdict.rolloff_hz(), rolloff);
        }
    }

    #[test]
    fn test_mp3_below_table_is_unknown() {
        let classifier = Classifier::new(
            19000.0,
            ExpectationTable::new(vec![ExpectationRow::new(64, 10000.0)]).unwrap(),
        );
        let verdict = classifier.classify(Path::new("low.mp3"), ContainerFormat::Mp3, Some(32), 9000.0);
        assert!(matches!(verdict, Verdict::UnknownFormat { bitrate_kbps: Some(32), .. }));
    }

    #[test]
    fn test_lossless_drops_stray_bitrate() {
        let verdict = classify(ContainerFormat::Flac, Some(900), 20000.0);
        assert_eq!(verdict.bitrate_kbps(), None);
    }

    #[test]
    fn test_custom_lossless_threshold() {
        let classifier = Classifier::new(15000.0, ExpectationTable::default());
        let verdict = classifier.classify(Path::new("a.wav"), ContainerFormat::Wav, None, 16000.0);
        assert!(verdict.is_pass());
    }

    // ==========================================================================
    // REPORT LINE TESTS
    // ==========================================================================

    #[test]
    fn test_display_lines() {
        let c = Classifier::default();
        let p = Path::new("music/a.wav");
        assert_eq!(
            c.classify(p, ContainerFormat::Wav, None, 21000.0).to_string(),
            "music/a.wav seems good."
        );
        assert_eq!(
            c.classify(p, ContainerFormat::Wav, None, 8123.4).to_string(),
            "music/a.wav is WAV, but has max frequency about 8123 Hz."
        );

        let p = Path::new("b.mp3");
        assert_eq!(
            c.classify(p, ContainerFormat::Mp3, Some(192), 16500.0).to_string(),
            "b.mp3 seems good [192 kbps]."
        );
        assert_eq!(
            c.classify(p, ContainerFormat::Mp3, Some(128), 14000.0).to_string(),
            "b.mp3 is MP3 [128 kbps], but has max frequency about 14000 Hz."
        );

        let p = Path::new("c.ogg");
        assert_eq!(
            c.classify(p, ContainerFormat::Unknown("ogg".into()), None, 1.0).to_string(),
            "Don't know what to expect for c.ogg."
        );
    }

    #[test]
    fn test_verdict_serializes_with_tag() {
        let verdict = classify(ContainerFormat::Wav, None, 8000.0);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "fail_below_expectation");
        assert_eq!(json["rolloff_hz"], 8000.0);
        assert_eq!(json["format"], "wav");
    }
}
