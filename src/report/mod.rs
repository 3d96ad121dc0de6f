//! Report generation for analysis results
//!
//! Besides the one-line-per-file console output, a batch can be written to a
//! report file:
//!
//! - **JSON**: Machine-readable, with a generation timestamp and summary counts
//! - **CSV**: Spreadsheet-compatible, one row per file
//!
//! # Usage
//!
//! ```ignore
//! use bandcheck::report;
//!
//! // Automatically picks format based on extension
//! report::generate("report.json", &reports)?;  // JSON
//! report::generate("report.csv", &reports)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::analyzer::Verdict;
use crate::error::AnalysisError;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, reports: &[FileReport]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "json" => json::write(&mut file, reports),
        _ => csv::write(&mut file, reports),
    }
}

/// How a single file came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Unknown,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Unknown => "unknown",
            Status::Error => "error",
        }
    }
}

/// Flattened, serializable record of one analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: String,
    pub status: Status,
    pub rolloff_hz: Option<f64>,
    pub expected_hz: Option<f64>,
    pub bitrate_kbps: Option<u32>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: &Path, result: &Result<Verdict, AnalysisError>) -> Self {
        match result {
            Ok(verdict) => Self::from_verdict(verdict),
            Err(e) => Self::from_error(path, e),
        }
    }

    pub fn from_verdict(verdict: &Verdict) -> Self {
        let status = match verdict {
            Verdict::Pass { .. } => Status::Pass,
            Verdict::FailBelowExpectation { .. } => Status::Fail,
            Verdict::UnknownFormat { .. } => Status::Unknown,
        };
        Self {
            path: verdict.path().to_path_buf(),
            format: verdict.format().name(),
            status,
            rolloff_hz: Some(verdict.rolloff_hz()),
            expected_hz: verdict.expected_hz(),
            bitrate_kbps: verdict.bitrate_kbps(),
            error: None,
        }
    }

    pub fn from_error(path: &Path, error: &AnalysisError) -> Self {
        Self {
            path: path.to_path_buf(),
            format: crate::analyzer::ContainerFormat::from_path(path).name(),
            status: Status::Error,
            rolloff_hz: None,
            expected_hz: None,
            bitrate_kbps: None,
            error: Some(error.to_string()),
        }
    }
}

/// Summary statistics for a batch of results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub unknown: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };

        for r in reports {
            match r.status {
                Status::Pass => summary.pass += 1,
                Status::Fail => summary.fail += 1,
                Status::Unknown => summary.unknown += 1,
                Status::Error => summary.error += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analyzer::{Classifier, ContainerFormat};
    use crate::error::DecodeError;

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct aggregates verdict counts for a batch of files.
    // It's written at the top of JSON reports to give an overview.
    // ==========================================================================

    pub(crate) fn sample_reports() -> Vec<FileReport> {
        let classifier = Classifier::default();
        vec![
            FileReport::from_verdict(&classifier.classify(
                Path::new("/music/good.flac"),
                ContainerFormat::Flac,
                None,
                21500.0,
            )),
            FileReport::from_verdict(&classifier.classify(
                Path::new("/music/fake.wav"),
                ContainerFormat::Wav,
                None,
                16020.0,
            )),
            FileReport::from_verdict(&classifier.classify(
                Path::new("/music/low, \"quoted\".mp3"),
                ContainerFormat::Mp3,
                Some(128),
                14000.0,
            )),
            FileReport::from_error(
                Path::new("/music/broken.flac"),
                &AnalysisError::Decode(DecodeError::CorruptFile("bad frame".into())),
            ),
        ]
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_reports(&[]);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_summary_mixed() {
        let summary = Summary::from_reports(&sample_reports());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.pass, 1);
        assert_eq!(summary.fail, 2);
        assert_eq!(summary.unknown, 0);
        assert_eq!(summary.error, 1);
    }

    #[test]
    fn test_file_report_from_result() {
        let err: Result<Verdict, AnalysisError> = Err(AnalysisError::NoPositiveEnergy);
        let report = FileReport::new(Path::new("quiet.WAV"), &err);
        assert_eq!(report.status, Status::Error);
        assert_eq!(report.format, "WAV");
        assert!(report.error.as_deref().unwrap_or("").contains("silent"));

        let ok = Ok(Classifier::default().classify(Path::new("x.mp3"), ContainerFormat::Mp3, Some(320), 19000.0));
        let report = FileReport::new(Path::new("x.mp3"), &ok);
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.expected_hz, Some(18000.0));
        assert_eq!(report.bitrate_kbps, Some(320));
    }

    #[test]
    fn test_generate_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let reports = sample_reports();

        let json_path = dir.path().join("out.JSON");
        generate(&json_path, &reports).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        assert!(text.trim_start().starts_with('{'));

        let csv_path = dir.path().join("out.csv");
        generate(&csv_path, &reports).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("path,"));
    }
}
