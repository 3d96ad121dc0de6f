//! JSON report output

use super::{FileReport, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated: String,
    summary: Summary,
    files: &'a [FileReport],
}

pub fn write<W: Write>(writer: &mut W, reports: &[FileReport]) -> io::Result<()> {
    let report = Report {
        generated: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_reports(reports),
        files: reports,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    writer.flush()
}
