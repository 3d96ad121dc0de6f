//! CSV report output

use super::FileReport;
use std::io::{self, Write};

const HEADER: &str = "path,format,status,rolloff_hz,expected_hz,bitrate_kbps,error";

pub fn write<W: Write>(writer: &mut W, reports: &[FileReport]) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for r in reports {
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            escape(&r.path.display().to_string()),
            escape(&r.format),
            r.status.as_str(),
            r.rolloff_hz.map(|f| format!("{:.0}", f)).unwrap_or_default(),
            r.expected_hz.map(|f| format!("{:.0}", f)).unwrap_or_default(),
            r.bitrate_kbps.map(|b| b.to_string()).unwrap_or_default(),
            escape(r.error.as_deref().unwrap_or("")),
        )?;
    }

    writer.flush()
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
