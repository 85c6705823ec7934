//! JSON export and import of recorded histories.
//!
//! Histories are written as a pretty-printed array of [`HistoryEntry`] with
//! two-space indentation. The same format is accepted back, so an exported
//! history can be checked offline.

use std::io::Write;
use std::path::Path;

use linear_kv_core::{History, OperationRecord};
use serde::Serialize;
use serde_json::ser::{CompactFormatter, PrettyFormatter, Serializer};
use tracing::{debug, instrument};

use crate::types::{CheckReport, HistoryEntry, ReportError};

/// JSON output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Compact JSON (single line, minimal whitespace).
    Compact,
    /// Pretty-printed JSON with two-space indentation.
    #[default]
    Pretty,
}

/// Converts a history to its wire entries, in log order.
fn history_entries(history: &History) -> Vec<HistoryEntry> {
    history.iter().map(HistoryEntry::from).collect()
}

/// Serializes a history.
#[instrument(skip(history), fields(ops = history.len()))]
pub fn history_to_json(history: &History, format: JsonFormat) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    write_json(&history_entries(history), format, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        ReportError::SerializationError(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e,
        )))
    })
}

/// Parses an exported history.
///
/// Operation ids are reassigned in file order.
pub fn history_from_json(json: &str) -> Result<History, ReportError> {
    let entries: Vec<HistoryEntry> = serde_json::from_str(json)?;
    let records = entries
        .into_iter()
        .map(OperationRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(ops = records.len(), "history parsed");
    Ok(History::from_records(records))
}

/// Reads and parses an exported history file.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn history_from_file(path: impl AsRef<Path>) -> Result<History, ReportError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    history_from_json(&json)
}

/// Serializes a check report.
pub fn check_report_to_json(report: &CheckReport, format: JsonFormat) -> Result<String, ReportError> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(report)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(report)?,
    };
    Ok(json)
}

fn write_json<T: Serialize + ?Sized, W: Write>(
    value: &T,
    format: JsonFormat,
    mut writer: W,
) -> Result<(), ReportError> {
    match format {
        JsonFormat::Compact => {
            let mut serializer = Serializer::with_formatter(&mut writer, CompactFormatter);
            value.serialize(&mut serializer)?;
        }
        JsonFormat::Pretty => {
            let formatter = PrettyFormatter::with_indent(b"  ");
            let mut serializer = Serializer::with_formatter(&mut writer, formatter);
            value.serialize(&mut serializer)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
