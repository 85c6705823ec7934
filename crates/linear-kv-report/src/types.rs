//! Wire types for exported histories and check reports.

use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use linear_kv_checker::CheckResult;
use linear_kv_core::{HistoryError, Interval, OpKind, OperationRecord, Outcome, Timestamp};
use serde::{Deserialize, Serialize};

/// One operation as it appears in an exported history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Client request id; empty for anonymous reads.
    #[serde(default)]
    pub request_id: String,
    /// `GET` or `PUT`.
    pub op: String,
    /// The key operated on.
    pub key: String,
    /// The written or observed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `ok`, `duplicate` or `not_found`.
    pub result: String,
    /// Invocation time.
    pub start: DateTime<Utc>,
    /// Completion time.
    pub end: DateTime<Utc>,
    /// `end - start` in nanoseconds.
    #[serde(default)]
    pub duration: u64,
}

impl From<&OperationRecord> for HistoryEntry {
    fn from(record: &OperationRecord) -> Self {
        Self {
            request_id: record.request_id.clone(),
            op: record.kind.as_str().to_owned(),
            key: record.key.clone(),
            value: record.value.clone(),
            result: record.outcome.as_str().to_owned(),
            start: record.start().to_datetime(),
            end: record.end().to_datetime(),
            duration: u64::try_from(record.duration().as_nanos()).unwrap_or(u64::MAX),
        }
    }
}

impl TryFrom<HistoryEntry> for OperationRecord {
    type Error = HistoryError;

    fn try_from(entry: HistoryEntry) -> Result<Self, Self::Error> {
        let kind = OpKind::parse(&entry.op)
            .ok_or_else(|| HistoryError::corrupted(format!("unknown op '{}'", entry.op)))?;
        let outcome = Outcome::parse(&entry.result)
            .ok_or_else(|| HistoryError::corrupted(format!("unknown result '{}'", entry.result)))?;
        let start = Timestamp::from_datetime(&entry.start)
            .ok_or_else(|| HistoryError::corrupted(format!("start {} out of range", entry.start)))?;
        let end = Timestamp::from_datetime(&entry.end)
            .ok_or_else(|| HistoryError::corrupted(format!("end {} out of range", entry.end)))?;
        let interval = Interval::new(start, end)?;

        match (kind, outcome) {
            (OpKind::Write, Outcome::Ok | Outcome::Duplicate) => Ok(OperationRecord::write(
                entry.request_id,
                entry.key,
                entry.value.unwrap_or_default(),
                outcome,
                interval,
            )),
            (OpKind::Read, Outcome::Ok) => Ok(OperationRecord::read(
                entry.request_id,
                entry.key,
                Some(entry.value.unwrap_or_default()),
                interval,
            )),
            (OpKind::Read, Outcome::NotFound) => Ok(OperationRecord::read(
                entry.request_id,
                entry.key,
                None,
                interval,
            )),
            (kind, outcome) => Err(HistoryError::corrupted(format!(
                "{} cannot have result '{}'",
                kind, outcome
            ))),
        }
    }
}

/// Summary returned by a consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// True iff no violation was found.
    pub is_linearizable: bool,
    /// Human-readable violation descriptions.
    pub violations: Vec<String>,
    /// Number of operations in the checked history.
    pub total_ops: usize,
}

impl CheckReport {
    /// Builds a report from a check result over `total_ops` operations.
    pub fn new(result: &CheckResult, total_ops: usize) -> Self {
        Self {
            is_linearizable: result.violations.is_empty(),
            violations: result.messages(),
            total_ops,
        }
    }
}

/// Error types for report generation.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A record could not be turned back into an operation.
    #[error("Invalid history: {0}")]
    InvalidHistory(#[from] HistoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use linear_kv_checker::{Violation, ViolationType};

    fn record(kind: OpKind, value: Option<&str>, outcome: Outcome) -> OperationRecord {
        let interval =
            Interval::new(Timestamp::from_nanos(1_000), Timestamp::from_nanos(1_500)).unwrap();
        match kind {
            OpKind::Write => {
                OperationRecord::write("r1", "a", value.unwrap_or_default(), outcome, interval)
            }
            OpKind::Read => OperationRecord::read("r1", "a", value.map(str::to_owned), interval),
        }
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = HistoryEntry::from(&record(OpKind::Write, Some("x"), Outcome::Duplicate));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["requestId"], "r1");
        assert_eq!(json["op"], "PUT");
        assert_eq!(json["value"], "x");
        assert_eq!(json["result"], "duplicate");
        assert_eq!(json["duration"], 500);
        assert!(json["start"]
            .as_str()
            .unwrap()
            .starts_with("1970-01-01T00:00:00.000001"));
    }

    #[test]
    fn test_not_found_read_omits_value() {
        let entry = HistoryEntry::from(&record(OpKind::Read, None, Outcome::NotFound));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["op"], "GET");
        assert_eq!(json["result"], "not_found");
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_entry_back_to_record() {
        let original = record(OpKind::Read, Some("x"), Outcome::Ok);
        let restored = OperationRecord::try_from(HistoryEntry::from(&original)).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_found_read_without_value_is_empty_string() {
        let mut entry = HistoryEntry::from(&record(OpKind::Read, Some(""), Outcome::Ok));
        entry.value = None;
        let restored = OperationRecord::try_from(entry).unwrap();
        assert_eq!(restored.value.as_deref(), Some(""));
        assert_eq!(restored.outcome, Outcome::Ok);
    }

    #[test]
    fn test_invalid_entries() {
        let mut entry = HistoryEntry::from(&record(OpKind::Write, Some("x"), Outcome::Ok));
        entry.op = "DELETE".into();
        assert!(matches!(
            OperationRecord::try_from(entry),
            Err(HistoryError::Corrupted { .. })
        ));

        let mut entry = HistoryEntry::from(&record(OpKind::Read, Some("x"), Outcome::Ok));
        entry.result = "duplicate".into();
        assert!(matches!(
            OperationRecord::try_from(entry),
            Err(HistoryError::Corrupted { .. })
        ));

        let mut entry = HistoryEntry::from(&record(OpKind::Write, Some("x"), Outcome::Ok));
        std::mem::swap(&mut entry.start, &mut entry.end);
        assert!(matches!(
            OperationRecord::try_from(entry),
            Err(HistoryError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_check_report() {
        let result = CheckResult::from_violations(vec![Violation::new(
            ViolationType::FutureRead,
            "a",
            "key 'a': read",
        )]);
        let report = CheckReport::new(&result, 3);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["isLinearizable"], false);
        assert_eq!(json["totalOps"], 3);
        assert_eq!(json["violations"][0], "Future Read: key 'a': read");

        let passing = CheckReport::new(&CheckResult::pass(), 0);
        assert!(passing.is_linearizable);
        assert!(passing.violations.is_empty());
    }
}
