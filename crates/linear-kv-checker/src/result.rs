//! Result types for consistency checkers.

use std::fmt;
use std::time::Duration;

use linear_kv_core::OperationId;

/// The result of a consistency check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// The overall status of the check.
    pub status: CheckStatus,
    /// Violations found, in the order they were detected.
    pub violations: Vec<Violation>,
    /// Time taken to perform the check.
    pub duration: Option<Duration>,
    /// Statistics about the check process.
    pub stats: CheckStats,
}

impl CheckResult {
    /// Create a passing result.
    pub fn pass() -> Self {
        Self {
            status: CheckStatus::Pass,
            violations: Vec::new(),
            duration: None,
            stats: CheckStats::default(),
        }
    }

    /// Create a result from the violations found; passes iff there are none.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let status = if violations.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        Self {
            status,
            violations,
            duration: None,
            stats: CheckStats::default(),
        }
    }

    /// Add the duration to this result.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Add statistics to this result.
    pub fn with_stats(mut self, stats: CheckStats) -> Self {
        self.stats = stats;
        self
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: CheckResult) {
        if other.is_fail() {
            self.status = CheckStatus::Fail;
        }
        self.violations.extend(other.violations);
        self.stats.absorb(&other.stats);
    }

    /// Check if this result indicates the history passed.
    pub fn is_pass(&self) -> bool {
        matches!(self.status, CheckStatus::Pass)
    }

    /// Check if this result indicates a failure.
    pub fn is_fail(&self) -> bool {
        matches!(self.status, CheckStatus::Fail)
    }

    /// Human-readable violation descriptions, in detection order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckResult {{ status: {}", self.status)?;
        if let Some(duration) = self.duration {
            write!(f, ", duration: {:?}", duration)?;
        }
        write!(f, ", violations: {} }}", self.violations.len())
    }
}

/// The status of a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// The history satisfies the consistency model.
    Pass,
    /// The history violates the consistency model.
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// A specific violation found during checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The type of violation.
    pub violation_type: ViolationType,
    /// The key the violation concerns.
    pub key: String,
    /// Request id of the offending read, if it carried one.
    pub request_id: Option<String>,
    /// The operations involved; the offending read comes first.
    pub operations: Vec<OperationId>,
    /// A description of why this is a violation.
    pub description: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(
        violation_type: ViolationType,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            key: key.into(),
            request_id: None,
            operations: Vec::new(),
            description: description.into(),
        }
    }

    /// Attribute the violation to a request id (empty ids are ignored).
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        if !request_id.is_empty() {
            self.request_id = Some(request_id.to_owned());
        }
        self
    }

    /// Add involved operations.
    pub fn with_operations(mut self, ops: Vec<OperationId>) -> Self {
        self.operations = ops;
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.violation_type, self.description)
    }
}

/// Types of consistency violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationType {
    /// Read returned a value that no write ever stored.
    PhantomRead,
    /// Read returned a value only written after the read completed.
    FutureRead,
    /// Read returned a value that was overwritten before the read began.
    StaleRead,
    /// Read found nothing although a write had completed before it began.
    LostWrite,
    /// A client did not observe its own completed write.
    ReadYourWrites,
    /// A client observed an older value after having seen a newer one.
    MonotonicReads,
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::PhantomRead => write!(f, "Phantom Read"),
            ViolationType::FutureRead => write!(f, "Future Read"),
            ViolationType::StaleRead => write!(f, "Stale Read"),
            ViolationType::LostWrite => write!(f, "Lost Write"),
            ViolationType::ReadYourWrites => write!(f, "Read-Your-Writes Violation"),
            ViolationType::MonotonicReads => write!(f, "Monotonic Reads Violation"),
        }
    }
}

/// Statistics about the checking process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckStats {
    /// Number of operations in the history.
    pub num_operations: usize,
    /// Number of distinct keys examined.
    pub keys_checked: usize,
    /// Number of reads examined.
    pub reads_checked: u64,
    /// Number of candidate source writes evaluated.
    pub candidates_considered: u64,
}

impl CheckStats {
    /// Fold the stats of another checker run over the same history.
    pub fn absorb(&mut self, other: &CheckStats) {
        self.num_operations = self.num_operations.max(other.num_operations);
        self.keys_checked = self.keys_checked.max(other.keys_checked);
        self.reads_checked += other.reads_checked;
        self.candidates_considered += other.candidates_considered;
    }
}

impl fmt::Display for CheckStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ ops: {}, keys: {}, reads: {}, candidates: {} }}",
            self.num_operations, self.keys_checked, self.reads_checked, self.candidates_considered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_pass() {
        let result = CheckResult::pass();
        assert!(result.is_pass());
        assert!(!result.is_fail());
        assert!(result.messages().is_empty());
    }

    #[test]
    fn test_from_violations() {
        assert!(CheckResult::from_violations(Vec::new()).is_pass());

        let v = Violation::new(ViolationType::StaleRead, "a", "key 'a': stale");
        let result = CheckResult::from_violations(vec![v]);
        assert!(result.is_fail());
        assert_eq!(result.messages(), vec!["Stale Read: key 'a': stale".to_string()]);
    }

    #[test]
    fn test_merge() {
        let mut result = CheckResult::pass().with_stats(CheckStats {
            num_operations: 10,
            keys_checked: 2,
            reads_checked: 4,
            candidates_considered: 5,
        });
        let failing = CheckResult::from_violations(vec![Violation::new(
            ViolationType::MonotonicReads,
            "b",
            "regressed",
        )])
        .with_stats(CheckStats {
            num_operations: 10,
            keys_checked: 1,
            reads_checked: 3,
            candidates_considered: 0,
        });

        result.merge(failing);
        assert!(result.is_fail());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.stats.num_operations, 10);
        assert_eq!(result.stats.keys_checked, 2);
        assert_eq!(result.stats.reads_checked, 7);
    }

    #[test]
    fn test_violation_request_id() {
        let anonymous = Violation::new(ViolationType::LostWrite, "a", "x").with_request_id("");
        assert_eq!(anonymous.request_id, None);

        let named = Violation::new(ViolationType::LostWrite, "a", "x").with_request_id("c1");
        assert_eq!(named.request_id.as_deref(), Some("c1"));
    }
}
