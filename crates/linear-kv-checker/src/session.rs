//! Session guarantee checkers.
//!
//! A client is identified by the request id it attaches to its operations.
//! Both guarantees are checked per key, over that client's reads only.
//! Reads with no possible source are left to the linearizability checker.

use std::fmt;
use std::time::Instant;

use linear_kv_core::{History, OperationRecord};
use tracing::debug;

use crate::register::KeyHistory;
use crate::result::{CheckResult, CheckStats, Violation, ViolationType};
use crate::traits::Checker;

/// Session guarantees that can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionGuarantee {
    /// A read that starts after the client's own write completed sees that
    /// write or something newer.
    ReadYourWrites,
    /// A client never observes an older value after a newer one.
    MonotonicReads,
}

impl SessionGuarantee {
    /// Returns the checker name for this guarantee.
    pub fn name(&self) -> &'static str {
        match self {
            SessionGuarantee::ReadYourWrites => "read-your-writes",
            SessionGuarantee::MonotonicReads => "monotonic-reads",
        }
    }
}

impl fmt::Display for SessionGuarantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks one session guarantee over every client of a history.
#[derive(Debug, Clone, Copy)]
pub struct SessionChecker {
    guarantee: SessionGuarantee,
}

impl SessionChecker {
    /// Create a checker for the given guarantee.
    pub fn new(guarantee: SessionGuarantee) -> Self {
        Self { guarantee }
    }

    /// Create a read-your-writes checker.
    pub fn read_your_writes() -> Self {
        Self::new(SessionGuarantee::ReadYourWrites)
    }

    /// Create a monotonic-reads checker.
    pub fn monotonic_reads() -> Self {
        Self::new(SessionGuarantee::MonotonicReads)
    }

    /// The guarantee this checker validates.
    pub fn guarantee(&self) -> SessionGuarantee {
        self.guarantee
    }

    fn check_read_your_writes(
        &self,
        key: &KeyHistory<'_>,
        client: &str,
        reads: &[&OperationRecord],
        stats: &mut CheckStats,
        violations: &mut Vec<Violation>,
    ) {
        for read in reads {
            let Some(own) = key.own_write_before(client, read) else {
                continue;
            };

            let Some(value) = read.value_str() else {
                violations.push(
                    Violation::new(
                        ViolationType::ReadYourWrites,
                        key.key,
                        format!(
                            "key '{}': client '{}' read {} found nothing after its write {} completed",
                            key.key,
                            client,
                            read.label(),
                            own.label()
                        ),
                    )
                    .with_request_id(client)
                    .with_operations(vec![read.id, own.id]),
                );
                continue;
            };

            let sources = key.possible_sources(read);
            stats.candidates_considered += sources.len() as u64;
            if sources.is_empty() {
                continue;
            }

            if sources.iter().all(|s| s.id != own.id && s.precedes(own)) {
                violations.push(
                    Violation::new(
                        ViolationType::ReadYourWrites,
                        key.key,
                        format!(
                            "key '{}': client '{}' read {} returned {:?}, older than its write {}",
                            key.key,
                            client,
                            read.label(),
                            value,
                            own.label()
                        ),
                    )
                    .with_request_id(client)
                    .with_operations(vec![read.id, own.id]),
                );
            }
        }
    }

    fn check_monotonic_reads(
        &self,
        key: &KeyHistory<'_>,
        client: &str,
        reads: &[&OperationRecord],
        stats: &mut CheckStats,
        violations: &mut Vec<Violation>,
    ) {
        let sources: Vec<Vec<&OperationRecord>> =
            reads.iter().map(|read| key.possible_sources(read)).collect();
        stats.candidates_considered += sources.iter().map(|s| s.len() as u64).sum::<u64>();

        for (j, later) in reads.iter().enumerate() {
            for (i, earlier) in reads[..j].iter().enumerate() {
                if !earlier.precedes(later) {
                    continue;
                }
                let Some(seen) = earlier.value_str() else {
                    continue;
                };

                let description = match later.value_str() {
                    None => format!(
                        "key '{}': client '{}' read {} found nothing after read {} had seen {:?}",
                        key.key,
                        client,
                        later.label(),
                        earlier.label(),
                        seen
                    ),
                    Some(value) if value != seen && is_older(&sources[j], &sources[i]) => {
                        format!(
                            "key '{}': client '{}' read {} returned {:?} after read {} had seen the newer {:?}",
                            key.key,
                            client,
                            later.label(),
                            value,
                            earlier.label(),
                            seen
                        )
                    }
                    Some(_) => continue,
                };

                violations.push(
                    Violation::new(ViolationType::MonotonicReads, key.key, description)
                        .with_request_id(client)
                        .with_operations(vec![later.id, earlier.id]),
                );
                break;
            }
        }
    }
}

/// Returns true if every write in `older` completed before every write in
/// `newer` began. Empty sets are never ordered.
fn is_older(older: &[&OperationRecord], newer: &[&OperationRecord]) -> bool {
    !older.is_empty()
        && !newer.is_empty()
        && older
            .iter()
            .all(|w2| newer.iter().all(|w1| w2.precedes(w1)))
}

impl Checker for SessionChecker {
    fn name(&self) -> &str {
        self.guarantee.name()
    }

    fn check(&self, history: &History) -> CheckResult {
        let start = Instant::now();

        let keys = KeyHistory::all(history);
        let mut stats = CheckStats {
            num_operations: history.len(),
            keys_checked: keys.len(),
            ..CheckStats::default()
        };
        let mut violations = Vec::new();

        for key in &keys {
            for (client, reads) in key.reads_by_client() {
                stats.reads_checked += reads.len() as u64;
                match self.guarantee {
                    SessionGuarantee::ReadYourWrites => self.check_read_your_writes(
                        key,
                        client,
                        &reads,
                        &mut stats,
                        &mut violations,
                    ),
                    SessionGuarantee::MonotonicReads => self.check_monotonic_reads(
                        key,
                        client,
                        &reads,
                        &mut stats,
                        &mut violations,
                    ),
                }
            }
        }

        if !violations.is_empty() {
            debug!(
                guarantee = %self.guarantee,
                violations = violations.len(),
                "session guarantee violated"
            );
        }

        CheckResult::from_violations(violations)
            .with_stats(stats)
            .with_duration(start.elapsed())
    }

    fn description(&self) -> &str {
        match self.guarantee {
            SessionGuarantee::ReadYourWrites => {
                "Checks that each client observes its own completed writes"
            }
            SessionGuarantee::MonotonicReads => {
                "Checks that no client observes a value older than one it already saw"
            }
        }
    }
}
