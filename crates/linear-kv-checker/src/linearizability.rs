//! Linearizability checker for a collection of independent registers.
//!
//! # Algorithm Overview
//!
//! Keys never interact, so the history is split per key and each key is
//! checked as a single read/write register:
//!
//! 1. Drop duplicate writes; they performed no mutation.
//! 2. For every read, collect the applied writes it could have observed: same
//!    value, and not started after the read completed. A read that found
//!    nothing may only observe the initial empty state.
//! 3. A source survives unless some write of a different value is forced by
//!    real time to sit strictly between the source and the read. The initial
//!    state is overwritten by any write that completed before the read began.
//! 4. A key is consistent iff every read keeps at least one surviving source.
//!
//! Only start and end timestamps are trusted, so overlapping operations may
//! linearize in either order and are never flagged on their own.
//!
//! # Complexity
//!
//! Writes are kept sorted by start, so the search for intervening writes skips
//! everything that starts before the source ends. The check is polynomial in
//! the number of operations per key; no backtracking search is needed.

use std::time::Instant;

use linear_kv_core::{History, OperationRecord};
use tracing::{debug, trace};

use crate::register::KeyHistory;
use crate::result::{CheckResult, CheckStats, Violation, ViolationType};
use crate::traits::Checker;

/// Checks that every key of a history behaves as a linearizable register.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearizabilityChecker;

impl LinearizabilityChecker {
    /// Create a new linearizability checker.
    pub fn new() -> Self {
        Self
    }

    fn check_key(
        &self,
        key: &KeyHistory<'_>,
        stats: &mut CheckStats,
        violations: &mut Vec<Violation>,
    ) {
        for read in &key.reads {
            stats.reads_checked += 1;

            let violation = match read.value_str() {
                Some(value) => {
                    let sources = key.possible_sources(read);
                    stats.candidates_considered += sources.len() as u64;
                    let survives = sources.iter().any(|source| {
                        !key
                            .writes_between(source, read)
                            .any(|w| w.value_str() != Some(value))
                    });
                    if survives {
                        continue;
                    }
                    self.classify_found(key, read, value, &sources)
                }
                None => {
                    stats.candidates_considered += 1;
                    match key.writes_before(read).last() {
                        None => continue,
                        Some(write) => Violation::new(
                            ViolationType::LostWrite,
                            key.key,
                            format!(
                                "key '{}': read {} found nothing although write {} had completed",
                                key.key,
                                read.label(),
                                write.label()
                            ),
                        )
                        .with_operations(vec![read.id, write.id]),
                    }
                }
            };

            let violation = violation.with_request_id(&read.request_id);
            debug!(key = key.key, op_id = %read.id, "{}", violation);
            violations.push(violation);
        }
    }

    fn classify_found(
        &self,
        key: &KeyHistory<'_>,
        read: &OperationRecord,
        value: &str,
        sources: &[&OperationRecord],
    ) -> Violation {
        if !key.was_written(value) {
            return Violation::new(
                ViolationType::PhantomRead,
                key.key,
                format!(
                    "key '{}': read {} returned {:?}, which no write ever stored",
                    key.key,
                    read.label(),
                    value
                ),
            )
            .with_operations(vec![read.id]);
        }

        if sources.is_empty() {
            let writes = key
                .writes
                .iter()
                .filter(|w| w.value_str() == Some(value))
                .map(|w| w.id);
            return Violation::new(
                ViolationType::FutureRead,
                key.key,
                format!(
                    "key '{}': read {} returned {:?} before any write of it began",
                    key.key,
                    read.label(),
                    value
                ),
            )
            .with_operations(std::iter::once(read.id).chain(writes).collect());
        }

        let overwrites: Vec<_> = sources
            .iter()
            .flat_map(|source| key.writes_between(source, read))
            .filter(|w| w.value_str() != Some(value))
            .map(|w| w.id)
            .collect();
        Violation::new(
            ViolationType::StaleRead,
            key.key,
            format!(
                "key '{}': read {} returned {:?}, which was overwritten before the read began",
                key.key,
                read.label(),
                value
            ),
        )
        .with_operations(std::iter::once(read.id).chain(overwrites).collect())
    }
}

impl Checker for LinearizabilityChecker {
    fn name(&self) -> &str {
        "linearizability"
    }

    fn check(&self, history: &History) -> CheckResult {
        let start = Instant::now();

        if history.is_empty() {
            return CheckResult::pass().with_duration(start.elapsed());
        }

        let keys = KeyHistory::all(history);
        let mut stats = CheckStats {
            num_operations: history.len(),
            keys_checked: keys.len(),
            ..CheckStats::default()
        };
        let mut violations = Vec::new();

        for key in &keys {
            trace!(
                key = key.key,
                writes = key.writes.len(),
                reads = key.reads.len(),
                "checking key"
            );
            self.check_key(key, &mut stats, &mut violations);
        }

        CheckResult::from_violations(violations)
            .with_stats(stats)
            .with_duration(start.elapsed())
    }

    fn description(&self) -> &str {
        "Checks that every key behaves as a linearizable read/write register"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linear_kv_core::{Interval, OperationId, Outcome, Timestamp};
    use proptest::prelude::*;

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(Timestamp::from_nanos(start), Timestamp::from_nanos(end)).unwrap()
    }

    fn put(id: &str, key: &str, value: &str, start: u64, end: u64) -> OperationRecord {
        OperationRecord::write(id, key, value, Outcome::Ok, iv(start, end))
    }

    fn get(id: &str, key: &str, value: Option<&str>, start: u64, end: u64) -> OperationRecord {
        OperationRecord::read(id, key, value.map(str::to_owned), iv(start, end))
    }

    fn check(records: Vec<OperationRecord>) -> CheckResult {
        LinearizabilityChecker::new().check(&History::from_records(records))
    }

    #[test]
    fn test_empty_history() {
        let result = check(Vec::new());
        assert!(result.is_pass());
        assert_eq!(result.stats.num_operations, 0);
    }

    #[test]
    fn test_duplicate_only_history() {
        let result = check(vec![
            OperationRecord::write("r1", "a", "x", Outcome::Duplicate, iv(0, 1)),
            OperationRecord::write("r1", "a", "x", Outcome::Duplicate, iv(2, 3)),
        ]);
        assert!(result.is_pass());
    }

    #[test]
    fn test_sequential_history() {
        let result = check(vec![
            get("c1", "a", None, 0, 1),
            put("w1", "a", "x", 2, 3),
            get("c1", "a", Some("x"), 4, 5),
            put("w2", "a", "y", 6, 7),
            get("c2", "a", Some("y"), 8, 9),
        ]);
        assert!(result.is_pass());
        assert_eq!(result.stats.reads_checked, 3);
        assert_eq!(result.stats.keys_checked, 1);
    }

    #[test]
    fn test_future_read_names_key() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            get("c1", "a", Some("y"), 2, 5),
            put("w2", "a", "y", 5, 6),
        ]);

        assert!(result.is_fail());
        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.violation_type, ViolationType::FutureRead);
        assert_eq!(violation.key, "a");
        assert_eq!(violation.request_id.as_deref(), Some("c1"));
        assert_eq!(violation.operations, vec![OperationId(1), OperationId(2)]);
        assert!(result.messages()[0].contains("key 'a'"));
    }

    #[test]
    fn test_overlapping_writes_either_order() {
        // Both writes overlap each other and the reads, so any value is fine.
        let result = check(vec![
            put("w1", "a", "x", 0, 10),
            put("w2", "a", "y", 1, 9),
            get("c1", "a", Some("x"), 5, 12),
            get("c2", "a", Some("y"), 6, 13),
        ]);
        assert!(result.is_pass());
    }

    #[test]
    fn test_read_concurrent_with_later_write() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            put("w2", "a", "y", 2, 6),
            get("c1", "a", Some("x"), 3, 4),
            get("c2", "a", Some("y"), 4, 5),
        ]);
        assert!(result.is_pass());
    }

    #[test]
    fn test_stale_read() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            put("w2", "a", "y", 2, 3),
            get("c1", "a", Some("x"), 4, 5),
        ]);

        assert!(result.is_fail());
        let violation = &result.violations[0];
        assert_eq!(violation.violation_type, ViolationType::StaleRead);
        assert_eq!(violation.operations, vec![OperationId(2), OperationId(1)]);
    }

    #[test]
    fn test_rewrite_of_same_value_is_not_stale() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            put("w2", "a", "y", 2, 3),
            put("w3", "a", "x", 4, 5),
            get("c1", "a", Some("x"), 6, 7),
        ]);
        assert!(result.is_pass());
    }

    #[test]
    fn test_phantom_read() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            get("c1", "a", Some("ghost"), 2, 3),
        ]);
        assert_eq!(
            result.violations[0].violation_type,
            ViolationType::PhantomRead
        );
    }

    #[test]
    fn test_duplicate_write_is_not_a_source() {
        let result = check(vec![
            OperationRecord::write("w1", "a", "x", Outcome::Duplicate, iv(0, 1)),
            get("c1", "a", Some("x"), 2, 3),
        ]);
        assert_eq!(
            result.violations[0].violation_type,
            ViolationType::PhantomRead
        );
    }

    #[test]
    fn test_lost_write() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            get("", "a", None, 2, 3),
        ]);

        assert!(result.is_fail());
        let violation = &result.violations[0];
        assert_eq!(violation.violation_type, ViolationType::LostWrite);
        assert_eq!(violation.request_id, None);
    }

    #[test]
    fn test_not_found_concurrent_with_first_write() {
        let result = check(vec![
            put("w1", "a", "x", 0, 10),
            get("c1", "a", None, 5, 6),
        ]);
        assert!(result.is_pass());
    }

    #[test]
    fn test_keys_are_independent() {
        let result = check(vec![
            put("w1", "a", "x", 0, 1),
            get("c1", "b", None, 2, 3),
            put("w2", "b", "y", 4, 5),
            get("c1", "a", Some("x"), 6, 7),
        ]);
        assert!(result.is_pass());
        assert_eq!(result.stats.keys_checked, 2);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Put(u8, u8),
        Get(u8),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0u8..3, 0u8..4).prop_map(|(k, v)| Step::Put(k, v)),
            (0u8..3).prop_map(Step::Get),
        ]
    }

    proptest! {
        #[test]
        fn prop_sequential_register_is_linearizable(
            steps in prop::collection::vec(step(), 0..60),
            gaps in prop::collection::vec(0u64..3, 60),
        ) {
            let mut state = std::collections::HashMap::new();
            let mut records = Vec::new();
            let mut now = 0u64;

            for (i, (op, gap)) in steps.iter().zip(gaps.iter()).enumerate() {
                let start = now + gap;
                let end = start + 1 + gap;
                now = end;
                match op {
                    Step::Put(k, v) => {
                        let (key, value) = (format!("k{k}"), format!("v{v}"));
                        state.insert(key.clone(), value.clone());
                        records.push(put(&format!("r{i}"), &key, &value, start, end));
                    }
                    Step::Get(k) => {
                        let key = format!("k{k}");
                        let value = state.get(&key).map(String::as_str);
                        records.push(get("c1", &key, value, start, end));
                    }
                }
            }

            let result = check(records);
            prop_assert!(result.is_pass(), "{:?}", result.messages());
        }

        /// Operations take effect at increasing instants but their recorded
        /// intervals are widened around those instants, so neighbours overlap
        /// and reads have several possible sources.
        #[test]
        fn prop_overlapping_register_execution_is_linearizable(
            steps in prop::collection::vec((step(), 0u8..4, any::<bool>()), 0..60),
            widths in prop::collection::vec((0u64..35, 0u64..35), 60),
        ) {
            let mut state = std::collections::HashMap::new();
            let mut applied = std::collections::HashSet::new();
            let mut records = Vec::new();

            for (i, ((op, client, retry), (before, after))) in
                steps.iter().zip(widths.iter()).enumerate()
            {
                let point = 100 + 10 * i as u64;
                let (start, end) = (point - before, point + after);
                match op {
                    Step::Put(k, v) => {
                        let (key, value) = (format!("k{k}"), format!("v{v}"));
                        let request_id = if *retry && i > 0 {
                            format!("r{}", i - 1)
                        } else {
                            format!("r{i}")
                        };
                        let outcome = if applied.insert(request_id.clone()) {
                            state.insert(key.clone(), value.clone());
                            Outcome::Ok
                        } else {
                            Outcome::Duplicate
                        };
                        records.push(OperationRecord::write(
                            &request_id,
                            &key,
                            &value,
                            outcome,
                            iv(start, end),
                        ));
                    }
                    Step::Get(k) => {
                        let key = format!("k{k}");
                        let value = state.get(&key).map(String::as_str);
                        // Reads borrow the request id of an earlier step so
                        // some of them belong to a writer's session.
                        let request_id = if *client == 0 {
                            String::new()
                        } else {
                            format!("r{}", i.saturating_sub(usize::from(*client)))
                        };
                        records.push(get(&request_id, &key, value, start, end));
                    }
                }
            }

            let result = crate::CheckSuite::standard().check(&History::from_records(records));
            prop_assert!(result.is_pass(), "{:?}", result.messages());
        }
    }
}
