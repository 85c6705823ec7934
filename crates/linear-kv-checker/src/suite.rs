//! A set of checkers run together over one history.

use std::time::Instant;

use linear_kv_core::History;
use tracing::{debug, info, instrument};

use crate::linearizability::LinearizabilityChecker;
use crate::result::CheckResult;
use crate::session::SessionChecker;
use crate::traits::Checker;

/// Runs several checkers over the same history and merges their results.
///
/// Violations are reported in checker order.
pub struct CheckSuite {
    checkers: Vec<Box<dyn Checker>>,
}

impl CheckSuite {
    /// Create an empty suite. An empty suite passes every history.
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
        }
    }

    /// The register check plus both session guarantees.
    pub fn standard() -> Self {
        Self::new()
            .with_checker(LinearizabilityChecker::new())
            .with_checker(SessionChecker::read_your_writes())
            .with_checker(SessionChecker::monotonic_reads())
    }

    /// Add a checker to the suite.
    pub fn with_checker(mut self, checker: impl Checker + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    /// Names of the checkers in the suite, in run order.
    pub fn names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// Number of checkers in the suite.
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    /// Returns true if the suite has no checkers.
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Run every checker and merge the results.
    #[instrument(skip(self, history), fields(ops = history.len(), checkers = self.checkers.len()))]
    pub fn check(&self, history: &History) -> CheckResult {
        let start = Instant::now();
        let mut result = CheckResult::pass();
        result.stats.num_operations = history.len();

        for checker in &self.checkers {
            let partial = checker.check(history);
            debug!(
                checker = checker.name(),
                status = %partial.status,
                violations = partial.violations.len(),
                "checker finished"
            );
            result.merge(partial);
        }

        let result = result.with_duration(start.elapsed());
        info!(
            status = %result.status,
            violations = result.violations.len(),
            duration_us = result.duration.map(|d| d.as_micros() as u64).unwrap_or_default(),
            "history checked"
        );
        result
    }
}

impl Default for CheckSuite {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for CheckSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSuite")
            .field("checkers", &self.names())
            .finish()
    }
}

impl Checker for CheckSuite {
    fn name(&self) -> &str {
        "suite"
    }

    fn check(&self, history: &History) -> CheckResult {
        CheckSuite::check(self, history)
    }

    fn description(&self) -> &str {
        "Runs a set of checkers and merges their results"
    }
}
