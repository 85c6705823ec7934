//! Core trait for consistency checkers.

use linear_kv_core::History;

use crate::CheckResult;

/// A consistency checker that validates histories against some consistency
/// model.
///
/// Checkers are pure: they read a snapshot and never fail operationally. A
/// history that violates the model is reported through the returned
/// [`CheckResult`], not as an error.
///
/// # Example
///
/// ```rust
/// use linear_kv_checker::{CheckResult, Checker};
/// use linear_kv_core::History;
///
/// struct AlwaysPass;
///
/// impl Checker for AlwaysPass {
///     fn name(&self) -> &str {
///         "always-pass"
///     }
///
///     fn check(&self, _history: &History) -> CheckResult {
///         CheckResult::pass()
///     }
/// }
///
/// assert!(AlwaysPass.check(&History::new()).is_pass());
/// ```
pub trait Checker: Send + Sync {
    /// Returns the name of this checker for logging and debugging.
    fn name(&self) -> &str;

    /// Check the entire history for consistency violations.
    fn check(&self, history: &History) -> CheckResult;

    /// Get a description of what this checker validates.
    fn description(&self) -> &str {
        "No description available"
    }
}
