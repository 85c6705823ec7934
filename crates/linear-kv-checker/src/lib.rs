//! Linear-KV Checker - Consistency checking for recorded key/value histories
//!
//! This crate provides checkers over a [`History`] snapshot:
//! - Linearizability of every key as a read/write register
//! - Read-your-writes, per client request id
//! - Monotonic reads, per client request id
//!
//! Checkers are pure and synchronous. Start and end timestamps are the only
//! ground truth; a failing history is a normal [`CheckResult`], not an error.
//!
//! # Example
//!
//! ```rust
//! use linear_kv_checker::{Checker, LinearizabilityChecker};
//! use linear_kv_core::{History, Interval, OperationRecord, Outcome, Timestamp};
//!
//! let iv = |s, e| Interval::new(Timestamp::from_nanos(s), Timestamp::from_nanos(e)).unwrap();
//! let history = History::from_records(vec![
//!     OperationRecord::write("r1", "a", "x", Outcome::Ok, iv(0, 1)),
//!     OperationRecord::read("r2", "a", Some("x".into()), iv(2, 3)),
//! ]);
//!
//! let result = LinearizabilityChecker::new().check(&history);
//! assert!(result.is_pass());
//! ```

pub mod linearizability;
mod register;
pub mod result;
pub mod session;
pub mod suite;
pub mod traits;

// Re-export main types
pub use linearizability::LinearizabilityChecker;
pub use result::{CheckResult, CheckStats, CheckStatus, Violation, ViolationType};
pub use session::{SessionChecker, SessionGuarantee};
pub use suite::CheckSuite;
pub use traits::Checker;

// Re-export core types for convenience
pub use linear_kv_core::{History, OperationId, OperationRecord};

/// Runs the standard suite over `history`.
pub fn check(history: &History) -> CheckResult {
    CheckSuite::standard().check(history)
}
