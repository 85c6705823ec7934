//! Linear-KV Core - Core types for the linear-kv register.
//!
//! This crate provides the fundamental types shared by the store, the
//! consistency checkers and the report generators:
//!
//! - [`time`]: `Timestamp`, `Interval` and the `Clock` abstraction
//! - [`operation`]: operation records produced by the store
//! - [`history`]: the append-only `OperationLog` and its `History` snapshots
//! - [`error`]: error types shared across the workspace
//!
//! # Overview
//!
//! Every `put`/`get` executed by the store is stamped with a start and an end
//! timestamp and appended to an [`OperationLog`]. A snapshot of that log is a
//! [`History`], which is the input to the linearizability checker.
//!
//! # Example
//!
//! ```
//! use linear_kv_core::{Interval, OperationLog, OperationRecord, Outcome, Timestamp};
//!
//! let log = OperationLog::new();
//! let interval = Interval::new(Timestamp::from_nanos(10), Timestamp::from_nanos(20)).unwrap();
//! log.append(OperationRecord::write("req-1", "a", "x", Outcome::Ok, interval));
//!
//! let history = log.snapshot();
//! assert_eq!(history.len(), 1);
//! ```

pub mod error;
pub mod history;
pub mod operation;
pub mod time;

pub use error::{HistoryError, StoreError};
pub use history::{History, OperationLog};
pub use operation::{OpKind, OperationId, OperationRecord, Outcome};
pub use time::{Clock, Interval, ManualClock, SystemClock, Timestamp};
