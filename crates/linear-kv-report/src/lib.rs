//! # linear-kv-report
//!
//! Presentation of recorded histories and check results.
//!
//! ## Features
//!
//! - **History export**: [`history_to_json`] writes the wire format served on
//!   `/history`; [`history_from_json`] reads it back for offline checking
//! - **Check reports**: [`CheckReport`] is the `/check` response body
//! - **Timeline visualization**: [`TimelineRenderer`] draws each operation's
//!   interval as an ASCII bar
//!
//! ## Example
//!
//! ```rust
//! use linear_kv_core::{History, Interval, OperationRecord, Outcome, Timestamp};
//! use linear_kv_report::{history_from_json, history_to_json, JsonFormat, TimelineRenderer};
//!
//! let interval = Interval::new(Timestamp::from_nanos(0), Timestamp::from_nanos(10)).unwrap();
//! let history = History::from_records(vec![
//!     OperationRecord::write("r1", "a", "x", Outcome::Ok, interval),
//! ]);
//!
//! let json = history_to_json(&history, JsonFormat::Pretty).unwrap();
//! assert_eq!(history_from_json(&json).unwrap(), history);
//!
//! let timeline = TimelineRenderer::new().render(&history);
//! assert!(timeline.starts_with("Timeline Visualization"));
//! ```

pub mod json;
pub mod timeline;
pub mod types;

pub use json::{
    check_report_to_json, history_from_file, history_from_json, history_to_json, JsonFormat,
};
pub use timeline::{TimelineRenderer, EMPTY_TIMELINE};
pub use types::{CheckReport, HistoryEntry, ReportError};
