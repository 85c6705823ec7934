//! Operation records produced by the store.
//!
//! Every executed `put` or `get` becomes one [`OperationRecord`]. Records are
//! immutable once appended to the log; the log assigns each record its
//! [`OperationId`] (its append position).

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::time::{Interval, Timestamp};

/// Append position of a record within an operation log.
///
/// # Examples
///
/// ```
/// use linear_kv_core::OperationId;
///
/// let op_id = OperationId(3);
/// assert_eq!(op_id.to_string(), "#3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A `get`.
    Read,
    /// A `put`.
    Write,
}

impl OpKind {
    /// Returns the verb used on the wire (`GET` / `PUT`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            OpKind::Read => "GET",
            OpKind::Write => "PUT",
        }
    }

    /// Parses the wire verb.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(OpKind::Read),
            "PUT" => Some(OpKind::Write),
            _ => None,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The write was applied, or the read found a value.
    Ok,
    /// The write's request id was already applied; nothing changed.
    Duplicate,
    /// The read found no value for the key.
    NotFound,
}

impl Outcome {
    /// Returns the wire name (`ok` / `duplicate` / `not_found`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Duplicate => "duplicate",
            Outcome::NotFound => "not_found",
        }
    }

    /// Parses the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Outcome::Ok),
            "duplicate" => Some(Outcome::Duplicate),
            "not_found" => Some(Outcome::NotFound),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed operation.
///
/// `value` is always present for writes; for reads it is present iff the key
/// was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// Append position, assigned by the log.
    pub id: OperationId,
    /// Client-supplied request identifier (empty when the client gave none).
    pub request_id: String,
    /// Read or write.
    pub kind: OpKind,
    /// The key operated on.
    pub key: String,
    /// The written or observed value.
    pub value: Option<String>,
    /// The outcome.
    pub outcome: Outcome,
    /// When the operation was invoked and when it completed.
    pub interval: Interval,
}

impl OperationRecord {
    /// Creates a write record.
    pub fn write(
        request_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        outcome: Outcome,
        interval: Interval,
    ) -> Self {
        Self {
            id: OperationId(0),
            request_id: request_id.into(),
            kind: OpKind::Write,
            key: key.into(),
            value: Some(value.into()),
            outcome,
            interval,
        }
    }

    /// Creates a read record; the outcome follows from whether a value was
    /// observed.
    pub fn read(
        request_id: impl Into<String>,
        key: impl Into<String>,
        value: Option<String>,
        interval: Interval,
    ) -> Self {
        let outcome = if value.is_some() {
            Outcome::Ok
        } else {
            Outcome::NotFound
        };

        Self {
            id: OperationId(0),
            request_id: request_id.into(),
            kind: OpKind::Read,
            key: key.into(),
            value,
            outcome,
            interval,
        }
    }

    /// Returns true for reads.
    #[inline]
    pub fn is_read(&self) -> bool {
        self.kind == OpKind::Read
    }

    /// Returns true for writes that mutated the map.
    #[inline]
    pub fn is_applied_write(&self) -> bool {
        self.kind == OpKind::Write && self.outcome == Outcome::Ok
    }

    /// Returns the client identity, if the request carried one.
    pub fn client(&self) -> Option<&str> {
        if self.request_id.is_empty() {
            None
        } else {
            Some(&self.request_id)
        }
    }

    /// Returns the value as a string slice.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.interval.start()
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.interval.end()
    }

    pub fn duration(&self) -> Duration {
        self.interval.duration()
    }

    /// Returns true if this operation completed at or before `other` began.
    #[inline]
    pub fn precedes(&self, other: &OperationRecord) -> bool {
        self.interval.precedes(&other.interval)
    }

    /// Returns a short label for violation messages.
    pub fn label(&self) -> String {
        match self.client() {
            Some(client) => format!("'{}' ({})", client, self.id),
            None => format!("<anonymous> ({})", self.id),
        }
    }
}

impl fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({}", self.id, self.kind, self.key)?;
        if let Some(ref value) = self.value {
            write!(f, ", {:?}", value)?;
        }
        write!(f, ") -> {} {}", self.outcome, self.interval)
    }
}
