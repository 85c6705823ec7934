//! The key/value store.
//!
//! A single [`parking_lot::Mutex`] guards both the key/value map and the set
//! of applied write request ids. The lock is held for the whole inspection
//! and mutation, and the history record is appended before it is released,
//! so a record's end timestamp is taken while exclusivity is still held.

use std::collections::{HashMap, HashSet};

use linear_kv_core::{
    Clock, History, Interval, OperationLog, OperationRecord, Outcome, StoreError, SystemClock,
};
use parking_lot::Mutex;
use tracing::debug;

/// The result of a `get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// The key that was read.
    pub key: String,
    /// The current value, if the key exists.
    pub value: Option<String>,
    /// `Ok` if found, `NotFound` otherwise.
    pub outcome: Outcome,
}

impl ReadResult {
    /// Returns true if the key had a value.
    pub fn found(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    kv: HashMap<String, String>,
    /// Request ids that produced an applied write. Never shrinks.
    seen_writes: HashSet<String>,
}

/// A single-node, strongly consistent key/value register.
///
/// The store is an owned aggregate; share it between callers with an `Arc`.
///
/// # Type Parameters
///
/// * `C` - The clock used to stamp operations.
#[derive(Debug)]
pub struct Store<C = SystemClock> {
    state: Mutex<StoreState>,
    log: OperationLog,
    clock: C,
}

impl Store<SystemClock> {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for Store<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Store<C> {
    /// Creates an empty store using the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            log: OperationLog::new(),
            clock,
        }
    }

    /// Writes `value` under `key`, at most once per `request_id`.
    ///
    /// A repeated `request_id` returns [`Outcome::Duplicate`] and leaves the
    /// map untouched. Both outcomes are recorded in the history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if `request_id` or `key` is
    /// empty. Nothing is recorded in that case.
    pub fn put(&self, request_id: &str, key: &str, value: &str) -> Result<Outcome, StoreError> {
        if request_id.is_empty() || key.is_empty() {
            return Err(StoreError::invalid_argument("requestId and key required"));
        }

        let start = self.clock.now();
        let mut state = self.state.lock();

        let outcome = if state.seen_writes.contains(request_id) {
            Outcome::Duplicate
        } else {
            state.kv.insert(key.to_owned(), value.to_owned());
            state.seen_writes.insert(request_id.to_owned());
            Outcome::Ok
        };

        let end = self.clock.now();
        let interval = Interval::from_readings(start, end);
        let op_id = self.log.append(OperationRecord::write(
            request_id, key, value, outcome, interval,
        ));
        drop(state);

        debug!(%op_id, request_id, key, %outcome, "put");
        Ok(outcome)
    }

    /// Reads the current value of `key`.
    ///
    /// `request_id` only attributes the read in the history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if `key` is empty.
    pub fn get(&self, key: &str, request_id: Option<&str>) -> Result<ReadResult, StoreError> {
        if key.is_empty() {
            return Err(StoreError::invalid_argument("key required"));
        }

        let start = self.clock.now();
        let state = self.state.lock();

        let value = state.kv.get(key).cloned();

        let end = self.clock.now();
        let record = OperationRecord::read(
            request_id.unwrap_or_default(),
            key,
            value.clone(),
            Interval::from_readings(start, end),
        );
        let outcome = record.outcome;
        let op_id = self.log.append(record);
        drop(state);

        debug!(%op_id, key, %outcome, "get");
        Ok(ReadResult {
            key: key.to_owned(),
            value,
            outcome,
        })
    }

    /// Returns a snapshot of every recorded operation.
    ///
    /// Only the log's own lock is taken, and only for the copy.
    pub fn history(&self) -> History {
        self.log.snapshot()
    }

    /// Returns the number of recorded operations.
    pub fn history_len(&self) -> usize {
        self.log.len()
    }

    /// Returns the current value of `key` without recording a read.
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.state.lock().kv.get(key).cloned()
    }

    /// Returns the number of keys with a value.
    pub fn len(&self) -> usize {
        self.state.lock().kv.len()
    }

    /// Returns true if no key has a value.
    pub fn is_empty(&self) -> bool {
        self.state.lock().kv.is_empty()
    }
}
