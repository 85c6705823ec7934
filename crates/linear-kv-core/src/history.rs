//! The append-only operation log and its snapshots.
//!
//! The store appends one record per executed operation to an
//! [`OperationLog`]. A [`History`] is an independent copy of the log taken by
//! [`OperationLog::snapshot`]; later appends never affect it.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::operation::{OperationId, OperationRecord};
use crate::time::Interval;

/// Append-only, thread-safe sequence of completed operations.
///
/// Records are kept in append (completion) order and are never removed or
/// rewritten.
#[derive(Debug)]
pub struct OperationLog {
    records: Mutex<Vec<OperationRecord>>,
}

impl OperationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Creates an empty log with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Appends a record and returns the id assigned to it.
    pub fn append(&self, mut record: OperationRecord) -> OperationId {
        let mut records = self.records.lock();
        let id = OperationId(records.len() as u64);
        record.id = id;
        records.push(record);
        id
    }

    /// Returns a copy of every record appended so far.
    ///
    /// The log lock is held only for the copy.
    pub fn snapshot(&self) -> History {
        let operations = self.records.lock().clone();
        History { operations }
    }

    /// Returns the number of records in the log.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable snapshot of an operation log.
///
/// This is the input to the consistency checkers and the report generators.
/// Operations are stored in append order; the grouping helpers return
/// references sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    operations: Vec<OperationRecord>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from records in append order, assigning ids by
    /// position.
    pub fn from_records(records: impl IntoIterator<Item = OperationRecord>) -> Self {
        let operations = records
            .into_iter()
            .enumerate()
            .map(|(i, mut record)| {
                record.id = OperationId(i as u64);
                record
            })
            .collect();
        Self { operations }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the operations in append order.
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Returns an iterator over the operations in append order.
    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter()
    }

    /// Returns the operations sorted by start time.
    ///
    /// Ties are broken by end time, then by append position.
    pub fn sorted_by_start(&self) -> Vec<&OperationRecord> {
        let mut ops: Vec<_> = self.operations.iter().collect();
        sort_by_start(&mut ops);
        ops
    }

    /// Groups the operations by key, each group sorted by start time.
    pub fn by_key(&self) -> BTreeMap<&str, Vec<&OperationRecord>> {
        let mut groups: BTreeMap<&str, Vec<&OperationRecord>> = BTreeMap::new();
        for op in &self.operations {
            groups.entry(op.key.as_str()).or_default().push(op);
        }
        for ops in groups.values_mut() {
            sort_by_start(ops);
        }
        groups
    }

    /// Returns the interval from the earliest start to the latest end.
    pub fn span(&self) -> Option<Interval> {
        let mut iter = self.operations.iter();
        let first = iter.next()?.interval;
        Some(iter.fold(first, |acc, op| acc.cover(&op.interval)))
    }
}

fn sort_by_start(ops: &mut [&OperationRecord]) {
    ops.sort_by_key(|op| (op.start(), op.end(), op.id));
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a OperationRecord;
    type IntoIter = std::slice::Iter<'a, OperationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl IntoIterator for History {
    type Item = OperationRecord;
    type IntoIter = std::vec::IntoIter<OperationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl std::ops::Index<usize> for History {
    type Output = OperationRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.operations[index]
    }
}
