//! Per-key register view of a history.
//!
//! Keys are independent registers, so every checker works one key at a time.
//! A [`KeyHistory`] holds the applied writes and the reads of one key, both
//! sorted by start time. Duplicate writes made no mutation and are dropped.

use std::collections::BTreeMap;

use linear_kv_core::{History, OperationRecord, Outcome};

pub(crate) struct KeyHistory<'a> {
    pub key: &'a str,
    /// Applied writes, sorted by start time.
    pub writes: Vec<&'a OperationRecord>,
    /// Reads (found or not found), sorted by start time.
    pub reads: Vec<&'a OperationRecord>,
}

impl<'a> KeyHistory<'a> {
    /// Builds the view of one key from start-sorted operations.
    pub fn new(key: &'a str, ops: &[&'a OperationRecord]) -> Self {
        let writes = ops
            .iter()
            .copied()
            .filter(|op| op.is_applied_write())
            .collect();
        let reads = ops
            .iter()
            .copied()
            .filter(|op| op.is_read() && op.outcome != Outcome::Duplicate)
            .collect();

        Self { key, writes, reads }
    }

    /// Builds the view of every key in the history, in key order.
    pub fn all(history: &'a History) -> Vec<KeyHistory<'a>> {
        history
            .by_key()
            .into_iter()
            .map(|(key, ops)| KeyHistory::new(key, &ops))
            .collect()
    }

    /// Writes that stored the value `read` observed and are not forced to
    /// happen after it.
    ///
    /// Empty for reads that found nothing.
    pub fn possible_sources(&self, read: &OperationRecord) -> Vec<&'a OperationRecord> {
        match read.value_str() {
            Some(value) => self
                .writes
                .iter()
                .copied()
                .filter(|w| w.value_str() == Some(value) && !read.precedes(w))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns true if any write ever stored `value`.
    pub fn was_written(&self, value: &str) -> bool {
        self.writes.iter().any(|w| w.value_str() == Some(value))
    }

    /// Reads grouped by request id, each group in start order.
    ///
    /// Anonymous reads belong to no client and are skipped.
    pub fn reads_by_client(&self) -> BTreeMap<&'a str, Vec<&'a OperationRecord>> {
        let mut clients: BTreeMap<&str, Vec<&OperationRecord>> = BTreeMap::new();
        for read in self.reads.iter().copied() {
            if let Some(client) = read.client() {
                clients.entry(client).or_default().push(read);
            }
        }
        clients
    }

    /// The latest applied write by `client` that completed before `read` began.
    pub fn own_write_before(
        &self,
        client: &str,
        read: &OperationRecord,
    ) -> Option<&'a OperationRecord> {
        self.writes_before(read)
            .filter(|w| w.client() == Some(client))
            .last()
    }

    /// Writes forced strictly between `after` and `before` by real time:
    /// `after ≺ w` and `w ≺ before`.
    pub fn writes_between<'s>(
        &'s self,
        after: &'s OperationRecord,
        before: &'s OperationRecord,
    ) -> impl Iterator<Item = &'a OperationRecord> + 's {
        let first = self.writes.partition_point(|w| w.start() < after.end());
        self.writes[first..]
            .iter()
            .copied()
            .take_while(move |w| w.start() <= before.start())
            .filter(move |w| w.id != after.id && w.precedes(before))
    }

    /// Writes that completed at or before `read` began.
    pub fn writes_before<'s>(
        &'s self,
        read: &'s OperationRecord,
    ) -> impl Iterator<Item = &'a OperationRecord> + 's {
        self.writes
            .iter()
            .copied()
            .take_while(move |w| w.start() <= read.start())
            .filter(move |w| w.precedes(read))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linear_kv_core::{Interval, OperationId, Timestamp};

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(Timestamp::from_nanos(start), Timestamp::from_nanos(end)).unwrap()
    }

    fn history() -> History {
        History::from_records(vec![
            OperationRecord::write("w1", "k", "x", Outcome::Ok, iv(0, 10)),
            OperationRecord::write("w1", "k", "x", Outcome::Duplicate, iv(11, 12)),
            OperationRecord::write("w2", "k", "y", Outcome::Ok, iv(20, 30)),
            OperationRecord::write("w3", "k", "z", Outcome::Ok, iv(25, 60)),
            OperationRecord::read("c1", "k", Some("x".into()), iv(40, 50)),
        ])
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let history = history();
        let keys = KeyHistory::all(&history);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].writes.len(), 3);
        assert_eq!(keys[0].reads.len(), 1);
    }

    #[test]
    fn test_possible_sources() {
        let history = history();
        let keys = KeyHistory::all(&history);
        let read = keys[0].reads[0];

        let sources: Vec<_> = keys[0].possible_sources(read).iter().map(|w| w.id).collect();
        assert_eq!(sources, vec![OperationId(0)]);
        assert!(keys[0].was_written("z"));
        assert!(!keys[0].was_written("q"));
    }

    #[test]
    fn test_writes_between_only_forced_writes() {
        let history = history();
        let keys = KeyHistory::all(&history);
        let read = keys[0].reads[0];
        let source = keys[0].writes[0];

        // w2 sits strictly between; w3 overlaps the read.
        let between: Vec<_> = keys[0]
            .writes_between(source, read)
            .map(|w| w.id)
            .collect();
        assert_eq!(between, vec![OperationId(2)]);

        let before: Vec<_> = keys[0].writes_before(read).map(|w| w.id).collect();
        assert_eq!(before, vec![OperationId(0), OperationId(2)]);
    }

    #[test]
    fn test_reads_by_client() {
        let history = History::from_records(vec![
            OperationRecord::write("c1", "k", "x", Outcome::Ok, iv(0, 1)),
            OperationRecord::read("c1", "k", Some("x".into()), iv(2, 3)),
            OperationRecord::read("", "k", None, iv(4, 5)),
            OperationRecord::read("c2", "k", Some("x".into()), iv(6, 7)),
        ]);
        let keys = KeyHistory::all(&history);
        let clients = keys[0].reads_by_client();

        assert_eq!(clients.keys().copied().collect::<Vec<_>>(), vec!["c1", "c2"]);
        assert_eq!(clients["c1"].len(), 1);

        let read = clients["c1"][0];
        assert_eq!(keys[0].own_write_before("c1", read).map(|w| w.id), Some(OperationId(0)));
        assert!(keys[0].own_write_before("c2", read).is_none());
    }
}
