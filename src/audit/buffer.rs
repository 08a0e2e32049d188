// Bounded in-memory queue of pending records.
//
// A snapshot-and-remove-by-identity contract lets the Flusher borrow a
// point-in-time copy while producers keep appending underneath it.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::record::AuditRecord;

/// Buffer of not-yet-persisted audit records.
///
/// A single mutex guards all mutation; `add`/`add_all` never block on
/// anything but that mutex, so `add` never blocks the caller on I/O. The
/// `buffer_size` capacity is enforced by callers (the Ingestion API) as a
/// flush trigger, not here as a hard cap.
pub struct Buffer {
    records: Mutex<VecDeque<AuditRecord>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add(&self, record: AuditRecord) {
        self.records.lock().push_back(record);
    }

    /// Appends a batch atomically with respect to other `add`/`add_all`
    /// calls -- no interleaving within the batch.
    pub fn add_all(&self, records: impl IntoIterator<Item = AuditRecord>) {
        let mut guard = self.records.lock();
        guard.extend(records);
    }

    pub fn size(&self) -> usize {
        self.records.lock().len()
    }

    /// A consistent point-in-time copy, in Buffer order. Concurrent
    /// producers may continue to append after this returns.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Removes exactly the records of a prior snapshot, preserving any
    /// records that arrived afterward. Matched by `event_id`, since a
    /// snapshot is a prefix-plus-subset of whatever the Buffer holds at
    /// removal time, not necessarily a contiguous prefix.
    pub fn remove_drained(&self, drained: &[AuditRecord]) {
        if drained.is_empty() {
            return;
        }
        let drained_ids: std::collections::HashSet<&str> =
            drained.iter().map(|r| r.event_id.as_str()).collect();
        let mut guard = self.records.lock();
        guard.retain(|r| !drained_ids.contains(r.event_id.as_str()));
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::sample;

    #[test]
    fn add_then_snapshot_preserves_order() {
        let buffer = Buffer::new();
        buffer.add(sample("E1"));
        buffer.add(sample("E2"));
        let snap = buffer.snapshot();
        assert_eq!(snap.iter().map(|r| r.event_id.as_str()).collect::<Vec<_>>(), vec!["E1", "E2"]);
    }

    #[test]
    fn remove_drained_preserves_records_that_arrived_after_snapshot() {
        let buffer = Buffer::new();
        buffer.add(sample("E1"));
        buffer.add(sample("E2"));
        let snap = buffer.snapshot();

        buffer.add(sample("E3"));
        buffer.remove_drained(&snap);

        let remaining = buffer.snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].event_id, "E3");
    }

    #[test]
    fn add_all_is_atomic_with_respect_to_interleaving() {
        let buffer = Buffer::new();
        buffer.add_all(vec![sample("E1"), sample("E2"), sample("E3")]);
        assert_eq!(buffer.size(), 3);
    }
}
