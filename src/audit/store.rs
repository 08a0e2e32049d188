// External persistence collaborator.
//
// The SQL schema, connection pooling, and ORM mapping are explicitly out
// of scope; this trait is the opaque boundary the engine talks to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::record::AuditRecord;

/// Durable persistence collaborator for audit records.
///
/// `update_audits` keys on `eventId` (the record's true identity), not the
/// business-subject `id` field the original source mistakenly bound on --
/// see DESIGN.md's Open Questions.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn add_audit(&self, record: AuditRecord) -> bool;
    async fn add_audits(&self, records: Vec<AuditRecord>) -> bool;
    async fn update_audits(&self, records: Vec<AuditRecord>) -> bool;
    /// Deletes records with `createdAt < cutoff`. Returns the count
    /// deleted (`>= 0`); a count of zero is not an error.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> usize;
}

/// Test-only in-memory `AuditStore`, used to exercise the engine's
/// invariants and end-to-end scenarios without a real database.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every batch handed to `add_audits`/`update_audits` so tests
    /// can assert on call shape (e.g. "exactly one `addAudits` call with a
    /// one-element list").
    #[derive(Default)]
    pub struct InMemoryAuditStore {
        rows: Mutex<Vec<AuditRecord>>,
        add_audits_calls: Mutex<Vec<Vec<AuditRecord>>>,
        fail_writes: AtomicBool,
    }

    impl InMemoryAuditStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure the store to fail every `add_audits`/`update_audits`
        /// call until switched back, modeling a store-outage
        /// scenario.
        pub fn set_failing(&self, failing: bool) {
            self.fail_writes.store(failing, Ordering::SeqCst);
        }

        pub fn rows(&self) -> Vec<AuditRecord> {
            self.rows.lock().clone()
        }

        /// Seed rows directly with caller-chosen `created_at` values,
        /// bypassing `add_audits`' "set to now on insert" behavior. Used
        /// by retention-sweep tests that need rows with specific ages.
        pub fn seed(&self, records: Vec<AuditRecord>) {
            self.rows.lock().extend(records);
        }

        pub fn add_audits_calls(&self) -> Vec<Vec<AuditRecord>> {
            self.add_audits_calls.lock().clone()
        }
    }

    #[async_trait]
    impl AuditStore for InMemoryAuditStore {
        async fn add_audit(&self, record: AuditRecord) -> bool {
            self.add_audits(vec![record]).await
        }

        async fn add_audits(&self, records: Vec<AuditRecord>) -> bool {
            self.add_audits_calls.lock().push(records.clone());
            if self.fail_writes.load(Ordering::SeqCst) {
                return false;
            }
            let mut rows = self.rows.lock();
            let now = Utc::now();
            for mut record in records {
                record.created_at = Some(now);
                // at-least-once tolerance: upsert on eventId.
                if let Some(existing) = rows.iter_mut().find(|r| r.event_id == record.event_id) {
                    *existing = record;
                } else {
                    rows.push(record);
                }
            }
            true
        }

        async fn update_audits(&self, records: Vec<AuditRecord>) -> bool {
            if self.fail_writes.load(Ordering::SeqCst) {
                return false;
            }
            let mut rows = self.rows.lock();
            for record in records {
                if let Some(existing) = rows.iter_mut().find(|r| r.event_id == record.event_id) {
                    let created_at = existing.created_at;
                    *existing = record;
                    existing.created_at = created_at;
                }
            }
            true
        }

        async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> usize {
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|r| r.created_at.map(|c| c >= cutoff).unwrap_or(true));
            before - rows.len()
        }
    }
}
