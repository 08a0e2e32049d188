// Ingestion API: the six entry points producers call, combining the
// Validator, WAL Writer, and Buffer behind a capacity-trigger-before-enqueue
// rule.
//
// Splits into a synchronous passthrough-to-`AuditStore` half and an
// asynchronous buffered/WAL-durable half.

use std::sync::Arc;

use tracing::{error, warn};

use super::buffer::Buffer;
use super::executor::IngestionExecutor;
use super::flusher::Flusher;
use super::record::AuditRecord;
use super::store::AuditStore;
use super::validator::Validator;
use super::wal::WalWriter;

/// Combines the Validator, WAL Writer, and Buffer behind the synchronous
/// and asynchronous ingestion entry points.
pub struct IngestionApi<S: AuditStore> {
    buffer: Arc<Buffer>,
    wal: Option<Arc<WalWriter>>,
    store: Arc<S>,
    flusher: Arc<Flusher<S>>,
    executor: Arc<IngestionExecutor>,
    buffer_size: usize,
}

impl<S: AuditStore + 'static> IngestionApi<S> {
    pub fn new(
        buffer: Arc<Buffer>,
        wal: Option<Arc<WalWriter>>,
        store: Arc<S>,
        flusher: Arc<Flusher<S>>,
        executor: Arc<IngestionExecutor>,
        buffer_size: usize,
    ) -> Self {
        Self {
            buffer,
            wal,
            store,
            flusher,
            executor,
            buffer_size,
        }
    }

    // -- synchronous operations: bypass Buffer and WAL, delegate directly
    // to AuditStore. Validate before dispatch; return `ok=false` on invalid
    // input without calling the store at all.

    pub async fn add_audit(&self, record: AuditRecord) -> bool {
        if let Err(e) = Validator::validate(&record) {
            warn!(event_id = %record.event_id, error = %e, "add_audit: validation failed");
            return false;
        }
        self.store.add_audit(record).await
    }

    pub async fn add_audits(&self, records: Vec<AuditRecord>) -> bool {
        if let Some(e) = first_validation_failure(&records) {
            warn!(error = %e, "add_audits: validation failed");
            return false;
        }
        self.store.add_audits(records).await
    }

    pub async fn update_audits(&self, records: Vec<AuditRecord>) -> bool {
        if let Some(e) = first_validation_failure(&records) {
            warn!(error = %e, "update_audits: validation failed");
            return false;
        }
        self.store.update_audits(records).await
    }

    // -- asynchronous operations: buffered and WAL-durable. Validation
    // failures are logged and the offending record dropped -- it never
    // reaches the WAL or Buffer, preventing WAL pollution. Returns
    // immediately; the actual work is scheduled onto the ingestion
    // executor.

    pub async fn add_audit_async(&self, record: AuditRecord) {
        if let Err(e) = Validator::validate(&record) {
            warn!(event_id = %record.event_id, error = %e, "add_audit_async: dropping invalid record");
            return;
        }

        // Single-record trigger: `buffer.size() >= buffer_size`, not
        // `size() + 1`. The Nth submission (when the buffer already holds
        // N records from the prior N-1 submissions) is the one that
        // triggers, not the (N+1)th -- e.g. with buffer_size=5, the flush
        // fires at submission of the 6th record, when the buffer already
        // holds the first five.
        if self.buffer.size() >= self.buffer_size {
            warn!(buffer_size = self.buffer_size, "capacity trigger: flushing before enqueue");
            self.flusher.flush().await;
        }

        let buffer = self.buffer.clone();
        let wal = self.wal.clone();
        self.executor
            .submit(async move {
                if let Some(wal) = &wal {
                    if let Err(e) = wal.append_one(&record).await {
                        error!(event_id = %record.event_id, error = %e, "WAL append failed; record remains in-memory only");
                    }
                }
                buffer.add(record);
            })
            .await;
    }

    pub async fn add_audits_async(&self, records: Vec<AuditRecord>) {
        let valid = drop_invalid(records);
        if valid.is_empty() {
            return;
        }

        // Batch trigger: the incoming batch's own length counts toward
        // the threshold, unlike the single-record path above.
        if self.buffer.size() + valid.len() >= self.buffer_size {
            warn!(buffer_size = self.buffer_size, "capacity trigger: flushing before enqueue");
            self.flusher.flush().await;
        }

        let buffer = self.buffer.clone();
        let wal = self.wal.clone();
        self.executor
            .submit(async move {
                if let Some(wal) = &wal {
                    if let Err(e) = wal.append_many(&valid).await {
                        error!(error = %e, "WAL append_many failed; records remain in-memory only");
                    }
                }
                buffer.add_all(valid);
            })
            .await;
    }

    /// Same shape as `add_audits_async`; the WAL does not distinguish
    /// inserts from updates -- the store interprets on flush.
    pub async fn update_audits_async(&self, records: Vec<AuditRecord>) {
        self.add_audits_async(records).await;
    }

    pub fn flusher(&self) -> &Arc<Flusher<S>> {
        &self.flusher
    }

    pub fn executor(&self) -> &Arc<IngestionExecutor> {
        &self.executor
    }
}

fn first_validation_failure(records: &[AuditRecord]) -> Option<super::validator::ValidationError> {
    records.iter().find_map(|r| Validator::validate(r).err())
}

fn drop_invalid(records: Vec<AuditRecord>) -> Vec<AuditRecord> {
    records
        .into_iter()
        .filter(|r| match Validator::validate(r) {
            Ok(()) => true,
            Err(e) => {
                warn!(event_id = %r.event_id, error = %e, "dropping invalid record from async batch");
                false
            }
        })
        .collect()
}
