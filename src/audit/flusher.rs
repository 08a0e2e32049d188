// Scheduled and capacity-triggered batched drain of the Buffer into the
// AuditStore, with WAL truncation on success.
//
// Drains via the Buffer's snapshot/remove-drained contract, guarded by a
// `try_lock`-protected non-reentrant critical section so two flushes never
// run concurrently.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::buffer::Buffer;
use super::store::AuditStore;
use super::wal::WalWriter;

/// Drains the Buffer into the `AuditStore` in batches and truncates the
/// WAL on success. Two flushes never run concurrently: a `try_lock`
/// guards the critical section, and a contended caller simply skips its
/// tick rather than waiting.
pub struct Flusher<S: AuditStore> {
    buffer: Arc<Buffer>,
    wal: Option<Arc<WalWriter>>,
    store: Arc<S>,
    critical_section: Mutex<()>,
}

impl<S: AuditStore> Flusher<S> {
    pub fn new(buffer: Arc<Buffer>, wal: Option<Arc<WalWriter>>, store: Arc<S>) -> Self {
        Self {
            buffer,
            wal,
            store,
            critical_section: Mutex::new(()),
        }
    }

    /// Attempt a flush. Returns `true` if a flush ran (whether or not it
    /// found anything to drain), `false` if it was skipped because
    /// another flush was already in flight.
    pub async fn flush(&self) -> bool {
        let Ok(_guard) = self.critical_section.try_lock() else {
            warn!("flush already in progress; skipping this trigger");
            return false;
        };

        if self.buffer.size() == 0 {
            return true;
        }

        let snapshot = self.buffer.snapshot();
        let started = std::time::Instant::now();

        let ok = self.store.add_audits(snapshot.clone()).await;

        if ok {
            self.buffer.remove_drained(&snapshot);
            if let Some(wal) = &self.wal {
                if let Err(e) = wal.truncate().await {
                    error!(error = %e, "WAL truncate failed after successful flush");
                }
            }
            info!(
                count = snapshot.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "flush complete"
            );
        } else {
            warn!(
                count = snapshot.len(),
                "flush failed; buffer and WAL retained for retry on next trigger"
            );
        }

        true
    }
}
