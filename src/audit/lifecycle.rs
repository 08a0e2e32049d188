// Engine lifecycle: startup recovery, scheduler wiring, and graceful
// shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;

use super::api::IngestionApi;
use super::buffer::Buffer;
use super::executor::IngestionExecutor;
use super::flusher::Flusher;
use super::retention::{CronSchedule, RetentionSweeper};
use super::store::AuditStore;
use super::wal;

/// The assembled, running engine: Buffer, (optional) WAL, Flusher,
/// Retention Sweeper, Ingestion API, and the executor and scheduler tasks
/// that drive them.
pub struct Engine<S: AuditStore + 'static> {
    config: EngineConfig,
    api: Arc<IngestionApi<S>>,
    flusher: Arc<Flusher<S>>,
    retention: Arc<RetentionSweeper<S>>,
    shutdown: Arc<Notify>,
    flush_task: tokio::task::JoinHandle<()>,
    retention_task: tokio::task::JoinHandle<()>,
}

impl<S: AuditStore + 'static> Engine<S> {
    /// Startup sequence:
    /// 1. Open/create the WAL file at the configured path.
    /// 2. Replay it into the Buffer, so a recovered record is retried on
    ///    the next flush.
    /// 3. Start the Flusher scheduler and the Retention Sweeper scheduler.
    /// 4. Start the ingestion executor.
    pub async fn start(config: EngineConfig, store: Arc<S>) -> Result<Self> {
        info!(
            buffer_size = config.buffer_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            wal_file_path = %config.wal_file_path.display(),
            retention_ms = config.retention_period.as_millis() as u64,
            clear_cron = %config.clear_cron,
            "starting audit ingestion engine"
        );

        let wal = wal::open_or_degrade(&config.wal_file_path, config.fsync_on_append).await;
        let wal = wal.map(Arc::new);

        let buffer = Arc::new(Buffer::new());

        if let Some(wal) = &wal {
            match wal.replay().await {
                Ok((records, skipped)) => {
                    if skipped > 0 {
                        warn!(skipped, "skipped malformed WAL lines during replay");
                    }
                    let recovered = records.len();
                    buffer.add_all(records);
                    if recovered > 0 {
                        info!(recovered, "replayed pending records from WAL into buffer");
                    }
                }
                Err(e) => {
                    error!(error = %e, "WAL replay failed; starting with an empty buffer");
                }
            }
        }

        let flusher = Arc::new(Flusher::new(buffer.clone(), wal.clone(), store.clone()));
        let retention = Arc::new(RetentionSweeper::new(store.clone()));
        let executor = Arc::new(IngestionExecutor::new(
            config.executor.max_pool_size,
            config.executor.queue_capacity,
        ));

        let api = Arc::new(IngestionApi::new(
            buffer,
            wal,
            store,
            flusher.clone(),
            executor,
            config.buffer_size,
        ));

        let shutdown = Arc::new(Notify::new());

        let flush_task = spawn_flush_scheduler(flusher.clone(), config.flush_interval, shutdown.clone());
        let retention_task = spawn_retention_scheduler(
            retention.clone(),
            config.clear_cron.clone(),
            config.retention_period,
            shutdown.clone(),
        )?;

        Ok(Self {
            config,
            api,
            flusher,
            retention,
            shutdown,
            flush_task,
            retention_task,
        })
    }

    pub fn api(&self) -> &Arc<IngestionApi<S>> {
        &self.api
    }

    pub fn retention_sweeper(&self) -> &Arc<RetentionSweeper<S>> {
        &self.retention
    }

    /// Shutdown sequence:
    /// 1. Stop accepting new scheduled work (signal scheduler tasks to
    ///    stop).
    /// 2. Await executor termination, bounded by
    ///    `await_termination_seconds`: the scheduler tasks first, then the
    ///    ingestion executor's queued and in-flight submissions, so a
    ///    record whose WAL-append/buffer-enqueue task hasn't run yet is
    ///    drained before the final flush rather than missed by it.
    /// 3. Run one final flush.
    /// 4. (The WAL file handle is closed implicitly when the engine, and
    ///    its `Arc<WalWriter>`, are dropped.)
    pub async fn shutdown(self) {
        info!("shutting down audit ingestion engine");
        self.shutdown.notify_waiters();

        let grace = self.config.executor.await_termination;
        if tokio::time::timeout(grace, async {
            let _ = self.flush_task.await;
            let _ = self.retention_task.await;
        })
        .await
        .is_err()
        {
            warn!(
                grace_secs = grace.as_secs(),
                "scheduler tasks did not stop within the shutdown grace period"
            );
        }

        self.api.executor().shutdown(grace).await;

        self.flusher.flush().await;
        info!("final flush complete; engine stopped");
    }
}

fn spawn_flush_scheduler<S: AuditStore + 'static>(
    flusher: Arc<Flusher<S>>,
    flush_interval: Duration,
    shutdown: Arc<Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(flush_interval);
        ticker.tick().await; // first tick fires immediately; discard it.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    flusher.flush().await;
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    })
}

fn spawn_retention_scheduler<S: AuditStore + 'static>(
    retention: Arc<RetentionSweeper<S>>,
    clear_cron: String,
    retention_period: Duration,
    shutdown: Arc<Notify>,
) -> Result<tokio::task::JoinHandle<()>> {
    let schedule = CronSchedule::parse(&clear_cron)?;
    Ok(tokio::spawn(async move {
        // A zero or negative retention period disables the sweep entirely.
        if retention_period.is_zero() {
            info!("retention period is zero; retention sweep disabled");
            return;
        }

        let mut ticker = interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = chrono::Utc::now();
                    if let Some(next) = schedule.next_execution(now - chrono::Duration::minutes(1)) {
                        if next <= now {
                            retention.sweep(retention_period).await;
                        }
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }))
}
