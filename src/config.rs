// Engine configuration surface.
//
// One field per recognized configuration key, with defaults matching the
// documented production values. Assembled by the caller and handed to
// `Engine::start` as a plain struct -- no framework-injected singletons.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity-flush trigger threshold for the Buffer.
    pub buffer_size: usize,

    /// Scheduled flush cadence for the Flusher.
    pub flush_interval: Duration,

    /// On-disk WAL location.
    pub wal_file_path: PathBuf,

    /// Sweep age threshold. Zero or negative (represented as `Duration::ZERO`)
    /// disables the sweep.
    pub retention_period: Duration,

    /// 6-field (sec min hour day month weekday) cron expression for the
    /// Retention Sweeper.
    pub clear_cron: String,

    /// Opt-in stronger durability: `sync_data` after every WAL append.
    /// Default off; the default durability model is best-effort (flush to
    /// OS buffers, no fsync).
    pub fsync_on_append: bool,

    /// Ingestion executor sizing.
    pub executor: ExecutorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            flush_interval: Duration::from_millis(60_000),
            wal_file_path: PathBuf::from("./audit-wal.log"),
            retention_period: Duration::from_millis(2_592_000_000),
            clear_cron: "0 0 3 * * *".to_string(),
            fsync_on_append: false,
            executor: ExecutorConfig::default(),
        }
    }
}

/// Ingestion executor configuration.
///
/// `core_pool_size`/`max_pool_size` bound the semaphore used to admit
/// concurrent ingestion tasks onto the shared Tokio runtime;
/// `keep_alive` has no effect under the Tokio-backed executor (there are
/// no dedicated worker threads to retire) and is retained only for
/// interface fidelity with the documented configuration surface.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub queue_capacity: usize,
    pub keep_alive: Duration,
    pub await_termination: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_pool_size: 8,
            max_pool_size: 12,
            queue_capacity: 500,
            keep_alive: Duration::from_secs(60),
            await_termination: Duration::from_secs(30),
        }
    }
}
