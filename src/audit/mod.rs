// Audit ingestion subsystem: Validator, WAL Writer, Buffer, Flusher,
// Retention Sweeper, Ingestion API, and Lifecycle.

pub mod api;
pub mod buffer;
pub mod executor;
pub mod flusher;
pub mod lifecycle;
pub mod record;
pub mod retention;
pub mod store;
pub mod validator;
pub mod wal;

pub use api::IngestionApi;
pub use buffer::Buffer;
pub use executor::IngestionExecutor;
pub use flusher::Flusher;
pub use lifecycle::Engine;
pub use record::AuditRecord;
pub use retention::{CronSchedule, RetentionSweeper};
pub use store::AuditStore;
pub use validator::{ValidationError, Validator};
pub use wal::WalWriter;
