// Audit event ingestion and persistence engine.
//
// The durable asynchronous ingestion engine: a Buffer backed by a WAL on
// local disk, periodically flushed in batches to an external `AuditStore`,
// with crash recovery on startup and retention-based cleanup. The HTTP
// transport, SQL schema/ORM, and deployment packaging are out of scope --
// referenced only through the `AuditStore` trait.

pub mod audit;
pub mod config;
pub mod error;

pub use audit::{AuditRecord, AuditStore, Engine, IngestionApi};
pub use config::EngineConfig;
pub use error::{EngineError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
