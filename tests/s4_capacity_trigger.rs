// S4 -- capacity trigger (spec.md §8).
//
// Config: buffer-size=5, flush-interval-millis=60000. Submit E1..E6
// serially on one thread. At submission of E6, an immediate flush is
// triggered before the sixth enqueue; after store success, the Buffer
// contains only E6.

#![cfg(feature = "testing")]

use std::sync::Arc;
use std::time::Duration;

use audit_engine::audit::record::sample;
use audit_engine::audit::store::testing::InMemoryAuditStore;
use audit_engine::{Engine, EngineConfig};
use tempfile::TempDir;

#[tokio::test]
async fn test_s4_capacity_trigger_flushes_before_sixth_enqueue() {
    let dir = TempDir::new().unwrap();

    let mut config = EngineConfig::default();
    config.buffer_size = 5;
    config.flush_interval = Duration::from_secs(60);
    config.wal_file_path = dir.path().join("audit-wal.log");

    let store = Arc::new(InMemoryAuditStore::new());
    let engine = Engine::start(config, store.clone()).await.unwrap();

    for i in 1..=6 {
        engine.api().add_audit_async(sample(&format!("E{i}"))).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let calls = store.add_audits_calls();
    assert_eq!(calls.len(), 1, "exactly one capacity-triggered flush before E6");
    let flushed_ids: Vec<&str> = calls[0].iter().map(|r| r.event_id.as_str()).collect();
    assert_eq!(flushed_ids, vec!["E1", "E2", "E3", "E4", "E5"]);

    assert_eq!(store.rows().len(), 5);

    engine.api().flusher().flush().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.rows().len(), 6);

    engine.shutdown().await;
}
