// S5 -- retention sweep (spec.md §8).
//
// Store contains records with createdAt at T-40d, T-20d, T-5d. Call
// sweep() with retention 30d. Store now contains the T-20d and T-5d
// records only; returned count is 1.

#![cfg(feature = "testing")]

use std::sync::Arc;
use std::time::Duration;

use audit_engine::audit::record::sample;
use audit_engine::audit::retention::RetentionSweeper;
use audit_engine::audit::store::testing::InMemoryAuditStore;
use chrono::Utc;

#[tokio::test]
async fn test_s5_retention_sweep_deletes_only_older_records() {
    let store = Arc::new(InMemoryAuditStore::new());

    let now = Utc::now();
    let mut old = sample("E-old-40d");
    old.created_at = Some(now - chrono::Duration::days(40));
    let mut mid = sample("E-old-20d");
    mid.created_at = Some(now - chrono::Duration::days(20));
    let mut recent = sample("E-recent-5d");
    recent.created_at = Some(now - chrono::Duration::days(5));

    store.seed(vec![old, mid, recent]);

    let sweeper = RetentionSweeper::new(store.clone());
    let deleted = sweeper.sweep(Duration::from_secs(30 * 24 * 60 * 60)).await;

    assert_eq!(deleted, 1);
    let mut remaining: Vec<&str> = store.rows().iter().map(|r| r.event_id.as_str()).collect();
    remaining.sort();
    assert_eq!(remaining, vec!["E-old-20d", "E-recent-5d"]);
}

#[tokio::test]
async fn test_s5_zero_delete_count_is_not_an_error() {
    let store = Arc::new(InMemoryAuditStore::new());
    let sweeper = RetentionSweeper::new(store.clone());
    let deleted = sweeper.sweep(Duration::from_secs(30 * 24 * 60 * 60)).await;
    assert_eq!(deleted, 0);
}
