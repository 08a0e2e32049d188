// Audit ingestion engine -- demo server binary.
//
// Wires the engine up against the in-memory `AuditStore` test double and
// runs until Ctrl-C. A real deployment would supply a SQL-backed
// `AuditStore` implementation instead; that implementation, along with the
// HTTP transport that would call into `IngestionApi`, is out of scope for
// this crate.

use std::sync::Arc;

use audit_engine::audit::store::testing::InMemoryAuditStore;
use audit_engine::{Engine, EngineConfig, Result, VERSION};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    print_banner();

    let config = EngineConfig::default();
    info!(version = VERSION, "starting audit-engine-server");

    let store = Arc::new(InMemoryAuditStore::new());
    let engine = Engine::start(config, store).await?;

    info!("engine running; press Ctrl-C to shut down");
    tokio::signal::ctrl_c().await.ok();

    engine.shutdown().await;
    Ok(())
}

fn print_banner() {
    println!(
        r#"
 _____           _ _ _     ______             _
|  _  |         | (_) |    |  ___|           (_)
| | | |_   _  __| |_| |_   | |__ _ __   __ _ _ _ __   ___
| | | | | | |/ _` | | __|  |  __| '_ \ / _` | | '_ \ / _ \
\ \_/ / |_| | (_| | | |_   | |__| | | | (_| | | | | |  __/
 \___/ \__,_|\__,_|_|\__|  \____/_| |_|\__, |_|_| |_|\___|
                                        __/ |
  Audit Event Ingestion Engine v{VERSION}      |___/
"#
    );
}
