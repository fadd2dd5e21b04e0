//! Bank Ledger service
//!
//! ```text
//! bank-ledger [--env dev] [--port 8080] [--memory]
//! ```
//!
//! Uses PostgreSQL when `postgres_url` is configured and `--memory` is not
//! given, the in-memory store otherwise.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use bank_ledger::config::AppConfig;
use bank_ledger::db::{Database, schema};
use bank_ledger::gateway::{self, state::AppState};
use bank_ledger::logging;
use bank_ledger::store::{LedgerStore, MemoryStore, PgLedgerStore};

// ============================================================
// COMMAND LINE
// ============================================================

fn get_arg(name: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1).cloned())
}

fn get_env() -> String {
    get_arg("--env")
        .or_else(|| get_arg("-e"))
        .unwrap_or_else(|| "dev".to_string())
}

/// Port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    get_arg("--port").and_then(|p| p.parse().ok())
}

fn use_memory_store() -> bool {
    std::env::args().any(|a| a == "--memory")
}

// ============================================================
// MAIN
// ============================================================

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    let lock_timeout = config.ledger.lock_timeout();

    match (&config.postgres_url, use_memory_store()) {
        (Some(url), false) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            schema::init_schema(db.pool()).await?;
            Ok(Arc::new(PgLedgerStore::new(db.pool().clone(), lock_timeout)))
        }
        (Some(_), true) => {
            warn!("--memory given, ignoring configured postgres_url");
            Ok(Arc::new(MemoryStore::new(lock_timeout)))
        }
        (None, _) => Ok(Arc::new(MemoryStore::new(lock_timeout))),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _log_guard = logging::init_logging(&config);
    info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        lock_timeout_ms = config.ledger.lock_timeout_ms,
        "Starting bank ledger"
    );

    let store = open_store(&config).await?;
    info!(store = store.name(), "Ledger store ready");

    let state = Arc::new(AppState::new(store, config.ledger.field_limits()));
    gateway::run_server(&config.gateway, state, shutdown_signal()).await?;

    info!("Bank ledger stopped");
    Ok(())
}
