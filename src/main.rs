//! Company Transfer gateway
//!
//! ```text
//! cargo run -- --env dev [--port 8080]
//! ```
//!
//! Transfers are kept in PostgreSQL when `postgres_url` is configured and in
//! memory otherwise. Host services (directory, contracts, ledger, leave,
//! payroll) are the in-memory implementations; notifications are logged.

use std::sync::Arc;

use anyhow::Context;

use company_transfer::config::AppConfig;
use company_transfer::demo::MemoryHost;
use company_transfer::gateway;
use company_transfer::logging;
use company_transfer::transfer::adapters::{MemoryTransferStore, TransferStore};
use company_transfer::transfer::{LogNotifier, PgTransferStore, TransferCoordinator};

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1).cloned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string());
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_arg(&["--port", "-p"]) {
        config.gateway.port = port
            .parse()
            .with_context(|| format!("Invalid --port value: {port}"))?;
    }

    let _guard = logging::init_logging(&config);
    tracing::info!(
        env = %env,
        git_hash = env!("GIT_HASH"),
        "Starting company_transfer"
    );

    let store: Arc<dyn TransferStore> = match config.postgres_url.as_deref() {
        Some(url) => {
            let store = PgTransferStore::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            tracing::info!("Transfer store: PostgreSQL");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No postgres_url configured, transfers are kept in memory");
            Arc::new(MemoryTransferStore::new())
        }
    };

    let host = MemoryHost::new();
    if config.seed_demo_data {
        host.seed_demo();
    }

    let coordinator = TransferCoordinator::new(
        host.collaborators(store, Arc::new(LogNotifier)),
        config.coordinator_settings(),
    );

    gateway::run_server(&config.gateway, Arc::new(coordinator)).await
}
