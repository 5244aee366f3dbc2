//! SimGuard Console: the review UI's window into intercepted requests.

mod api;
mod config;

use anyhow::{Context, Result};
use config::Config;
use simguard_rpc::lifecycle::RequestStore;
use simguard_rpc::settings::SettingsStore;
use simguard_rpc::storage::{DocumentStore, FileStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let store: Arc<dyn DocumentStore> = Arc::new(
        FileStore::open(&config.data_dir)
            .await
            .context("Failed to open data directory")?,
    );

    let state = api::AppState {
        requests: Arc::new(RequestStore::new(Arc::clone(&store))),
        settings: Arc::new(SettingsStore::new(store)),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    info!(
        addr = %config.listen_addr(),
        data_dir = %config.data_dir.display(),
        "SimGuard console listening"
    );

    axum::serve(listener, api::build_router(state))
        .await
        .context("Server error")?;
    Ok(())
}
