use anyhow::{Context, Result};
use simguard_rpc::backend::HttpBackend;
use simguard_rpc::binding::ProviderBinding;
use simguard_rpc::config::Config;
use simguard_rpc::dispatcher::Dispatcher;
use simguard_rpc::lifecycle::RequestStore;
use simguard_rpc::provider::HttpProvider;
use simguard_rpc::server;
use simguard_rpc::settings::watch_settings;
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
    info!(
        upstream = %config.upstream_rpc_url,
        simulation_api = %config.simulation_api_url,
        data_dir = %config.data_dir.display(),
        "starting SimGuard RPC proxy"
    );

    let store: Arc<dyn DocumentStore> = Arc::new(
        FileStore::open(&config.data_dir)
            .await
            .context("Failed to open data directory")?,
    );
    let (settings, _settings_task) =
        watch_settings(Arc::clone(&store), config.settings_poll_interval()).await;

    let backend = HttpBackend::new(
        config.simulation_api_url.clone(),
        config.simulation_api_key.clone(),
        config.backend_timeout(),
    )
    .context("Failed to build simulation client")?;
    let requests = Arc::new(RequestStore::new(store));
    let dispatcher = Arc::new(Dispatcher::new(requests, Arc::new(backend)));

    let binding = Arc::new(ProviderBinding::new(dispatcher, settings));
    binding.set(Arc::new(HttpProvider::new(config.upstream_rpc_url.clone())));

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    info!(addr = %config.listen_addr(), "listening");

    axum::serve(listener, server::build_router(binding))
        .await
        .context("Server error")?;
    Ok(())
}
