mod api;
mod common;
mod datadog;
mod http_client;
mod model;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tokio::sync::watch;

use api::{AppState, DatadogSecretsService, SecretsService, cors_layer, create_api_router};
use datadog::client::DatadogClient;
use datadog::client_cache::ClientCache;
use datadog::config_store::ConfigStore;
use model::arg::Args;
use model::config::Config;
use storage::{FileStorage, MemoryStorage, StorageBackend};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {}", e);
        std::process::exit(1);
    });

    // Get service API key
    // Security check: empty string is treated as not configured
    let api_key = config.api_key.clone().unwrap_or_else(|| {
        tracing::error!("apiKey not set in config file");
        std::process::exit(1);
    });
    if api_key.trim().is_empty() {
        tracing::error!("apiKey is empty, refusing to start");
        std::process::exit(1);
    }

    // Build proxy configuration
    let proxy_config = http_client::proxy_from_config(&config);

    if proxy_config.is_some() {
        tracing::info!("HTTP proxy configured: {}", config.proxy_url.as_ref().unwrap());
    }

    // Open storage
    let storage: Arc<dyn StorageBackend> = if args.ephemeral {
        tracing::warn!("Ephemeral storage enabled, configuration will not survive restarts");
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(FileStorage::open(&config.storage_dir).unwrap_or_else(|e| {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }))
    };

    // Wire the engine: config store -> cached client -> service
    let config_store = ConfigStore::new(storage);
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let tls_backend = config.tls_backend;
    let builder_proxy = proxy_config.clone();
    let cache: ClientCache<DatadogClient> = ClientCache::new(
        config_store.clone(),
        Box::new(move |dd_config| {
            DatadogClient::from_config(dd_config, builder_proxy.as_ref(), timeout, tls_backend)
        }),
    );
    let service: Arc<DatadogSecretsService> = Arc::new(SecretsService::new(config_store, cache));

    // Shutdown signal shared by the server and the lease sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(service.clone().run_lease_sweeper(
        Duration::from_secs(config.lease_sweep_interval_secs.max(1)),
        shutdown_rx,
    ));

    // Build API router
    let state = AppState::new(&api_key, service);
    let app = Router::new()
        .nest("/v1", create_api_router(state))
        .layer(cors_layer());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting Datadog secrets service: {}", addr);
    tracing::info!("Available APIs:");
    tracing::info!("  GET    /v1/config");
    tracing::info!("  POST   /v1/config");
    tracing::info!("  PUT    /v1/config");
    tracing::info!("  DELETE /v1/config");
    tracing::info!("  GET    /v1/creds/{{name}}");
    tracing::info!("  GET    /v1/leases");
    tracing::info!("  POST   /v1/leases/revoke");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .unwrap();

    // Give in-flight lease revocations their chance to observe the signal
    let _ = sweeper.await;
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
