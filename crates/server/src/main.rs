//! swcache server entry point.
//!
//! Boots the offline cache worker and exposes it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::http::Transport;
use swcache_core::worker::{Registration, host};
use swcache_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage};
use tracing_subscriber::EnvFilter;

mod handler;
mod notifier;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, "Starting swcache server on stdio transport");

    let storage: Arc<dyn CacheStorage> = if config.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };
    let transport: Arc<dyn Transport> = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let worker = config.worker_config()?;

    let registration = Arc::new(Registration::new(storage, Arc::clone(&transport)));
    let (host, _events) = host::spawn(Arc::clone(&registration), Arc::new(notifier::LogNotifier), config.notify_config());

    match host.update(worker.clone()).await {
        Ok(outcome) => tracing::info!(version = %outcome.version, reaped = ?outcome.reaped, "generation active"),
        Err(e) => tracing::warn!(error = %e, "initial install failed; requests pass through until an update succeeds"),
    }

    let handler = handler::SwCacheServer::new(handler::ServerState { host, registration, transport, worker });
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
