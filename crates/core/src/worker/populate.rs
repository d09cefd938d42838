//! Install-time seeding of a generation's store from the asset manifest.

use std::sync::Arc;

use futures_util::future::try_join_all;

use super::WorkerConfig;
use crate::Error;
use crate::cache::{CacheStorage, RequestKey};
use crate::http::{InterceptedRequest, ResponseSnapshot, Transport, canonicalize};

/// Seeds a freshly created store with every manifest asset.
///
/// All-or-nothing: every asset is fetched before anything is written, and
/// the batch is written atomically.
pub struct CachePopulator {
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
}

impl CachePopulator {
    pub fn new(storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>) -> Self {
        Self { storage, transport }
    }

    /// Populate the store named by `config.version`; returns the number of assets stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest entry cannot be resolved,
    /// fetched, or answers with a non-2xx status, and store errors if the batch
    /// cannot be written.
    pub async fn populate(&self, config: &WorkerConfig) -> Result<usize, Error> {
        let fetches = config.manifest.iter().map(|entry| self.fetch_asset(entry, config));
        let batch = try_join_all(fetches).await?;

        let existed = self.storage.has(&config.version).await?;
        self.storage.open(&config.version).await?;

        if let Err(e) = self.storage.put_all(&config.version, &batch).await {
            if !existed && let Err(cleanup) = self.storage.delete(&config.version).await {
                tracing::warn!(store = %config.version, error = %cleanup, "failed to remove partial store");
            }
            return Err(e);
        }

        tracing::info!(store = %config.version, assets = batch.len(), "cached manifest assets");
        Ok(batch.len())
    }

    async fn fetch_asset(&self, entry: &str, config: &WorkerConfig) -> Result<(RequestKey, ResponseSnapshot), Error> {
        let url = canonicalize(entry, &config.origin)
            .map_err(|e| Error::InstallFailed { url: entry.to_string(), reason: e.to_string() })?;
        let request = InterceptedRequest::get(url);

        let response = self
            .transport
            .fetch(&request)
            .await
            .map_err(|e| Error::InstallFailed { url: request.url().to_string(), reason: e.to_string() })?;

        if !response.is_ok() {
            return Err(Error::InstallFailed {
                url: request.url().to_string(),
                reason: format!("status {}", response.status),
            });
        }

        tracing::debug!(url = %request.url(), bytes = response.body.len(), "fetched manifest asset");
        Ok((request.key(), response))
    }
}
