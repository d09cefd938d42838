//! Per-request interception: scope check, cache lookup, network fallback,
//! offline substitute. Steps run strictly in that order for one request.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use super::WorkerConfig;
use super::offline::offline_page;
use crate::Error;
use crate::cache::{CacheStorage, RequestKey};
use crate::http::{InterceptedRequest, ResponseSnapshot, Transport};

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    Offline,
}

/// Outcome of intercepting one request.
#[derive(Debug)]
pub enum Interception {
    /// Out of scope: the default transport handles the request unmodified.
    Declined,
    Responded {
        response: ResponseSnapshot,
        source: ResponseSource,
        /// Pending best-effort write into the active store.
        ///
        /// Dropping the handle detaches the task; it is never awaited on the
        /// response path.
        write_back: Option<JoinHandle<()>>,
    },
}

impl Interception {
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Interception::Declined => None,
            Interception::Responded { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Interception::Declined => None,
            Interception::Responded { source, .. } => Some(*source),
        }
    }

    /// Wait for the write-back, if any, to finish.
    pub async fn settle(self) -> Option<ResponseSnapshot> {
        match self {
            Interception::Declined => None,
            Interception::Responded { response, write_back, .. } => {
                if let Some(handle) = write_back {
                    let _ = handle.await;
                }
                Some(response)
            }
        }
    }
}

/// Cache-first, network-fallback, offline-substitute decision engine.
#[derive(Clone)]
pub struct InterceptionPolicy {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
}

impl InterceptionPolicy {
    pub fn new(config: Arc<WorkerConfig>, storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>) -> Self {
        Self { config, storage, transport }
    }

    /// Map an intercepted request to a response.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the network fails and the request
    /// does not accept HTML, and store errors raised by the cache lookup.
    /// Write-back failures are never returned.
    pub async fn handle(&self, request: &InterceptedRequest) -> Result<Interception, Error> {
        if !request.is_same_origin(&self.config.scope()) {
            tracing::trace!(url = %request.url(), "out of scope, not intercepting");
            return Ok(Interception::Declined);
        }

        let key = request.key();
        let store = &self.config.version;

        if key.is_cacheable()
            && let Some(cached) = self.storage.match_request(store, &key).await?
        {
            tracing::debug!(url = %request.url(), store = %store, "serving from cache");
            return Ok(Interception::Responded { response: cached, source: ResponseSource::Cache, write_back: None });
        }

        tracing::debug!(url = %request.url(), method = request.method(), "fetching from network");

        match self.transport.fetch(request).await {
            Ok(response) => {
                let write_back =
                    (key.is_cacheable() && response.is_cacheable()).then(|| self.spawn_write_back(key, response.clone()));
                Ok(Interception::Responded { response, source: ResponseSource::Network, write_back })
            }
            Err(err) if request.accepts_html() => {
                tracing::info!(url = %request.url(), error = %err, "network failed, serving offline page");
                Ok(Interception::Responded {
                    response: offline_page(&self.config.app_name, &self.config.offline_heading),
                    source: ResponseSource::Offline,
                    write_back: None,
                })
            }
            Err(err) => {
                tracing::debug!(url = %request.url(), error = %err, "network failed, no substitute");
                Err(err)
            }
        }
    }

    fn spawn_write_back(&self, key: RequestKey, response: ResponseSnapshot) -> JoinHandle<()> {
        let storage = Arc::clone(&self.storage);
        let store = self.config.version.clone();
        tokio::spawn(async move {
            if let Err(e) = write_back(storage.as_ref(), &store, &key, &response).await {
                tracing::warn!(store = %store, url = %key.url, error = %e, "failed to store network response");
            }
        })
    }
}

/// Stores into an existing store only. A store reaped while the network
/// request was in flight is not brought back.
async fn write_back(
    storage: &dyn CacheStorage, store: &str, key: &RequestKey, response: &ResponseSnapshot,
) -> Result<(), Error> {
    storage.put(store, key, response).await
}
