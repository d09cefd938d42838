//! Activation-time deletion of superseded cache generations.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::Error;
use crate::cache::CacheStorage;

/// Deletes every store whose name is not the current version.
pub struct GenerationReaper {
    storage: Arc<dyn CacheStorage>,
}

impl GenerationReaper {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Delete all stale stores concurrently and return their names.
    ///
    /// Deleting an already-gone store is not an error.
    ///
    /// # Errors
    ///
    /// Returns the first store error hit while enumerating or deleting;
    /// deletions that already succeeded stay deleted.
    pub async fn reap(&self, current: &str) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let deletions = stale.iter().map(|name| async move {
            tracing::info!(store = %name, "deleting old store");
            self.storage.delete(name).await
        });

        join_all(deletions).await.into_iter().collect::<Result<Vec<bool>, Error>>()?;

        Ok(stale)
    }
}
