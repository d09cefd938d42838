//! Process-local store provider.
//!
//! Holds every store in a `tokio::sync::RwLock` map. Nothing survives the
//! process; used for ephemeral runs and tests.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::{CacheStorage, RequestKey};
use crate::Error;
use crate::http::ResponseSnapshot;

#[derive(Debug, Default)]
struct MemoryStore {
    entries: Vec<(RequestKey, ResponseSnapshot)>,
}

impl MemoryStore {
    fn upsert(&mut self, key: &RequestKey, response: &ResponseSnapshot) {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.clone(), response.clone()));
    }
}

/// In-memory `CacheStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    stores: Arc<RwLock<Vec<(String, MemoryStore)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(name: &str) -> Error {
    Error::StoreUnavailable(format!("no store named {name}"))
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|(n, _)| n == name) {
            stores.push((name.to_string(), MemoryStore::default()));
            tracing::debug!(store = %name, "created store");
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.stores.read().await.iter().any(|(n, _)| n == name))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != name);
        Ok(stores.len() != before)
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let stores = self.stores.read().await;
        let found = stores
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, store)| store.entries.iter().find(|(k, _)| k == key))
            .map(|(_, response)| response.clone());
        Ok(found)
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let (_, store) = stores.iter_mut().find(|(n, _)| n == name).ok_or_else(|| missing(name))?;
        store.upsert(key, response);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let (_, store) = stores.iter_mut().find(|(n, _)| n == name).ok_or_else(|| missing(name))?;
        for (key, response) in entries {
            store.upsert(key, response);
        }
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, store)| store.entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://timecraft.test/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let storage = MemoryStorage::new();
        storage.open("v1").await.unwrap();
        storage.put("v1", &key("a.js"), &ResponseSnapshot::new(200, "a")).await.unwrap();
        storage.put("v1", &key("a.js"), &ResponseSnapshot::new(200, "b")).await.unwrap();

        let found = storage.match_request("v1", &key("a.js")).await.unwrap().unwrap();
        assert_eq!(&found.body[..], b"b");
        assert_eq!(storage.entries("v1").await.unwrap(), vec![key("a.js")]);
    }

    #[tokio::test]
    async fn test_memory_missing_store() {
        let storage = MemoryStorage::new();
        let err = storage.put("gone", &key("a.js"), &ResponseSnapshot::new(200, "a")).await;
        assert!(matches!(err, Err(Error::StoreUnavailable(_))));
        assert!(!storage.delete("gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_keys_in_creation_order() {
        let storage = MemoryStorage::new();
        for name in ["v3", "v1", "v2"] {
            storage.open(name).await.unwrap();
        }
        assert_eq!(storage.keys().await.unwrap(), vec!["v3", "v1", "v2"]);
    }
}
