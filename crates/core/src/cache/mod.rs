//! Versioned response stores.
//!
//! A store is a named key -> response mapping; one store exists per cache
//! generation and the name is the version identifier. Providers:
//!
//! - `CacheDb`: SQLite via tokio-rusqlite (WAL mode, schema migrations)
//! - `MemoryStorage`: process-local map for ephemeral runs and tests

pub mod connection;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use memory::MemoryStorage;

use crate::http::ResponseSnapshot;

/// Store provider: open-or-create, enumerate and delete named stores, and
/// match/put entries inside one of them.
///
/// Every operation may suspend and may fail with a store error. Puts use
/// overwrite semantics, so concurrent writes of one key are last-write-wins.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named store, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Whether a store with this name exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Names of all stores, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and all its entries.
    ///
    /// Returns false if nothing was there; that is not an error.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up a request identity in one store.
    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Insert or overwrite one entry. The store must exist.
    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Insert a batch of entries atomically: all land, or none do.
    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error>;

    /// Request identities held by one store, in insertion order.
    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error>;
}
