//! cache_entries tool implementation.
//!
//! Lists the request keys held by one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, RequestKey};

use crate::handler::ServerState;
use crate::tools::json_result;

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Store name (default: the active generation).
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub store: String,
    /// Keys in insertion order.
    pub entries: Vec<RequestKey>,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(state: &ServerState, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    let store = match params.store {
        Some(store) => store,
        None => state
            .registration
            .active_version()
            .await
            .ok_or_else(|| Error::InvalidInput("no active generation; pass a store name".into()))?,
    };

    let storage = state.registration.storage();
    if !storage.has(&store).await? {
        return Err(Error::InvalidInput(format!("no store named {store}")).into());
    }

    let entries = storage.entries(&store).await?;
    json_result(&CacheEntriesOutput { store, entries })
}
