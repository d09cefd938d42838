//! cache_keys tool implementation.
//!
//! Lists store names alongside the active generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use crate::handler::ServerState;
use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Store names in creation order.
    pub stores: Vec<String>,
    pub active: Option<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(state: &ServerState) -> Result<CallToolResult, McpError> {
    let registration = &state.registration;
    let output = CacheKeysOutput {
        stores: registration.storage().keys().await?,
        active: registration.active_version().await,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::sw_update::{SwUpdateParams, update_impl};
    use crate::tools::testing::{online, output, state};
    use swcache_core::CacheStorage;

    #[tokio::test]
    async fn test_keys_empty() {
        let (state, _) = state(online());
        let out = output(&keys_impl(&state).await.unwrap());
        assert_eq!(out["stores"], serde_json::json!([]));
        assert_eq!(out["active"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_keys_after_update() {
        let (state, storage) = state(online());
        storage.open("timecraft-v0.9.0").await.unwrap();
        update_impl(&state, SwUpdateParams::default()).await.unwrap();

        let out = output(&keys_impl(&state).await.unwrap());

        assert_eq!(out["stores"], serde_json::json!(["timecraft-v1.0.0"]));
        assert_eq!(out["active"], "timecraft-v1.0.0");
        assert!(out.get("waiting").is_none());
    }
}
