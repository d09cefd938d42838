//! sw_update tool implementation.
//!
//! Installs a cache generation and, on success, makes it active.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

use super::json_result;
use crate::handler::ServerState;

/// Parameters for the sw_update tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateParams {
    /// Version identifier of the new generation (default: the configured cache version).
    #[serde(default)]
    pub version: Option<String>,

    /// Asset manifest override, resolved against the origin.
    #[serde(default)]
    pub manifest: Option<Vec<String>>,
}

/// Implementation of the sw_update tool.
pub async fn update_impl(state: &ServerState, params: SwUpdateParams) -> Result<CallToolResult, McpError> {
    let mut config = state.worker.clone();

    if let Some(version) = params.version {
        let version = version.trim();
        if version.is_empty() {
            return Err(Error::InvalidInput("version cannot be empty".into()).into());
        }
        config.version = version.to_string();
    }

    if let Some(manifest) = params.manifest {
        if manifest.iter().any(|entry| entry.trim().is_empty()) {
            return Err(Error::InvalidInput("manifest entries cannot be empty".into()).into());
        }
        config.manifest = manifest;
    }

    let outcome = state.host.update(config).await?;
    json_result(&outcome)
}
