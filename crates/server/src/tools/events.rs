//! push, notification_click and sync tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::Notification;

use super::json_result;
use crate::handler::ServerState;

/// Parameters for the push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Raw push payload, a JSON document `{title, body, primaryKey}`.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PushOutput {
    /// The notification that was shown, if any.
    pub shown: Option<Notification>,
}

/// Parameters for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Action identifier of the clicked button ("explore" or "close").
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct NotificationClickOutput {
    pub opened: bool,
}

/// Parameters for the sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SyncOutput {
    pub acknowledged: bool,
}

pub async fn push_impl(state: &ServerState, params: PushParams) -> Result<CallToolResult, McpError> {
    let shown = state.host.push(params.data.map(String::into_bytes)).await?;
    json_result(&PushOutput { shown })
}

pub async fn click_impl(state: &ServerState, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let opened = state.host.notification_click(params.action).await?;
    json_result(&NotificationClickOutput { opened })
}

pub async fn sync_impl(state: &ServerState, params: SyncParams) -> Result<CallToolResult, McpError> {
    let acknowledged = state.host.sync(params.tag).await?;
    json_result(&SyncOutput { acknowledged })
}
