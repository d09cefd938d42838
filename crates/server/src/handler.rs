//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheEntriesParams, entries_impl, keys_impl};
use crate::tools::events::{NotificationClickParams, PushParams, SyncParams, click_impl, push_impl, sync_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};
use crate::tools::sw_update::{SwUpdateParams, update_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_core::http::Transport;
use swcache_core::worker::{HostHandle, Registration, WorkerConfig};

/// Everything the tools need to reach the worker.
pub struct ServerState {
    /// Sending side of the host event loop.
    pub host: HostHandle,
    pub registration: Arc<Registration>,
    /// Default transport for requests the worker declines.
    pub transport: Arc<dyn Transport>,
    /// Generation settings from the loaded configuration.
    pub worker: WorkerConfig,
}

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    state: Arc<ServerState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler.
    pub fn new(state: ServerState) -> Self {
        Self { tool_router: Self::tool_router(), state: Arc::new(state) }
    }

    /// Install and activate a cache generation.
    #[tool(
        description = "Install a new cache generation from the asset manifest and activate it. Stale generations are deleted and all clients are claimed. A failed install leaves the current generation serving."
    )]
    async fn sw_update(&self, params: Parameters<SwUpdateParams>) -> Result<CallToolResult, McpError> {
        update_impl(&self.state, params.0).await
    }

    /// Route a request through the active generation.
    #[tool(
        description = "Fetch a URL through the offline cache: cache first, network fallback, offline page for HTML when the network fails. Cross-origin requests pass straight through."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache store names with the active generation.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.state).await
    }

    #[tool(description = "List the request keys stored in a cache store (default: the active generation).")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a push message. The JSON payload {title, body, primaryKey} is shown as a notification.")]
    async fn push(&self, params: Parameters<PushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a notification click. The \"explore\" action opens the application.")]
    async fn notification_click(&self, params: Parameters<NotificationClickParams>) -> Result<CallToolResult, McpError> {
        click_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a background sync event by tag.")]
    async fn sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.state, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
