//! sw_fetch tool implementation.
//!
//! Routes a request through the active generation. Requests the worker
//! declines go to the default transport unmodified.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::http::{InterceptedRequest, ResponseSnapshot, ResponseType, canonicalize};
use swcache_core::worker::{Interception, ResponseSource};
use swcache_core::Error;

use super::json_result;
use crate::handler::ServerState;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// The URL to fetch, absolute or relative to the origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Treat the request as a document navigation (accepts HTML) when no
    /// Accept header is given.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The canonical URL requested.
    pub url: String,
    /// Whether the active generation handled the request.
    pub intercepted: bool,
    /// Where the response came from; absent when not intercepted.
    pub source: Option<ResponseSource>,
    pub status: u16,
    pub status_text: String,
    /// Final URL of the response.
    pub response_url: String,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
    /// Response body, decoded lossily as UTF-8.
    pub body: String,
    /// Body size in bytes.
    pub bytes: usize,
    /// Whether the response is being written into the active store.
    pub stored: bool,
}

impl SwFetchOutput {
    fn new(url: String, source: Option<ResponseSource>, response: &ResponseSnapshot, stored: bool) -> Self {
        Self {
            url,
            intercepted: source.is_some(),
            source,
            status: response.status,
            status_text: response.status_text.clone(),
            response_url: response.url.clone(),
            response_type: response.kind,
            content_type: response.content_type().map(String::from),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            bytes: response.body.len(),
            stored,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(state: &ServerState, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, &state.worker.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let accept = params.accept.or_else(|| params.navigate.then(|| HTML_ACCEPT.to_string()));
    let request = InterceptedRequest::new(&params.method, url, accept)?;

    let output = match state.host.fetch(request.clone()).await? {
        Interception::Declined => {
            tracing::debug!(url = %request.url(), "not intercepted, using default transport");
            let response = state.transport.fetch(&request).await?;
            SwFetchOutput::new(request.url().to_string(), None, &response, false)
        }
        Interception::Responded { response, source, write_back } => {
            SwFetchOutput::new(request.url().to_string(), Some(source), &response, write_back.is_some())
        }
    };

    json_result(&output)
}
