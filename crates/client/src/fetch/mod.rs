//! HTTP transport for intercepted requests.
//!
//! ### Status handling
//! - Every HTTP status is returned as a response; only transport failures
//!   (connect, DNS, TLS, timeout, body read) are errors.
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)
//!
//! ### Classification
//! - Final URL on another origin: `cors`
//! - Same origin but redirected: `opaque_redirect`
//! - Otherwise: `basic`

use std::time::{Duration, Instant};

use reqwest::{Client, Method, header};
use url::Url;

use swcache_core::config::{AppConfig, ConfigError};
use swcache_core::http::{InterceptedRequest, ResponseSnapshot, ResponseType, Transport};
use swcache_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin that responses are classified against
    pub origin: Url,
}

impl FetchConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            origin: config.origin_url()?,
        })
    }
}

/// Tag a response by where it ended up relative to where it was requested.
pub fn classify(origin: &Url, requested: &Url, final_url: &Url) -> ResponseType {
    if final_url.origin() != origin.origin() {
        return ResponseType::Cors;
    }

    let mut requested = requested.clone();
    requested.set_fragment(None);
    let mut landed = final_url.clone();
    landed.set_fragment(None);

    if requested == landed { ResponseType::Basic } else { ResponseType::OpaqueRedirect }
}

fn too_large(len: usize, max: usize) -> Error {
    Error::FetchTooLarge(format!("{} bytes exceeds {}", len, max))
}

fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{}: {}", context, err))
    } else {
        Error::Network(format!("{}: {}", context, err))
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method(), e)))?;

        let mut builder = self.http.request(method, request.url().as_str());
        if let Some(accept) = request.accept() {
            builder = builder.header(header::ACCEPT, accept);
        }

        let response = builder.send().await.map_err(|e| transport_error("network error", e))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(too_large(len as usize, self.config.max_bytes));
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| transport_error("failed to read response", e))?;

        if body.len() > self.config.max_bytes {
            return Err(too_large(body.len(), self.config.max_bytes));
        }

        let kind = classify(&self.config.origin, request.url(), &final_url);

        tracing::debug!(
            "fetched {} -> {} {} ({}) in {}ms ({} bytes)",
            request.url(),
            final_url,
            status.as_u16(),
            kind,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseSnapshot {
            url: final_url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind,
        })
    }
}
