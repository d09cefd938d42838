//! Request and response model shared by the store, the policy and the transport.
//!
//! Response bodies are `bytes::Bytes`, so a snapshot handed to the caller and
//! the copy written back into a store share one read-only buffer. There is no
//! separate "duplicate the response" step.

pub mod request;
pub mod response;
pub mod url;

pub use request::InterceptedRequest;
pub use response::{ResponseSnapshot, ResponseType};
pub use self::url::{UrlError, canonicalize};

use crate::Error;

/// Live network transport.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status, and `Err` only for connectivity failures.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request against the network.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error>;
}
