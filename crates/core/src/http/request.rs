//! Intercepted outbound requests.

use url::{Origin, Url};

use crate::Error;
use crate::cache::RequestKey;

/// A transient, per-fetch request as seen by the interception policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    method: String,
    url: Url,
    accept: Option<String>,
}

impl InterceptedRequest {
    /// Build a request with an explicit method.
    ///
    /// The method is upper-cased and must be a non-empty alphabetic token.
    pub fn new(method: &str, url: Url, accept: Option<String>) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!("invalid HTTP method: {method:?}")));
        }

        Ok(Self { method: method.to_ascii_uppercase(), url, accept })
    }

    /// A plain `GET` with no accept hint.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, accept: None }
    }

    /// A document navigation, which accepts HTML.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Whether the request targets the given origin (scheme, host and port).
    pub fn is_same_origin(&self, origin: &Origin) -> bool {
        &self.url.origin() == origin
    }

    /// Whether a synthetic HTML page is an acceptable substitute.
    pub fn accepts_html(&self) -> bool {
        self.accept.as_deref().is_some_and(|a| a.contains("text/html"))
    }

    /// Normalized store identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_normalized() {
        let req = InterceptedRequest::new(" post ", url("https://timecraft.test/api"), None).unwrap();
        assert_eq!(req.method(), "POST");
    }

    #[test]
    fn test_invalid_method() {
        assert!(InterceptedRequest::new("", url("https://timecraft.test/"), None).is_err());
        assert!(InterceptedRequest::new("GE T", url("https://timecraft.test/"), None).is_err());
    }

    #[test]
    fn test_same_origin() {
        let origin = url("https://timecraft.test/").origin();
        assert!(InterceptedRequest::get(url("https://timecraft.test/app.js")).is_same_origin(&origin));
        assert!(!InterceptedRequest::get(url("https://cdn.test/app.js")).is_same_origin(&origin));
        assert!(!InterceptedRequest::get(url("http://timecraft.test/app.js")).is_same_origin(&origin));
        assert!(!InterceptedRequest::get(url("https://timecraft.test.evil.com/")).is_same_origin(&origin));
    }

    #[test]
    fn test_accepts_html() {
        let page = InterceptedRequest::navigate(url("https://timecraft.test/"));
        assert!(page.accepts_html());

        let image = InterceptedRequest::get(url("https://timecraft.test/icon.png")).with_accept("image/png");
        assert!(!image.accepts_html());

        let bare = InterceptedRequest::get(url("https://timecraft.test/data.json"));
        assert!(!bare.accepts_html());
    }
}
