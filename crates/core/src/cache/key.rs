//! Request identity used to address store entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Normalized request identity: method plus canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Build a key, upper-casing the method and dropping any fragment.
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// Only `GET` entries are ever matched or stored.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// Content-addressed row key for this identity.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// Compute the row key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://timecraft.test/");
        let hash2 = compute_cache_key("GET", "https://timecraft.test/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        assert_ne!(
            compute_cache_key("GET", "https://timecraft.test/"),
            compute_cache_key("POST", "https://timecraft.test/")
        );
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://timecraft.test/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = RequestKey::get(&Url::parse("https://timecraft.test/app.html#top").unwrap());
        let b = RequestKey::new("get", &Url::parse("https://timecraft.test/app.html").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_only_get_cacheable() {
        let url = Url::parse("https://timecraft.test/api").unwrap();
        assert!(RequestKey::get(&url).is_cacheable());
        assert!(!RequestKey::new("POST", &url).is_cacheable());
        assert!(!RequestKey::new("HEAD", &url).is_cacheable());
    }
}
