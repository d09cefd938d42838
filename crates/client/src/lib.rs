//! Client code for swcache.
//!
//! This crate provides the reqwest-backed network transport used by the
//! worker when a request misses the cache.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, classify};
