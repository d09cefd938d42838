//! Cache-related MCP tools.
//!
//! This module provides read-only views of the versioned stores.

pub mod entries;
pub mod keys;

pub use entries::{CacheEntriesParams, entries_impl};
pub use keys::keys_impl;
