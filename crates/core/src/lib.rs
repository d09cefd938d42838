//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned response stores (SQLite and in-memory providers)
//! - The worker lifecycle: install, activate, fetch interception
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, RequestKey};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{InterceptedRequest, ResponseSnapshot, ResponseType, Transport};
pub use worker::{
    HostHandle, Interception, LifecycleController, Notification, NotificationHost, NotifyConfig, Registration,
    ResponseSource, UpdateOutcome, WorkerConfig, WorkerState,
};
