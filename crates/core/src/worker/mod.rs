//! The offline-asset worker: versioned cache lifecycle and fetch interception.
//!
//! ### Phases
//! - **install**: `CachePopulator` seeds the generation's store from the asset
//!   manifest. All-or-nothing; a failure leaves the previous generation serving.
//! - **activate**: `GenerationReaper` deletes every store not named by the
//!   current version, then the new controller claims all clients.
//! - **fetch**: `InterceptionPolicy` answers same-origin requests cache-first,
//!   falls back to the network (writing 200/basic responses back), and
//!   substitutes an offline page for failed HTML requests.
//!
//! `Registration` decides which generation is active; `host` runs the
//! message-passing loop that turns host signals into independent tasks.

pub mod host;
pub mod lifecycle;
pub mod notify;
pub mod offline;
pub mod policy;
pub mod populate;
pub mod reap;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

pub use host::{HostEvent, HostHandle};
pub use lifecycle::{LifecycleController, WorkerState};
pub use notify::{Notification, NotificationHost, NotifyConfig, PushPayload};
pub use policy::{Interception, InterceptionPolicy, ResponseSource};
pub use populate::CachePopulator;
pub use reap::GenerationReaper;
pub use registration::{Registration, UpdateOutcome};

use url::{Origin, Url};

/// Immutable configuration of one cache generation.
///
/// Injected into the lifecycle controller at construction; nothing about a
/// generation is read from process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Version identifier; also the name of the generation's store.
    pub version: String,
    /// The service's own origin.
    pub origin: Url,
    /// Locators that must be stored before the generation is populated.
    pub manifest: Vec<String>,
    /// Used in the offline page title.
    pub app_name: String,
    /// Heading of the offline page.
    pub offline_heading: String,
}

impl WorkerConfig {
    pub fn new(version: impl Into<String>, origin: Url) -> Self {
        Self {
            version: version.into(),
            origin,
            manifest: Vec::new(),
            app_name: "TimeCraft".into(),
            offline_heading: "🎵 TimeCraft Metronome".into(),
        }
    }

    pub fn with_manifest<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn scope(&self) -> Origin {
        self.origin.origin()
    }
}
