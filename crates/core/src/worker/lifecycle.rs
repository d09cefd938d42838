//! Lifecycle state machine of one cache generation.
//!
//! `parsed -> installing -> installed -> activating -> activated`,
//! with `redundant` for a failed install or a superseded generation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use super::WorkerConfig;
use super::policy::{Interception, InterceptionPolicy};
use super::populate::CachePopulator;
use super::reap::GenerationReaper;
use crate::Error;
use crate::cache::CacheStorage;
use crate::http::{InterceptedRequest, Transport};

/// Lifecycle state of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Populated and ready to take over.
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    /// Only an activated generation intercepts requests.
    pub fn can_intercept(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives one generation through install and activate, then routes its requests.
pub struct LifecycleController {
    config: Arc<WorkerConfig>,
    state: watch::Sender<WorkerState>,
    populator: CachePopulator,
    reaper: GenerationReaper,
    policy: InterceptionPolicy,
}

impl LifecycleController {
    pub fn new(config: WorkerConfig, storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        Self {
            populator: CachePopulator::new(Arc::clone(&storage), Arc::clone(&transport)),
            reaper: GenerationReaper::new(Arc::clone(&storage)),
            policy: InterceptionPolicy::new(Arc::clone(&config), storage, transport),
            state: watch::Sender::new(WorkerState::Parsed),
            config,
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut found = from;
        let moved = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                found = *state;
                false
            }
        });

        if moved {
            tracing::debug!(version = %self.config.version, from = %from, to = %to, "state change");
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{}: cannot move to {to} from {found}",
                self.config.version
            )))
        }
    }

    /// Install phase: populate the generation's store.
    ///
    /// On success the generation is `installed` and ready to take over at once.
    /// On failure it becomes `redundant`; any previously active generation is
    /// untouched.
    pub async fn install(&self) -> Result<(), Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)?;
        tracing::info!(version = %self.config.version, "installing");

        match self.populator.populate(&self.config).await {
            Ok(_) => {
                self.transition(WorkerState::Installing, WorkerState::Installed)?;
                tracing::info!(version = %self.config.version, "installation complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!(version = %self.config.version, error = %e, "installation failed");
                self.make_redundant();
                Err(e)
            }
        }
    }

    /// Activate phase: reap stale generations.
    ///
    /// Returns the names of the deleted stores. A reaping failure is logged and
    /// does not block activation; the next activation retries it.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating)?;
        tracing::info!(version = %self.config.version, "activating");

        let reaped = match self.reaper.reap(&self.config.version).await {
            Ok(reaped) => reaped,
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "failed to delete old stores");
                Vec::new()
            }
        };

        self.transition(WorkerState::Activating, WorkerState::Activated)?;
        tracing::info!(version = %self.config.version, reaped = reaped.len(), "activation complete");
        Ok(reaped)
    }

    /// Request-intercept phase. Declines everything until `activated`.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<Interception, Error> {
        if !self.state().can_intercept() {
            return Ok(Interception::Declined);
        }
        self.policy.handle(request).await
    }

    /// Retire this generation; it stops intercepting.
    pub fn make_redundant(&self) {
        self.state.send_replace(WorkerState::Redundant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::http::ResponseSnapshot;
    use crate::worker::ResponseSource;
    use crate::worker::testing::{StubTransport, html, origin, url};

    fn transport() -> Arc<StubTransport> {
        Arc::new(
            StubTransport::new()
                .route("metronome_prototype.html", html("<h1>metronome</h1>"))
                .route("manifest.json", ResponseSnapshot::new(200, "{}")),
        )
    }

    fn config(version: &str) -> WorkerConfig {
        WorkerConfig::new(version, origin()).with_manifest(["./metronome_prototype.html", "./manifest.json"])
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let storage = Arc::new(MemoryStorage::new());
        storage.open("timecraft-v0.9.0").await.unwrap();
        let controller = LifecycleController::new(config("timecraft-v1.0.0"), storage.clone(), transport());
        let mut states = controller.subscribe();

        assert_eq!(controller.state(), WorkerState::Parsed);
        controller.install().await.unwrap();
        assert_eq!(controller.state(), WorkerState::Installed);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), WorkerState::Installed);

        let reaped = controller.activate().await.unwrap();
        assert_eq!(reaped, vec!["timecraft-v0.9.0"]);
        assert_eq!(controller.state(), WorkerState::Activated);
        assert_eq!(*states.borrow_and_update(), WorkerState::Activated);
        assert_eq!(storage.keys().await.unwrap(), vec!["timecraft-v1.0.0"]);
    }

    #[tokio::test]
    async fn test_fetch_declined_before_activation() {
        let storage = Arc::new(MemoryStorage::new());
        let controller = LifecycleController::new(config("v1"), storage, transport());
        controller.install().await.unwrap();

        let outcome = controller.handle_fetch(&InterceptedRequest::navigate(url("metronome_prototype.html"))).await;
        assert!(matches!(outcome, Ok(Interception::Declined)));

        controller.activate().await.unwrap();
        let outcome = controller
            .handle_fetch(&InterceptedRequest::navigate(url("metronome_prototype.html")))
            .await
            .unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
    }

    #[tokio::test]
    async fn test_install_failure_is_redundant() {
        let storage = Arc::new(MemoryStorage::new());
        let controller = LifecycleController::new(config("v2"), storage.clone(), Arc::new(StubTransport::new()));

        assert!(matches!(controller.install().await, Err(Error::InstallFailed { .. })));
        assert_eq!(controller.state(), WorkerState::Redundant);
        assert!(matches!(controller.activate().await, Err(Error::InvalidState(_))));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let controller = LifecycleController::new(config("v1"), Arc::new(MemoryStorage::new()), transport());
        controller.install().await.unwrap();
        assert!(matches!(controller.install().await, Err(Error::InvalidState(_))));
    }
}
