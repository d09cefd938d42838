//! Which generation is active and which clients it controls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use super::WorkerConfig;
use super::lifecycle::{LifecycleController, WorkerState};
use super::policy::Interception;
use crate::Error;
use crate::cache::CacheStorage;
use crate::http::{InterceptedRequest, Transport};

/// Result of a successful `Registration::update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct UpdateOutcome {
    pub version: String,
    pub state: WorkerState,
    /// Stores deleted during activation.
    pub reaped: Vec<String>,
    /// Number of clients now controlled by this generation.
    pub claimed: usize,
}

/// Tracks the active generation and the connected clients.
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    active: RwLock<Option<Arc<LifecycleController>>>,
    /// Client id to the version controlling it.
    clients: RwLock<HashMap<String, Option<String>>>,
    updating: Mutex<()>,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>) -> Self {
        Self {
            storage,
            transport,
            active: RwLock::new(None),
            clients: RwLock::new(HashMap::new()),
            updating: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Install a new generation, activate it, and hand it every client.
    ///
    /// Takeover is eager: there is no waiting period for open clients. The
    /// current active generation keeps serving while the new one installs and
    /// activates, and is retired only once the new one is `activated`.
    /// Updates are serialized.
    ///
    /// # Errors
    ///
    /// Returns the install error when population fails. The active generation
    /// and its store are left as they were.
    pub async fn update(&self, config: WorkerConfig) -> Result<UpdateOutcome, Error> {
        let _updating = self.updating.lock().await;

        let controller =
            Arc::new(LifecycleController::new(config, Arc::clone(&self.storage), Arc::clone(&self.transport)));
        controller.install().await?;

        // The previous generation keeps answering requests until this one is activated.
        let reaped = controller.activate().await?;

        let previous = self.active.write().await.replace(Arc::clone(&controller));
        if let Some(previous) = previous {
            tracing::info!(old = previous.version(), new = controller.version(), "replacing active generation");
            previous.make_redundant();
        }

        let claimed = self.claim().await;

        Ok(UpdateOutcome { version: controller.version().to_string(), state: controller.state(), reaped, claimed })
    }

    /// Put every connected client under the active generation.
    ///
    /// Returns the number of clients claimed.
    pub async fn claim(&self) -> usize {
        let Some(version) = self.active_version().await else {
            return 0;
        };

        let mut clients = self.clients.write().await;
        for controller in clients.values_mut() {
            *controller = Some(version.clone());
        }
        tracing::debug!(version = %version, clients = clients.len(), "claimed clients");
        clients.len()
    }

    /// Register a client. It is controlled by the active generation, if any.
    pub async fn connect_client(&self, id: impl Into<String>) -> Option<String> {
        let version = self.active_version().await;
        self.clients.write().await.insert(id.into(), version.clone());
        version
    }

    pub async fn disconnect_client(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// Version controlling `id`, or `None` if the client is unknown or uncontrolled.
    pub async fn controller_of(&self, id: &str) -> Option<String> {
        self.clients.read().await.get(id).cloned().flatten()
    }

    /// Route a request to the active generation. Declined when none is active.
    pub async fn fetch(&self, request: &InterceptedRequest) -> Result<Interception, Error> {
        let active = self.active.read().await.clone();
        match active {
            Some(controller) => controller.handle_fetch(request).await,
            None => Ok(Interception::Declined),
        }
    }

    pub async fn active_version(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|c| c.version().to_string())
    }
}
