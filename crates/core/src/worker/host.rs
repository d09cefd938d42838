//! Host event loop.
//!
//! Every host signal travels over an mpsc channel and is dispatched as its own
//! task. The `oneshot` reply is the deferral handle: the caller's future
//! resolves only once the phase's async work has finished.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::WorkerConfig;
use super::notify::{self, Notification, NotificationHost, NotifyConfig};
use super::policy::Interception;
use super::registration::{Registration, UpdateOutcome};
use crate::Error;
use crate::http::InterceptedRequest;

const EVENT_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, Error>>;

/// A signal delivered by the host.
#[derive(Debug)]
pub enum HostEvent {
    /// Install a new generation and activate it.
    Update { config: WorkerConfig, done: Reply<UpdateOutcome> },
    Fetch { request: InterceptedRequest, done: Reply<Interception> },
    Push { data: Option<Vec<u8>>, done: Reply<Option<Notification>> },
    NotificationClick { action: String, done: Reply<bool> },
    Sync { tag: String, done: Reply<bool> },
}

/// Sending side of the event loop.
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::Sender<HostEvent>,
}

impl HostHandle {
    async fn request<T>(&self, event: impl FnOnce(Reply<T>) -> HostEvent) -> Result<T, Error> {
        let (done, reply) = oneshot::channel();
        self.tx.send(event(done)).await.map_err(|_| Error::HostClosed)?;
        reply.await.map_err(|_| Error::HostClosed)?
    }

    pub async fn update(&self, config: WorkerConfig) -> Result<UpdateOutcome, Error> {
        self.request(|done| HostEvent::Update { config, done }).await
    }

    pub async fn fetch(&self, request: InterceptedRequest) -> Result<Interception, Error> {
        self.request(|done| HostEvent::Fetch { request, done }).await
    }

    pub async fn push(&self, data: Option<Vec<u8>>) -> Result<Option<Notification>, Error> {
        self.request(|done| HostEvent::Push { data, done }).await
    }

    pub async fn notification_click(&self, action: impl Into<String>) -> Result<bool, Error> {
        let action = action.into();
        self.request(|done| HostEvent::NotificationClick { action, done }).await
    }

    pub async fn sync(&self, tag: impl Into<String>) -> Result<bool, Error> {
        let tag = tag.into();
        self.request(|done| HostEvent::Sync { tag, done }).await
    }
}

struct Dispatcher {
    registration: Arc<Registration>,
    notifier: Arc<dyn NotificationHost>,
    notify: NotifyConfig,
}

impl Dispatcher {
    async fn dispatch(&self, event: HostEvent) {
        match event {
            HostEvent::Update { config, done } => {
                let _ = done.send(self.registration.update(config).await);
            }
            HostEvent::Fetch { request, done } => {
                let _ = done.send(self.registration.fetch(&request).await);
            }
            HostEvent::Push { data, done } => {
                let result = notify::handle_push(self.notifier.as_ref(), data.as_deref(), &self.notify).await;
                let _ = done.send(result);
            }
            HostEvent::NotificationClick { action, done } => {
                let result = notify::handle_notification_click(self.notifier.as_ref(), &action, &self.notify).await;
                let _ = done.send(result);
            }
            HostEvent::Sync { tag, done } => {
                let _ = done.send(Ok(notify::handle_sync(&tag)));
            }
        }
    }
}

/// Start the event loop. It runs until every `HostHandle` is dropped.
pub fn spawn(
    registration: Arc<Registration>, notifier: Arc<dyn NotificationHost>, notify: NotifyConfig,
) -> (HostHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let dispatcher = Arc::new(Dispatcher { registration, notifier, notify });

    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(event).await });
        }
        tracing::debug!("host event loop stopped");
    });

    (HostHandle { tx }, task)
}
