//! In-process collaborators for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;
use url::Url;

use super::notify::{Notification, NotificationHost};
use crate::Error;
use crate::cache::{CacheStorage, MemoryStorage, RequestKey};
use crate::http::{InterceptedRequest, ResponseSnapshot, Transport};

pub(crate) const ORIGIN: &str = "https://timecraft.test/";

pub(crate) fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub(crate) fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub(crate) fn html(body: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(200, body.to_string()).with_header("Content-Type", "text/html")
}

/// Transport answering from a fixed route table; unknown URLs fail as offline.
#[derive(Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: AtomicUsize,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, path: &str, response: ResponseSnapshot) -> Self {
        self.set(path, response);
        self
    }

    pub(crate) fn set(&self, path: &str, response: ResponseSnapshot) {
        self.routes.lock().unwrap().insert(url(path).to_string(), response);
    }

    pub(crate) fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .lock()
            .unwrap()
            .get(request.url().as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("offline: {}", request.url())))
    }
}

/// Storage whose writes always fail while reads fall through to memory.
#[derive(Default)]
pub(crate) struct ReadOnlyStorage {
    pub(crate) inner: MemoryStorage,
}

fn unavailable() -> Error {
    Error::StoreUnavailable("quota exceeded".into())
}

#[async_trait::async_trait]
impl CacheStorage for ReadOnlyStorage {
    async fn open(&self, _name: &str) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, _name: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.match_request(name, key).await
    }

    async fn put(&self, _name: &str, _key: &RequestKey, _response: &ResponseSnapshot) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn put_all(&self, _name: &str, _entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.entries(name).await
    }
}

/// Memory storage whose next `keys()` call parks until released.
///
/// `entered` fires once the parked call has started.
#[derive(Default)]
pub(crate) struct GatedStorage {
    pub(crate) inner: MemoryStorage,
    gated: AtomicBool,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

impl GatedStorage {
    pub(crate) fn gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CacheStorage for GatedStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.match_request(name, key).await
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.inner.put(name, key, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        self.inner.put_all(name, entries).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.entries(name).await
    }
}

/// Notification host that records what it was asked to do.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) shown: Mutex<Vec<Notification>>,
    pub(crate) opened: Mutex<Vec<String>>,
    pub(crate) closed: AtomicUsize,
}

#[async_trait::async_trait]
impl NotificationHost for RecordingNotifier {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self) -> Result<(), Error> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_window(&self, target: &str) -> Result<(), Error> {
        self.opened.lock().unwrap().push(target.to_string());
        Ok(())
    }
}
