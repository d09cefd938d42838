//! Server state wired to in-memory collaborators for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;
use swcache_core::http::{InterceptedRequest, ResponseSnapshot, Transport};
use swcache_core::worker::{Registration, WorkerConfig, host};
use swcache_core::{Error, MemoryStorage};
use url::Url;

use crate::handler::ServerState;
use crate::notifier::LogNotifier;

pub(crate) const ORIGIN: &str = "https://timecraft.test/";

/// Answers from a route table keyed by absolute URL; anything else fails as offline.
#[derive(Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
}

impl StubTransport {
    pub(crate) fn route(self, url: &str, response: ResponseSnapshot) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), response);
        self
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        self.routes
            .lock()
            .unwrap()
            .get(request.url().as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("offline: {}", request.url())))
    }
}

pub(crate) fn online() -> StubTransport {
    StubTransport::default()
        .route(
            "https://timecraft.test/metronome_prototype.html",
            ResponseSnapshot::new(200, "<h1>metronome</h1>").with_header("Content-Type", "text/html"),
        )
        .route("https://timecraft.test/manifest.json", ResponseSnapshot::new(200, "{}"))
        .route("https://timecraft.test/app.js", ResponseSnapshot::new(200, "console.log(1)"))
        .route("https://fonts.example.com/font.css", ResponseSnapshot::new(200, "@font-face{}"))
}

pub(crate) fn state(transport: StubTransport) -> (ServerState, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let registration = Arc::new(Registration::new(storage.clone(), Arc::clone(&transport)));
    let worker = WorkerConfig::new("timecraft-v1.0.0", Url::parse(ORIGIN).unwrap())
        .with_manifest(["./metronome_prototype.html", "./manifest.json"]);
    let notify = swcache_core::NotifyConfig {
        app_name: "TimeCraft".into(),
        icon: "./icon-192.png".into(),
        open_target: "./metronome_prototype.html".into(),
    };
    let (host, _events) = host::spawn(Arc::clone(&registration), Arc::new(LogNotifier), notify);
    (ServerState { host, registration, transport, worker }, storage)
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output(result: &CallToolResult) -> serde_json::Value {
    let value = serde_json::to_value(result).unwrap();
    serde_json::from_str(value["content"][0]["text"].as_str().unwrap()).unwrap()
}
