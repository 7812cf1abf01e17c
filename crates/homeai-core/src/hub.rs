// ── Hub facade ──
//
// Full lifecycle for a set of backends: adapter construction, concurrent
// connect, periodic refresh, command routing, chat, and reactive catalog
// streaming through the DeviceStore.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use homeai_api::transport::TransportConfig;

use crate::adapter::{DeviceAdapter, HassAdapter, MqttAdapter, SmartThingsAdapter};
use crate::aggregator::Aggregator;
use crate::assistant::{Assistant, CompletionBackend, OpenAiBackend};
use crate::config::HubConfig;
use crate::connection::ConnectionManager;
use crate::demo;
use crate::error::CoreError;
use crate::model::{ChatMessage, Device, DeviceAction, DeviceState, Integration};
use crate::router::CommandRouter;
use crate::store::{Catalog, DeviceStore};
use crate::stream::CatalogStream;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Does not touch the network until
/// [`connect()`](Self::connect) is called; until then the catalog holds the
/// demonstration devices.
#[derive(Clone)]
pub struct HomeHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    aggregator: Arc<Aggregator>,
    router: CommandRouter,
    connections: ConnectionManager,
    assistant: Assistant,
    cancel: CancellationToken,
    /// Child token for the current connection; cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl HomeHub {
    /// Build a hub with the stock adapters and completion backend.
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let adapters: Vec<Arc<dyn DeviceAdapter>> = vec![
            Arc::new(HassAdapter::new(config.home_assistant.clone(), transport.clone())),
            Arc::new(MqttAdapter::new(config.mqtt.clone())),
            Arc::new(SmartThingsAdapter::new(config.smartthings.clone(), transport.clone())),
        ];
        let completion_transport = TransportConfig {
            tls: transport.tls,
            ..TransportConfig::completion()
        };
        let backend = OpenAiBackend::new(&config.completion, &completion_transport)?;
        Ok(Self::from_parts(config, adapters, Box::new(backend)))
    }

    /// Build a hub around caller-supplied adapters and completion backend.
    pub fn from_parts(
        config: HubConfig,
        adapters: Vec<Arc<dyn DeviceAdapter>>,
        backend: Box<dyn CompletionBackend>,
    ) -> Self {
        let store = Arc::new(DeviceStore::new(demo::catalog()));
        let mut aggregator = Aggregator::new(store);
        for adapter in adapters {
            aggregator.register(adapter);
        }
        let aggregator = Arc::new(aggregator);
        let router = CommandRouter::new(Arc::clone(&aggregator));
        let connections = ConnectionManager::new(aggregator.adapters().clone());

        let mut assistant = Assistant::new(Arc::clone(&aggregator), router.clone(), backend);
        if let Some(prompt) = &config.system_prompt {
            assistant = assistant.with_system_prompt(prompt.clone());
        }

        Self {
            inner: Arc::new(HubInner {
                config,
                aggregator,
                router,
                connections,
                assistant,
                cancel: CancellationToken::new(),
                cancel_child: Mutex::new(CancellationToken::new()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        self.inner.aggregator.store()
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.inner.aggregator
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.inner.connections
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Connect every configured backend, refresh the catalog, and start the
    /// periodic refresh task when an interval is configured.
    ///
    /// Individual backend failures are logged and leave that backend
    /// disconnected; they never fail the whole hub.
    pub async fn connect(&self) -> BTreeMap<Integration, Result<(), CoreError>> {
        // A second connect without a disconnect must not leave the previous
        // refresh task running alongside the new one.
        self.stop_tasks().await;

        // Fresh child token for this connection (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let results = self.inner.connections.connect_all().await;
        self.inner.aggregator.refresh().await;

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let hub = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(hub, interval_secs, child)));
        }

        info!(
            connected = results.values().filter(|r| r.is_ok()).count(),
            attempted = results.len(),
            "hub connected"
        );
        results
    }

    /// Cancel background tasks and close every backend session.
    ///
    /// The hub can be connected again afterwards.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;
        self.inner.connections.disconnect_all().await;
        debug!("disconnected");
    }

    /// Cancel the current connection's token and join its tasks.
    async fn stop_tasks(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub async fn refresh(&self) -> Arc<Catalog> {
        self.inner.aggregator.refresh().await
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.inner.aggregator.snapshot()
    }

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.inner.aggregator.device(id)
    }

    pub fn observe(&self) -> CatalogStream {
        self.inner.aggregator.observe()
    }

    pub async fn update_device_state(&self, id: &str, state: DeviceState) -> Result<(), CoreError> {
        self.inner.aggregator.update_device_state(id, state).await
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn execute(&self, action: &DeviceAction) -> String {
        self.inner.router.execute(action).await
    }

    pub async fn chat(&self, message: &str) -> ChatMessage {
        self.inner.assistant.process(message).await
    }

    pub fn assistant(&self) -> &Assistant {
        &self.inner.assistant
    }

    // ── Connectivity ─────────────────────────────────────────────────

    pub fn check_connections(&self) -> BTreeMap<Integration, bool> {
        self.inner.connections.check_all()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodically refresh the catalog from every backend.
async fn refresh_task(hub: HomeHub, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let catalog = hub.refresh().await;
                debug!(devices = catalog.len(), "periodic refresh complete");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::CatalogOrigin;

    #[tokio::test]
    async fn offline_hub_serves_demo_catalog() {
        let hub = HomeHub::new(HubConfig::default()).unwrap();
        assert_eq!(hub.catalog().origin(), CatalogOrigin::Initial);

        let results = hub.connect().await;
        assert!(results.is_empty());
        let catalog = hub.catalog();
        assert_eq!(catalog.origin(), CatalogOrigin::Demo);
        assert_eq!(catalog.len(), 10);
        assert!(hub.check_connections().values().all(|connected| !connected));

        let reply = hub
            .execute(&DeviceAction::new("garage_door", "Garage Door", crate::model::ActionVerb::TurnOn))
            .await;
        assert_eq!(reply, "Turned on Garage Door");
        hub.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_task_stops_on_disconnect() {
        let config = HubConfig {
            refresh_interval_secs: 5,
            ..HubConfig::default()
        };
        let hub = HomeHub::new(config).unwrap();
        hub.connect().await;
        let mut stream = hub.observe();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(stream.changed().await.is_some());

        hub.disconnect().await;
        assert!(hub.inner.task_handles.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_resumes_after_reconnect() {
        let config = HubConfig {
            refresh_interval_secs: 5,
            ..HubConfig::default()
        };
        let hub = HomeHub::new(config).unwrap();
        hub.connect().await;
        hub.disconnect().await;

        hub.connect().await;
        assert_eq!(hub.inner.task_handles.lock().await.len(), 1);
        let mut stream = hub.observe();

        tokio::time::advance(Duration::from_secs(6)).await;
        let refreshed = tokio::time::timeout(Duration::from_secs(1), stream.changed()).await;
        assert!(matches!(refreshed, Ok(Some(_))), "no periodic refresh after reconnect");

        hub.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_connect_keeps_one_refresh_task() {
        let config = HubConfig {
            refresh_interval_secs: 5,
            ..HubConfig::default()
        };
        let hub = HomeHub::new(config).unwrap();
        hub.connect().await;
        hub.connect().await;
        assert_eq!(hub.inner.task_handles.lock().await.len(), 1);
        hub.disconnect().await;
    }
}
