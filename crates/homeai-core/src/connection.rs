// ── Connectivity management ──
//
// Per-backend connectivity reporting and the test/connect operations used
// when configuring a backend. Independent of the device data path.

use std::collections::BTreeMap;
use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::adapter::{AdapterSet, DeviceAdapter};
use crate::config::{AdapterSettings, HassSettings, MqttSettings, SmartThingsSettings};
use crate::error::CoreError;
use crate::model::Integration;

#[derive(Clone)]
pub struct ConnectionManager {
    adapters: AdapterSet,
}

impl ConnectionManager {
    pub fn new(adapters: AdapterSet) -> Self {
        Self { adapters }
    }

    fn adapter(&self, integration: Integration) -> Result<&Arc<dyn DeviceAdapter>, CoreError> {
        self.adapters
            .get(&integration)
            .ok_or(CoreError::NotConfigured { integration })
    }

    /// Connected flag for every integration. Integrations without an
    /// adapter (Google Home, Matter) always report `false`.
    pub fn check_all(&self) -> BTreeMap<Integration, bool> {
        Integration::iter()
            .map(|integration| {
                let connected = self
                    .adapters
                    .get(&integration)
                    .is_some_and(|adapter| adapter.is_connected());
                (integration, connected)
            })
            .collect()
    }

    /// Connect every configured adapter concurrently. Failures are logged
    /// and returned per integration; none of them aborts the others.
    pub async fn connect_all(&self) -> BTreeMap<Integration, Result<(), CoreError>> {
        let attempts = self
            .adapters
            .values()
            .filter(|adapter| adapter.is_configured())
            .map(|adapter| async move {
                let integration = adapter.integration();
                let result = adapter.connect().await;
                match &result {
                    Ok(()) => info!(%integration, "backend connected"),
                    Err(e) => warn!(%integration, error = %e, "backend connection failed"),
                }
                (integration, result)
            });
        futures_util::future::join_all(attempts).await.into_iter().collect()
    }

    pub async fn disconnect_all(&self) {
        for adapter in self.adapters.values() {
            adapter.disconnect().await;
        }
    }

    /// Apply new settings to an adapter and connect with them.
    pub async fn try_connect(&self, settings: AdapterSettings) -> Result<(), CoreError> {
        let adapter = self.adapter(settings.integration())?;
        adapter.reconfigure(settings).await?;
        adapter.connect().await
    }

    /// Apply new settings, connect, and report whether the adapter is now connected.
    pub async fn test(&self, settings: AdapterSettings) -> bool {
        let integration = settings.integration();
        if let Err(e) = self.try_connect(settings).await {
            warn!(%integration, error = %e, "connection test failed");
        }
        self.adapters
            .get(&integration)
            .is_some_and(|adapter| adapter.is_connected())
    }

    pub async fn test_home_assistant(&self, settings: HassSettings) -> bool {
        self.test(AdapterSettings::HomeAssistant(settings)).await
    }

    pub async fn test_mqtt(&self, settings: MqttSettings) -> bool {
        self.test(AdapterSettings::Mqtt(settings)).await
    }

    pub async fn test_smartthings(&self, settings: SmartThingsSettings) -> bool {
        self.test(AdapterSettings::SmartThings(settings)).await
    }

    /// Google Home account linking needs an OAuth flow that is not provided.
    pub fn initiate_google_home_auth(&self) -> Result<(), CoreError> {
        Err(CoreError::Unsupported {
            operation: "Google Home authorization".into(),
            required: "an OAuth account-linking flow".into(),
        })
    }
}
