// ── Home Assistant adapter ──
//
// Stateless polling over the REST API. Every listing is a fresh
// `GET /api/states`; every state change is one service call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use homeai_api::HassClient;
use homeai_api::transport::TransportConfig;

use super::{DeviceAdapter, settings_mismatch};
use crate::config::{AdapterSettings, HassSettings};
use crate::convert::hass::{entity_to_device, service_call};
use crate::error::CoreError;
use crate::model::{Device, DeviceRoute, DeviceState, Integration};

pub struct HassAdapter {
    transport: TransportConfig,
    settings: ArcSwapOption<HassSettings>,
    client: ArcSwapOption<HassClient>,
    connected: AtomicBool,
}

impl HassAdapter {
    pub fn new(settings: Option<HassSettings>, transport: TransportConfig) -> Self {
        Self {
            transport,
            settings: ArcSwapOption::from(settings.map(Arc::new)),
            client: ArcSwapOption::empty(),
            connected: AtomicBool::new(false),
        }
    }

    fn client(&self) -> Result<Arc<HassClient>, CoreError> {
        match self.client.load_full() {
            Some(client) if self.is_connected() => Ok(client),
            _ => Err(CoreError::IntegrationDisconnected {
                integration: Integration::HomeAssistant,
            }),
        }
    }

    /// Drop the connected flag if `err` means the hub is unreachable.
    fn observe_error(&self, err: CoreError) -> CoreError {
        if err.is_connectivity() {
            self.connected.store(false, Ordering::Release);
        }
        err
    }
}

#[async_trait]
impl DeviceAdapter for HassAdapter {
    fn integration(&self) -> Integration {
        Integration::HomeAssistant
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn is_configured(&self) -> bool {
        self.settings.load().is_some()
    }

    async fn reconfigure(&self, settings: AdapterSettings) -> Result<(), CoreError> {
        let AdapterSettings::HomeAssistant(settings) = settings else {
            return Err(settings_mismatch(Integration::HomeAssistant, &settings));
        };
        self.disconnect().await;
        self.settings.store(Some(Arc::new(settings)));
        Ok(())
    }

    async fn connect(&self) -> Result<(), CoreError> {
        let settings = self.settings.load_full().ok_or(CoreError::NotConfigured {
            integration: Integration::HomeAssistant,
        })?;

        self.connected.store(false, Ordering::Release);
        let client = HassClient::new(settings.url.clone(), &settings.token, &self.transport)?;
        client.ping().await?;

        info!(url = %settings.url, "connected to Home Assistant");
        self.client.store(Some(Arc::new(client)));
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.client.store(None);
    }

    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        let client = self.client()?;
        let states = client
            .list_states()
            .await
            .map_err(|e| self.observe_error(e.into()))?;

        let total = states.len();
        let devices: Vec<Device> = states.iter().filter_map(entity_to_device).collect();
        debug!(entities = total, devices = devices.len(), "classified Home Assistant entities");
        Ok(devices)
    }

    async fn set_state(&self, device: &Device, state: &DeviceState) -> Result<(), CoreError> {
        let DeviceRoute::HomeAssistant { entity_id } = &device.route else {
            return Err(CoreError::RouteMismatch {
                identifier: device.id.to_string(),
                integration: Integration::HomeAssistant,
            });
        };

        let client = self.client()?;
        let call = service_call(entity_id, state);
        debug!(entity_id, service = call.service, "calling Home Assistant service");
        if let Err(e) = client.call_service(&call.domain, call.service, &call.data).await {
            warn!(entity_id, error = %e, "service call failed");
            return Err(self.observe_error(e.into()));
        }
        Ok(())
    }
}
