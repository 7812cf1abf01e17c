// ── SmartThings adapter ──
//
// Capability-negotiation client. A listing is one device-list request
// followed by a status read per device capability, each of which degrades
// to defaults on failure rather than dropping the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use homeai_api::SmartThingsClient;
use homeai_api::smartthings::DeviceEntry;
use homeai_api::transport::TransportConfig;

use super::{DeviceAdapter, settings_mismatch};
use crate::config::{AdapterSettings, SmartThingsSettings};
use crate::convert::UNKNOWN_ROOM;
use crate::convert::smartthings::{
    StatusSource, apply_capability_status, apply_thermostat_status, classify, state_commands,
    status_source,
};
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceRoute, DeviceState, Integration};

pub struct SmartThingsAdapter {
    transport: TransportConfig,
    settings: ArcSwapOption<SmartThingsSettings>,
    client: ArcSwapOption<SmartThingsClient>,
    connected: AtomicBool,
}

impl SmartThingsAdapter {
    pub fn new(settings: Option<SmartThingsSettings>, transport: TransportConfig) -> Self {
        Self {
            transport,
            settings: ArcSwapOption::from(settings.map(Arc::new)),
            client: ArcSwapOption::empty(),
            connected: AtomicBool::new(false),
        }
    }

    fn client(&self) -> Result<Arc<SmartThingsClient>, CoreError> {
        match self.client.load_full() {
            Some(client) if self.is_connected() => Ok(client),
            _ => Err(CoreError::IntegrationDisconnected {
                integration: Integration::SmartThings,
            }),
        }
    }

    fn observe_error(&self, err: CoreError) -> CoreError {
        if err.is_connectivity() {
            self.connected.store(false, Ordering::Release);
        }
        err
    }
}

#[async_trait]
impl DeviceAdapter for SmartThingsAdapter {
    fn integration(&self) -> Integration {
        Integration::SmartThings
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn is_configured(&self) -> bool {
        self.settings.load().is_some()
    }

    async fn reconfigure(&self, settings: AdapterSettings) -> Result<(), CoreError> {
        let AdapterSettings::SmartThings(settings) = settings else {
            return Err(settings_mismatch(Integration::SmartThings, &settings));
        };
        self.disconnect().await;
        self.settings.store(Some(Arc::new(settings)));
        Ok(())
    }

    async fn connect(&self) -> Result<(), CoreError> {
        let settings = self.settings.load_full().ok_or(CoreError::NotConfigured {
            integration: Integration::SmartThings,
        })?;

        self.connected.store(false, Ordering::Release);
        let client = match &settings.base_url {
            Some(base) => SmartThingsClient::with_base_url(base.clone(), &settings.token, &self.transport)?,
            None => SmartThingsClient::new(&settings.token, &self.transport)?,
        };
        let locations = client.list_locations().await?;

        info!(locations = locations.len(), "connected to SmartThings");
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
        let entries = client
            .list_devices()
            .await
            .map_err(|e| self.observe_error(e.into()))?;

        debug!(devices = entries.len(), "resolving SmartThings device status");
        let devices = join_all(entries.iter().map(|entry| resolve_device(&client, entry))).await;
        Ok(devices)
    }

    async fn set_state(&self, device: &Device, state: &DeviceState) -> Result<(), CoreError> {
        let DeviceRoute::SmartThings { device_id } = &device.route else {
            return Err(CoreError::RouteMismatch {
                identifier: device.id.to_string(),
                integration: Integration::SmartThings,
            });
        };

        let client = self.client()?;
        let commands = state_commands(state);
        if let Err(e) = client.execute_commands(device_id, &commands).await {
            warn!(device_id, error = %e, "command batch failed");
            return Err(self.observe_error(e.into()));
        }
        Ok(())
    }
}

/// Build one device, reading its capabilities' status in declaration order.
async fn resolve_device(client: &SmartThingsClient, entry: &DeviceEntry) -> Device {
    let id = entry.device_id.as_str();
    let mut state = DeviceState::default();
    let mut device_status: Option<Option<Value>> = None;

    for capability in entry.capability_ids() {
        match status_source(capability) {
            Some(StatusSource::Capability) => {
                let status = client
                    .capability_status(id, capability)
                    .await
                    .inspect_err(|e| debug!(id, capability, error = %e, "capability status unavailable"))
                    .ok();
                apply_capability_status(capability, status.as_ref(), &mut state);
            }
            Some(StatusSource::Device) => {
                if device_status.is_none() {
                    let status = client
                        .device_status(id)
                        .await
                        .inspect_err(|e| debug!(id, error = %e, "device status unavailable"))
                        .ok();
                    device_status = Some(status);
                }
                apply_thermostat_status(device_status.as_ref().and_then(Option::as_ref), &mut state);
            }
            None => {}
        }
    }

    let room = match entry.room_id.as_deref() {
        Some(room_id) => client
            .get_room(room_id)
            .await
            .inspect_err(|e| debug!(id, room_id, error = %e, "room lookup failed"))
            .ok()
            .and_then(|room| room.name),
        None => None,
    };

    Device {
        id: DeviceId::from(id),
        name: entry.display_name().to_owned(),
        device_type: classify(entry.capability_ids()),
        room: room.unwrap_or_else(|| UNKNOWN_ROOM.to_owned()),
        integration: Integration::SmartThings,
        state,
        route: DeviceRoute::SmartThings {
            device_id: entry.device_id.clone(),
        },
    }
}
