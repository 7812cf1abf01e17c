// ── Backend adapters ──
//
// One adapter per backend, each translating its native representation
// into the unified device model and back. Adapters own their session and
// connection flag; nothing else writes them.

mod hass;
mod mqtt;
mod smartthings;

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::warn;

use crate::config::AdapterSettings;
use crate::error::CoreError;
use crate::model::{Device, DeviceState, Integration};

pub use hass::HassAdapter;
pub use mqtt::MqttAdapter;
pub use smartthings::SmartThingsAdapter;

/// Registered adapters, keyed by the integration they serve.
pub type AdapterSet = IndexMap<Integration, Arc<dyn DeviceAdapter>>;

/// Common contract for every backend.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    fn integration(&self) -> Integration;

    /// Whether the last connect (or request) succeeded.
    fn is_connected(&self) -> bool;

    /// Whether settings have been supplied.
    fn is_configured(&self) -> bool;

    /// Swap in new settings. Drops any open session.
    async fn reconfigure(&self, settings: AdapterSettings) -> Result<(), CoreError>;

    /// Open a session with the current settings and set the connected flag.
    async fn connect(&self) -> Result<(), CoreError>;

    async fn disconnect(&self);

    /// Current devices, or why they could not be read.
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError>;

    /// Fail-soft listing: any error is logged and yields no devices.
    async fn list_devices(&self) -> Vec<Device> {
        match self.fetch_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(integration = %self.integration(), error = %e, "device listing failed");
                Vec::new()
            }
        }
    }

    /// Push a desired state to the backend.
    async fn set_state(&self, device: &Device, state: &DeviceState) -> Result<(), CoreError>;
}

fn settings_mismatch(expected: Integration, got: &AdapterSettings) -> CoreError {
    CoreError::Config {
        message: format!(
            "{} adapter cannot use {} settings",
            expected.label(),
            got.integration().label()
        ),
    }
}
