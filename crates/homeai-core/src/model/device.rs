// ── Device domain types ──
//
// The unified device model every adapter normalizes into. Identifiers
// carry their owning backend in their shape (`light.kitchen`,
// `tasmota_<id>`, `zigbee_<id>`, SmartThings UUIDs), so they never collide
// across adapters.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── DeviceId ────────────────────────────────────────────────────────

/// Opaque, backend-specific device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── DeviceType ──────────────────────────────────────────────────────

/// Device category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DeviceType {
    Light,
    Switch,
    Thermostat,
    Lock,
    Sensor,
    Camera,
    Speaker,
    Fan,
    Blinds,
    Plug,
    Tv,
    Other,
}

// ── Integration ─────────────────────────────────────────────────────

/// Backend a device belongs to, for display and connectivity reporting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Integration {
    HomeAssistant,
    GoogleHome,
    #[serde(rename = "smartthings")]
    #[strum(serialize = "smartthings")]
    SmartThings,
    Mqtt,
    Matter,
}

impl Integration {
    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::HomeAssistant => "Home Assistant",
            Self::GoogleHome => "Google Home",
            Self::SmartThings => "SmartThings",
            Self::Mqtt => "MQTT",
            Self::Matter => "Matter",
        }
    }
}

// ── DeviceState ─────────────────────────────────────────────────────

/// Structural snapshot of a device's controllable state.
///
/// Optional fields are "not applicable" when absent, never zero.
/// Brightness and level are percentages in `0..=100`; temperatures are °F.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub is_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl DeviceState {
    pub fn on() -> Self {
        Self {
            is_on: true,
            ..Self::default()
        }
    }

    /// Short summary for tables: `on`, `off`, `locked`, `unlocked`.
    pub fn summary(&self) -> &'static str {
        match self.is_locked {
            Some(true) => "locked",
            Some(false) => "unlocked",
            None if self.is_on => "on",
            None => "off",
        }
    }
}

// ── Routing ─────────────────────────────────────────────────────────

/// MQTT firmware family a broker device was discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FirmwareFamily {
    Tasmota,
    Zigbee2Mqtt,
}

/// Backend-specific addressing needed to send commands to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceRoute {
    HomeAssistant { entity_id: String },
    Mqtt { topic: String, family: FirmwareFamily },
    SmartThings { device_id: String },
    /// Held only in memory (demo catalog, manually added devices).
    Local,
}

impl DeviceRoute {
    /// The adapter responsible for this route, if any.
    pub fn integration(&self) -> Option<Integration> {
        match self {
            Self::HomeAssistant { .. } => Some(Integration::HomeAssistant),
            Self::Mqtt { .. } => Some(Integration::Mqtt),
            Self::SmartThings { .. } => Some(Integration::SmartThings),
            Self::Local => None,
        }
    }
}

// ── Device ──────────────────────────────────────────────────────────

/// A controllable device in the unified catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub room: String,
    pub integration: Integration,
    pub state: DeviceState,
    pub route: DeviceRoute,
}

impl Device {
    /// Copy of this device carrying a different state.
    pub fn with_state(&self, state: DeviceState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
