// ── Runtime connection configuration ──
//
// These types describe *how* to reach each backend. They carry credential
// data and connection tuning, but never touch disk. The CLI (via
// homeai-config) constructs a `HubConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use homeai_api::transport::{TlsMode, TransportConfig};

use crate::model::Integration;

/// TLS verification strategy for HTTP backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed hubs on the LAN).
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn to_tls_mode(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Home Assistant connection parameters.
#[derive(Debug, Clone)]
pub struct HassSettings {
    /// Hub root, e.g. `http://homeassistant.local:8123`.
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
}

/// MQTT broker connection parameters.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    /// `tcp://host:port`
    pub broker_url: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// SmartThings connection parameters.
#[derive(Debug, Clone)]
pub struct SmartThingsSettings {
    /// Personal access token.
    pub token: SecretString,
    /// API root override; `None` uses the production endpoint.
    pub base_url: Option<Url>,
}

/// Chat completion parameters. A missing key disables free-form answers.
#[derive(Debug, Clone, Default)]
pub struct CompletionSettings {
    pub api_key: Option<SecretString>,
    pub model: Option<String>,
    pub base_url: Option<Url>,
}

/// Settings for one adapter, used to reconfigure it at runtime.
#[derive(Debug, Clone)]
pub enum AdapterSettings {
    HomeAssistant(HassSettings),
    Mqtt(MqttSettings),
    SmartThings(SmartThingsSettings),
}

impl AdapterSettings {
    pub fn integration(&self) -> Integration {
        match self {
            Self::HomeAssistant(_) => Integration::HomeAssistant,
            Self::Mqtt(_) => Integration::Mqtt,
            Self::SmartThings(_) => Integration::SmartThings,
        }
    }
}

/// Everything the hub needs to connect to its backends.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub home_assistant: Option<HassSettings>,
    pub mqtt: Option<MqttSettings>,
    pub smartthings: Option<SmartThingsSettings>,
    pub completion: CompletionSettings,
    pub tls: TlsVerification,
    /// Per-request timeout for HTTP backends.
    pub timeout: Duration,
    /// Background refresh period; `0` disables the refresh task.
    pub refresh_interval_secs: u64,
    /// Overrides the assistant's default system prompt.
    pub system_prompt: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            home_assistant: None,
            mqtt: None,
            smartthings: None,
            completion: CompletionSettings::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 0,
            system_prompt: None,
        }
    }
}

impl HubConfig {
    /// True when no backend is configured at all (demo mode).
    pub fn is_offline(&self) -> bool {
        self.home_assistant.is_none() && self.mqtt.is_none() && self.smartthings.is_none()
    }

    /// HTTP transport shared by the REST and cloud adapters.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_tls_mode(),
            timeout: self.timeout,
            connect_timeout: Duration::from_secs(10),
        }
    }
}
