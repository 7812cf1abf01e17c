//! Shared configuration for the HomeAI CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `homeai_core::HubConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use homeai_core::{
    CompletionSettings, HassSettings, HubConfig, MqttSettings, SmartThingsSettings,
    TlsVerification,
};

/// Keyring service name all secrets are stored under.
pub const KEYRING_SERVICE: &str = "homeai";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named home profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Background refresh period in seconds; 0 disables it.
    #[serde(default)]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            refresh_interval: 0,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named set of backends.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    pub home_assistant: Option<HassProfile>,
    pub mqtt: Option<MqttProfile>,
    pub smartthings: Option<SmartThingsProfile>,
    pub completion: Option<CompletionProfile>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification (self-signed hubs).
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override refresh interval.
    pub refresh_interval: Option<u64>,

    /// Replace the assistant's system prompt.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HassProfile {
    /// Hub base URL (e.g., "http://homeassistant.local:8123").
    pub url: String,

    /// Long-lived access token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MqttProfile {
    /// Broker URL (e.g., "tcp://192.168.1.20:1883").
    pub broker_url: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    pub password_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SmartThingsProfile {
    /// Personal access token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    pub token_env: Option<String>,

    /// API root override.
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CompletionProfile {
    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    pub api_key_env: Option<String>,

    pub model: Option<String>,

    pub base_url: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "homeai", "homeai").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("homeai");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `HOMEAI_DEFAULTS__OUTPUT=json` style variables override file values.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HOMEAI_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_account(profile_name: &str, secret: &str) -> String {
    format!("{profile_name}/{secret}")
}

/// Resolve a secret: named env var → system keyring → plaintext.
///
/// `None` when no source has it; the backend is then left unconfigured.
pub fn resolve_secret(
    env_name: Option<&str>,
    plaintext: Option<&str>,
    profile_name: &str,
    secret: &str,
) -> Option<SecretString> {
    // 1. Env var
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, secret)) {
        if let Ok(val) = entry.get_password() {
            return Some(SecretString::from(val));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|val| SecretString::from(val.to_owned()))
}

/// Store a secret in the system keyring.
pub fn store_secret(profile_name: &str, secret: &str, value: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, secret))?;
    entry.set_password(value)?;
    Ok(())
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

fn parse_optional_url(field: &str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
    raw.map(|raw| parse_url(field, raw)).transpose()
}

/// Build a `HubConfig` from a profile.
///
/// Backends whose secret cannot be resolved are left unconfigured rather
/// than failing the whole profile.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    let home_assistant = match &profile.home_assistant {
        Some(hass) => {
            let url = parse_url("home_assistant.url", &hass.url)?;
            resolve_secret(hass.token_env.as_deref(), hass.token.as_deref(), profile_name, "hass-token")
                .map(|token| HassSettings { url, token })
        }
        None => None,
    };

    let mqtt = match &profile.mqtt {
        Some(mqtt) => {
            if !mqtt.broker_url.starts_with("tcp://") && !mqtt.broker_url.starts_with("mqtt://") {
                return Err(ConfigError::Validation {
                    field: "mqtt.broker_url".into(),
                    reason: format!("expected tcp://host:port, got '{}'", mqtt.broker_url),
                });
            }
            Some(MqttSettings {
                broker_url: mqtt.broker_url.clone(),
                username: mqtt.username.clone(),
                password: resolve_secret(
                    mqtt.password_env.as_deref(),
                    mqtt.password.as_deref(),
                    profile_name,
                    "mqtt-password",
                ),
            })
        }
        None => None,
    };

    let smartthings = match &profile.smartthings {
        Some(st) => {
            let base_url = parse_optional_url("smartthings.base_url", st.base_url.as_deref())?;
            resolve_secret(st.token_env.as_deref(), st.token.as_deref(), profile_name, "smartthings-token")
                .map(|token| SmartThingsSettings { token, base_url })
        }
        None => None,
    };

    let completion = match &profile.completion {
        Some(c) => CompletionSettings {
            api_key: resolve_secret(c.api_key_env.as_deref(), c.api_key.as_deref(), profile_name, "openai-api-key"),
            model: c.model.clone(),
            base_url: parse_optional_url("completion.base_url", c.base_url.as_deref())?,
        },
        None => CompletionSettings::default(),
    };

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(HubConfig {
        home_assistant,
        mqtt,
        smartthings,
        completion,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        refresh_interval_secs: profile.refresh_interval.unwrap_or(defaults.refresh_interval),
        system_prompt: profile.system_prompt.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"
timeout = 12

[profiles.home]
refresh_interval = 15

[profiles.home.home_assistant]
url = "http://homeassistant.local:8123"
token = "plain-token"

[profiles.home.mqtt]
broker_url = "tcp://192.168.1.20:1883"
username = "homeai"

[profiles.home.smartthings]
token_env = "SMARTTHINGS_TOKEN_UNSET_IN_TESTS"
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.color, "auto");
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(profile.refresh_interval, Some(15));
        assert!(config.profile(Some("cabin")).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn profile_translates_to_hub_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();
        let (name, profile) = config.profile(None).unwrap();
        let hub = profile_to_hub_config(profile, name, &config.defaults).unwrap();

        let hass = hub.home_assistant.unwrap();
        assert_eq!(hass.url.as_str(), "http://homeassistant.local:8123/");
        assert_eq!(hass.token.expose_secret(), "plain-token");
        let mqtt = hub.mqtt.unwrap();
        assert_eq!(mqtt.username.as_deref(), Some("homeai"));
        assert!(hub.smartthings.is_none());
        assert_eq!(hub.timeout, Duration::from_secs(12));
        assert_eq!(hub.refresh_interval_secs, 15);
        assert_eq!(hub.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn rejects_bad_urls() {
        let profile = Profile {
            mqtt: Some(MqttProfile {
                broker_url: "http://broker".into(),
                ..MqttProfile::default()
            }),
            ..Profile::default()
        };
        let err = profile_to_hub_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "mqtt.broker_url"));

        let profile = Profile {
            home_assistant: Some(HassProfile {
                url: "not a url".into(),
                token: Some("t".into()),
                token_env: None,
            }),
            ..Profile::default()
        };
        assert!(profile_to_hub_config(&profile, "x", &Defaults::default()).is_err());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                insecure: Some(true),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].insecure, Some(true));
    }
}
