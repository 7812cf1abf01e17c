//! Config subcommand handlers.

use dialoguer::{Input, MultiSelect, Select};
use serde_json::Value;

use homeai_config::{CompletionProfile, HassProfile, MqttProfile, Profile, SmartThingsProfile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretKind};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";
const SECRET_KEYS: [&str; 3] = ["token", "password", "api_key"];

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Mask plaintext secrets and drop unset fields.
fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    if SECRET_KEYS.contains(&k.as_str()) && v.is_string() {
                        (k, Value::String(REDACTED.into()))
                    } else {
                        (k, redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

/// Where the wizard puts secrets the user types in.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SecretStorage {
    Keyring,
    Plaintext,
}

/// Keep a secret per the chosen storage; returns what goes in the file.
fn keep_secret(
    storage: SecretStorage,
    profile: &str,
    kind: SecretKind,
    value: String,
) -> Result<Option<String>, CliError> {
    if value.is_empty() {
        return Ok(None);
    }
    match storage {
        SecretStorage::Keyring => {
            homeai_config::store_secret(profile, kind.account(), &value)?;
            eprintln!("   ✓ {} stored in system keyring", kind.account());
            Ok(None)
        }
        SecretStorage::Plaintext => Ok(Some(value)),
    }
}

fn read_secret(prompt: &str) -> Result<String, CliError> {
    rpassword::prompt_password(prompt).map_err(prompt_err)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let value = serde_json::to_value(&cfg)
                .map(redact)
                .map_err(|e| CliError::Render(e.to_string()))?;
            let out = output::render_single(
                &global.output,
                &value,
                |v| toml::to_string_pretty(v).unwrap_or_else(|e| format!("{e}")),
                |_| config::active_profile_name(global, &cfg),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetSecret { secret } => {
            let cfg = config::load_config_or_default();
            let profile = config::active_profile_name(global, &cfg);
            let value = read_secret(&format!("{} for profile '{profile}': ", secret.account()))?;
            if value.is_empty() {
                return Err(CliError::Validation {
                    field: secret.account().into(),
                    reason: "secret cannot be empty".into(),
                });
            }
            homeai_config::store_secret(&profile, secret.account(), &value)?;
            if !global.quiet {
                eprintln!("✓ {} stored in system keyring for profile '{profile}'", secret.account());
            }
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

#[allow(clippy::too_many_lines)]
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("HomeAI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let backends = &["Home Assistant", "MQTT broker", "SmartThings", "OpenAI assistant"];
    let chosen = MultiSelect::new()
        .with_prompt("Backends to configure (space to toggle)")
        .items(backends)
        .defaults(&[true, false, false, false])
        .interact()
        .map_err(prompt_err)?;
    if chosen.is_empty() {
        return Err(CliError::Validation {
            field: "backends".into(),
            reason: "select at least one backend".into(),
        });
    }

    let store_choices = &["Store secrets in system keyring (recommended)", "Save to config file (plaintext)"];
    let storage = match Select::new()
        .with_prompt("Where to store tokens and passwords?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => SecretStorage::Keyring,
        _ => SecretStorage::Plaintext,
    };

    let mut profile = Profile::default();

    if chosen.contains(&0) {
        let url: String = Input::new()
            .with_prompt("Home Assistant URL")
            .default("http://homeassistant.local:8123".into())
            .interact_text()
            .map_err(prompt_err)?;
        let token = read_secret("Long-lived access token: ")?;
        profile.home_assistant = Some(HassProfile {
            url,
            token: keep_secret(storage, &profile_name, SecretKind::HassToken, token)?,
            token_env: None,
        });
    }

    if chosen.contains(&1) {
        let broker_url: String = Input::new()
            .with_prompt("Broker URL")
            .default("tcp://localhost:1883".into())
            .interact_text()
            .map_err(prompt_err)?;
        let username: String = Input::new()
            .with_prompt("Username (blank for none)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_err)?;
        let password = if username.is_empty() {
            None
        } else {
            let raw = read_secret("Password: ")?;
            keep_secret(storage, &profile_name, SecretKind::MqttPassword, raw)?
        };
        profile.mqtt = Some(MqttProfile {
            broker_url,
            username: Some(username).filter(|u| !u.is_empty()),
            password,
            password_env: None,
        });
    }

    if chosen.contains(&2) {
        let token = read_secret("SmartThings personal access token: ")?;
        profile.smartthings = Some(SmartThingsProfile {
            token: keep_secret(storage, &profile_name, SecretKind::SmartthingsToken, token)?,
            ..SmartThingsProfile::default()
        });
    }

    if chosen.contains(&3) {
        let key = read_secret("OpenAI API key: ")?;
        profile.completion = Some(CompletionProfile {
            api_key: keep_secret(storage, &profile_name, SecretKind::OpenaiApiKey, key)?,
            ..CompletionProfile::default()
        });
    }

    let mut cfg = config::load_config_or_default();
    if cfg.profiles.is_empty() || cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    let written = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: homeai --profile {profile_name} status");
    Ok(())
}
