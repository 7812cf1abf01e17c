//! CLI configuration -- thin wrapper around `homeai_config` shared types.
//!
//! Adds profile selection and `GlobalOpts` overrides on top of the shared
//! loader.

use std::time::Duration;

use homeai_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use homeai_config::{Config, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the `HubConfig` for this invocation.
///
/// `--demo` yields an offline config. An implicit default profile that does
/// not exist does too, so a fresh install serves the demonstration catalog;
/// a profile named with `--profile` must exist.
pub fn resolve_hub_config(global: &GlobalOpts) -> Result<(String, HubConfig), CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);
    if global.demo {
        return Ok((name, offline_config(global, &cfg)));
    }

    let Some(profile) = cfg.profiles.get(&name) else {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        tracing::debug!(profile = %name, "no profile configured, serving demo catalog");
        return Ok((name, offline_config(global, &cfg)));
    };

    let mut hub_config = homeai_config::profile_to_hub_config(profile, &name, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        hub_config.timeout = Duration::from_secs(secs);
    }
    Ok((name, hub_config))
}

fn offline_config(global: &GlobalOpts, cfg: &Config) -> HubConfig {
    HubConfig {
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
        ..HubConfig::default()
    }
}
