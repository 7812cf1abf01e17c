//! Command dispatch: bridges CLI args -> hub operations -> output formatting.

pub mod chat;
pub mod config_cmd;
pub mod devices;
pub mod status;
pub mod util;
pub mod watch;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use homeai_core::HomeHub;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Build the hub for this invocation and connect its configured backends.
///
/// Offline configs (`--demo`, or no profile) skip connecting entirely and
/// keep the demonstration catalog. Backend failures are reported but never
/// fatal: the catalog simply lacks that backend's devices.
pub async fn connect_hub(global: &GlobalOpts) -> Result<HomeHub, CliError> {
    let (profile, hub_config) = config::resolve_hub_config(global)?;
    let hub = HomeHub::new(hub_config)?;
    if hub.config().is_offline() {
        tracing::info!(profile = %profile, "offline, using demo catalog");
        return Ok(hub);
    }

    let spinner = spinner(global, "Connecting to backends...");
    let results = hub.connect().await;
    spinner.finish_and_clear();

    for (integration, result) in &results {
        if let Err(err) = result {
            tracing::warn!(%integration, error = %err, "backend unavailable");
            if !global.quiet {
                eprintln!("warning: {}: {err}", integration.label());
            }
        }
    }
    Ok(hub)
}

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &HomeHub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(hub, args, global).await,
        Command::Status => status::handle(hub, global),
        Command::Chat(args) => chat::handle(hub, &args, global).await,
        Command::Watch => watch::handle(hub, global).await,
        // Config, Test, and Completions are handled before dispatch
        Command::Config(_) | Command::Test(_) | Command::Completions(_) => unreachable!(),
    }
}

pub fn spinner(global: &GlobalOpts, message: &'static str) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
