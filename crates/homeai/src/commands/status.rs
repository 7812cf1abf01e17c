//! `status`: connectivity per integration plus the last refresh outcome.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use homeai_core::{CatalogOrigin, HomeHub, Integration, SourceOutcome};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StatusReport {
    origin: CatalogOrigin,
    devices: usize,
    refreshed_at: Option<DateTime<Utc>>,
    integrations: Vec<IntegrationStatus>,
}

#[derive(Serialize)]
struct IntegrationStatus {
    integration: Integration,
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_refresh: Option<SourceOutcome>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Integration")]
    integration: String,
    #[tabled(rename = "Connected")]
    connected: String,
    #[tabled(rename = "Last refresh")]
    last_refresh: String,
}

fn describe(outcome: Option<&SourceOutcome>) -> String {
    match outcome {
        Some(SourceOutcome::Devices(1)) => "1 device".into(),
        Some(SourceOutcome::Devices(n)) => format!("{n} devices"),
        Some(SourceOutcome::Disconnected) => "disconnected".into(),
        Some(SourceOutcome::Failed(reason)) => format!("failed: {reason}"),
        None => "-".into(),
    }
}

fn origin_label(origin: CatalogOrigin) -> &'static str {
    match origin {
        CatalogOrigin::Initial | CatalogOrigin::Demo => "demo catalog",
        CatalogOrigin::Live => "live catalog",
    }
}

pub fn handle(hub: &HomeHub, global: &GlobalOpts) -> Result<(), CliError> {
    let catalog = hub.catalog();
    let integrations = hub
        .check_connections()
        .into_iter()
        .map(|(integration, connected)| IntegrationStatus {
            integration,
            connected,
            last_refresh: catalog
                .sources()
                .iter()
                .find(|s| s.integration == integration)
                .map(|s| s.outcome.clone()),
        })
        .collect();
    let report = StatusReport {
        origin: catalog.origin(),
        devices: catalog.len(),
        refreshed_at: catalog.refreshed_at(),
        integrations,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let rows: Vec<StatusRow> = r
                .integrations
                .iter()
                .map(|i| StatusRow {
                    integration: i.integration.label().into(),
                    connected: output::paint_flag(i.connected, color),
                    last_refresh: describe(i.last_refresh.as_ref()),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            format!("{table}\n{} devices ({})", r.devices, origin_label(r.origin))
        },
        |r| {
            r.integrations
                .iter()
                .map(|i| format!("{}={}", i.integration, i.connected))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_read_naturally() {
        assert_eq!(describe(Some(&SourceOutcome::Devices(1))), "1 device");
        assert_eq!(describe(Some(&SourceOutcome::Devices(4))), "4 devices");
        assert_eq!(
            describe(Some(&SourceOutcome::Failed("HTTP 500".into()))),
            "failed: HTTP 500"
        );
        assert_eq!(describe(None), "-");
    }
}
