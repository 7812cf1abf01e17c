//! `watch`: stream catalog snapshots until interrupted.

use std::sync::Arc;

use futures_util::StreamExt;

use homeai_core::{Catalog, HomeHub};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// One line per device, prefixed with the snapshot time.
fn summarize(catalog: &Catalog) -> String {
    let stamp = catalog
        .refreshed_at()
        .map_or_else(|| "initial".into(), |at| at.format("%H:%M:%S").to_string());
    catalog
        .iter()
        .map(|d| format!("[{stamp}] {:<24} {:<16} {}", d.id, d.room, d.state.summary()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(catalog: &Arc<Catalog>, global: &GlobalOpts) -> Result<String, CliError> {
    // Structured formats emit one document per snapshot
    let format = match global.output {
        OutputFormat::Json => &OutputFormat::JsonCompact,
        ref other => other,
    };
    let devices = catalog.to_vec();
    output::render_single(format, &devices, |_| summarize(catalog), |_| summarize(catalog))
}

pub async fn handle(hub: &HomeHub, global: &GlobalOpts) -> Result<(), CliError> {
    if hub.config().refresh_interval_secs == 0 && !global.quiet {
        eprintln!("note: no refresh interval configured; only local changes will appear");
    }

    let mut snapshots = hub.observe().into_stream();
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            next = snapshots.next() => {
                let Some(catalog) = next else { break };
                output::print_output(&render(&catalog, global)?, global.quiet);
            }
        }
    }
    Ok(())
}
