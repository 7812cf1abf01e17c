//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use homeai_core::{ActionVerb, Device, DeviceAction, HomeHub};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Integration")]
    integration: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Level")]
    level: String,
}

impl DeviceRow {
    fn new(d: &Arc<Device>, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            dtype: d.device_type.to_string(),
            room: d.room.clone(),
            integration: d.integration.label().into(),
            state: output::paint_state(d.state.summary(), color),
            level: level_column(d),
        }
    }
}

/// Brightness, blind level, or target temperature, whichever applies.
fn level_column(d: &Device) -> String {
    let state = &d.state;
    if let Some(brightness) = state.brightness {
        format!("{brightness}%")
    } else if let Some(level) = state.level {
        format!("{level}%")
    } else if let Some(target) = state.target_temperature {
        format!("{target:.1}°F")
    } else {
        String::new()
    }
}

fn detail(d: &Arc<Device>) -> String {
    let state = &d.state;
    let mut lines = vec![
        format!("ID:          {}", d.id),
        format!("Name:        {}", d.name),
        format!("Type:        {}", d.device_type),
        format!("Room:        {}", d.room),
        format!("Integration: {}", d.integration.label()),
        format!("State:       {}", state.summary()),
    ];
    if let Some(brightness) = state.brightness {
        lines.push(format!("Brightness:  {brightness}%"));
    }
    if let Some(color) = &state.color {
        lines.push(format!("Color:       {color}"));
    }
    if let Some(current) = state.temperature {
        lines.push(format!("Temperature: {current:.1}°F"));
    }
    if let Some(target) = state.target_temperature {
        lines.push(format!("Target:      {target:.1}°F"));
    }
    if let Some(level) = state.level {
        lines.push(format!("Level:       {level}%"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &HomeHub, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let action = match args.command {
        DevicesCommand::List(list) => {
            let filters = util::list_filters(&list)?;
            let devices: Vec<Arc<Device>> = hub
                .catalog()
                .iter()
                .filter(|d| filters.iter().all(|f| f.matches(d)))
                .cloned()
                .collect();
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::new(d, color),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::Get { device } => {
            let device = util::resolve_device(hub, &device)?;
            let out = output::render_single(&global.output, &device, detail, |d| d.id.to_string())?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::On { device } => simple_action(hub, &device, ActionVerb::TurnOn)?,
        DevicesCommand::Off { device } => simple_action(hub, &device, ActionVerb::TurnOff)?,
        DevicesCommand::Lock { device } => simple_action(hub, &device, ActionVerb::Lock)?,
        DevicesCommand::Unlock { device } => simple_action(hub, &device, ActionVerb::Unlock)?,
        DevicesCommand::Brightness { device, level } => {
            simple_action(hub, &device, ActionVerb::SetBrightness)?.with_brightness(level)
        }
        DevicesCommand::Temperature { device, value } => {
            simple_action(hub, &device, ActionVerb::SetTemperature)?.with_temperature(value)
        }
    };

    let message = hub.execute(&action).await;
    if let Some(reason) = message.strip_prefix("Error: ") {
        return Err(CliError::Rejected {
            message: reason.to_owned(),
        });
    }
    output::print_output(&message, global.quiet);
    Ok(())
}

fn simple_action(hub: &HomeHub, identifier: &str, verb: ActionVerb) -> Result<DeviceAction, CliError> {
    let device = util::resolve_device(hub, identifier)?;
    Ok(DeviceAction::new(device.id.clone(), device.name.clone(), verb))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeai_core::HubConfig;

    use super::*;

    #[tokio::test]
    async fn level_column_prefers_brightness() {
        let hub = HomeHub::new(HubConfig::default()).unwrap();
        let light = hub.device("living_room_light").unwrap();
        assert_eq!(level_column(&light), "80%");
        let thermostat = hub.device("thermostat").unwrap();
        assert_eq!(level_column(&thermostat), "72.0°F");
        assert!(detail(&thermostat).contains("Target:      72.0°F"));
    }
}
