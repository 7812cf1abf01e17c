// SmartThings capabilities ↔ Device.
//
// Category comes from the last recognized capability in declaration
// order. Devices advertising overlapping capabilities (switch + switchLevel)
// therefore classify by whichever appears later.

use homeai_api::smartthings::DeviceCommand;
use serde_json::{Value, json};

use super::clamp_percent;
use crate::model::{DeviceState, DeviceType};

const DEFAULT_LEVEL: i64 = 100;
const DEFAULT_TEMPERATURE: f64 = 72.0;

/// Where the state for a capability is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// `…/capabilities/{cap}/status`
    Capability,
    /// `/devices/{id}/status` (all components)
    Device,
}

/// Category implied by a capability, if any.
pub fn capability_type(capability: &str) -> Option<DeviceType> {
    match capability {
        "switch" => Some(DeviceType::Switch),
        "switchLevel" | "colorControl" => Some(DeviceType::Light),
        "thermostat" | "thermostatCoolingSetpoint" | "thermostatHeatingSetpoint" => {
            Some(DeviceType::Thermostat)
        }
        "lock" => Some(DeviceType::Lock),
        "motionSensor" | "contactSensor" | "temperatureMeasurement" => Some(DeviceType::Sensor),
        "mediaPlayback" => Some(DeviceType::Tv),
        _ => None,
    }
}

/// Category for a capability list: last match wins, default `Other`.
pub fn classify<'a>(capabilities: impl IntoIterator<Item = &'a str>) -> DeviceType {
    capabilities
        .into_iter()
        .filter_map(capability_type)
        .last()
        .unwrap_or(DeviceType::Other)
}

/// Which status read populates a capability's state, if any.
pub fn status_source(capability: &str) -> Option<StatusSource> {
    match capability {
        "switch" | "switchLevel" | "lock" => Some(StatusSource::Capability),
        "thermostat" | "thermostatCoolingSetpoint" | "thermostatHeatingSetpoint" => {
            Some(StatusSource::Device)
        }
        _ => None,
    }
}

/// Apply a capability status body. `None` (failed read) applies defaults.
pub fn apply_capability_status(capability: &str, status: Option<&Value>, state: &mut DeviceState) {
    let value = status.map(|s| &s[capability]["value"]);
    match capability {
        "switch" => {
            state.is_on = value.and_then(Value::as_str) == Some("on");
        }
        "switchLevel" => {
            let level = status
                .and_then(|s| s["level"]["value"].as_f64())
                .map_or(DEFAULT_LEVEL, round_to_i64);
            state.brightness = Some(clamp_percent(level));
        }
        "lock" => {
            state.is_locked = Some(value.and_then(Value::as_str) == Some("locked"));
        }
        _ => {}
    }
}

/// Apply a full device status body to a thermostat. `None` applies defaults.
pub fn apply_thermostat_status(status: Option<&Value>, state: &mut DeviceState) {
    let main = status.map(|s| &s["components"]["main"]);
    state.temperature = Some(
        main.and_then(|m| m["temperatureMeasurement"]["temperature"]["value"].as_f64())
            .unwrap_or(DEFAULT_TEMPERATURE),
    );
    state.target_temperature = Some(
        main.and_then(|m| m["thermostatCoolingSetpoint"]["coolingSetpoint"]["value"].as_f64())
            .unwrap_or(DEFAULT_TEMPERATURE),
    );
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

/// Commands realizing a desired state, sent as one batch.
///
/// Always switches on/off; brightness, cooling setpoint, and lock commands
/// are appended only for fields present in `state`.
pub fn state_commands(state: &DeviceState) -> Vec<DeviceCommand> {
    let mut commands = vec![DeviceCommand::main(
        "switch",
        if state.is_on { "on" } else { "off" },
        Vec::new(),
    )];

    if let Some(level) = state.brightness {
        commands.push(DeviceCommand::main("switchLevel", "setLevel", vec![json!(level)]));
    }
    if let Some(target) = state.target_temperature {
        commands.push(DeviceCommand::main(
            "thermostatCoolingSetpoint",
            "setCoolingSetpoint",
            vec![json!(target)],
        ));
    }
    if let Some(locked) = state.is_locked {
        commands.push(DeviceCommand::main(
            "lock",
            if locked { "lock" } else { "unlock" },
            Vec::new(),
        ));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_matching_capability_wins() {
        assert_eq!(classify(["switch", "switchLevel"]), DeviceType::Light);
        assert_eq!(classify(["switchLevel", "switch"]), DeviceType::Switch);
        assert_eq!(classify(["switch", "refresh", "healthCheck"]), DeviceType::Switch);
        assert_eq!(classify(["refresh"]), DeviceType::Other);
        assert_eq!(classify(["lock", "contactSensor"]), DeviceType::Sensor);
    }

    #[test]
    fn status_sources() {
        assert_eq!(status_source("switch"), Some(StatusSource::Capability));
        assert_eq!(status_source("thermostatHeatingSetpoint"), Some(StatusSource::Device));
        assert_eq!(status_source("colorControl"), None);
    }

    #[test]
    fn capability_status_parsing() {
        let mut state = DeviceState::default();
        apply_capability_status("switch", Some(&json!({ "switch": { "value": "on" } })), &mut state);
        assert!(state.is_on);

        apply_capability_status("switchLevel", Some(&json!({ "level": { "value": 42, "unit": "%" } })), &mut state);
        assert_eq!(state.brightness, Some(42));

        apply_capability_status("lock", Some(&json!({ "lock": { "value": "unlocked" } })), &mut state);
        assert_eq!(state.is_locked, Some(false));
    }

    #[test]
    fn failed_reads_apply_defaults() {
        let mut state = DeviceState::default();
        apply_capability_status("switchLevel", None, &mut state);
        assert_eq!(state.brightness, Some(100));
        apply_capability_status("switch", None, &mut state);
        assert!(!state.is_on);

        apply_thermostat_status(None, &mut state);
        assert_eq!(state.temperature, Some(72.0));
        assert_eq!(state.target_temperature, Some(72.0));
    }

    #[test]
    fn thermostat_status_parsing() {
        let status = json!({
            "components": { "main": {
                "temperatureMeasurement": { "temperature": { "value": 68.5, "unit": "F" } },
                "thermostatCoolingSetpoint": { "coolingSetpoint": { "value": 74, "unit": "F" } }
            }}
        });
        let mut state = DeviceState::default();
        apply_thermostat_status(Some(&status), &mut state);
        assert_eq!(state.temperature, Some(68.5));
        assert_eq!(state.target_temperature, Some(74.0));
    }

    #[test]
    fn commands_only_for_present_fields() {
        let commands = state_commands(&DeviceState::on());
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "on");

        let state = DeviceState {
            is_on: false,
            brightness: Some(30),
            target_temperature: Some(70.0),
            is_locked: Some(true),
            ..DeviceState::default()
        };
        let names: Vec<_> = state_commands(&state)
            .into_iter()
            .map(|c| format!("{}.{}", c.capability, c.command))
            .collect();
        assert_eq!(
            names,
            [
                "switch.off",
                "switchLevel.setLevel",
                "thermostatCoolingSetpoint.setCoolingSetpoint",
                "lock.lock"
            ]
        );
    }
}
