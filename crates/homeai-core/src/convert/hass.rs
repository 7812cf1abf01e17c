// Home Assistant entity ↔ Device.

use homeai_api::hass::{EntityState, ServiceData};
use serde_json::Value;

use super::{HASS_BRIGHTNESS_MAX, UNKNOWN_ROOM, clamp_percent, native_from_percent, percent_from_native};
use crate::model::{Device, DeviceId, DeviceRoute, DeviceState, DeviceType, Integration};

const DEFAULT_CURRENT_TEMPERATURE: f64 = 0.0;
const DEFAULT_TARGET_TEMPERATURE: f64 = 72.0;

/// Map an entity to a device, or `None` for domains we do not control.
pub fn entity_to_device(entity: &EntityState) -> Option<Device> {
    let native = entity.state.as_str();
    let mut state = DeviceState::default();

    let device_type = match entity.domain() {
        "light" => {
            state.is_on = native == "on";
            let raw = entity
                .attr_i64("brightness")
                .unwrap_or(i64::from(HASS_BRIGHTNESS_MAX));
            state.brightness = Some(percent_from_native(raw, HASS_BRIGHTNESS_MAX));
            state.color = rgb_hex(entity.attributes.get("rgb_color"));
            DeviceType::Light
        }
        "switch" => {
            state.is_on = native == "on";
            DeviceType::Switch
        }
        "fan" => {
            state.is_on = native == "on";
            DeviceType::Fan
        }
        "climate" => {
            state.is_on = native != "off";
            state.temperature = Some(
                entity
                    .attr_f64("current_temperature")
                    .unwrap_or(DEFAULT_CURRENT_TEMPERATURE),
            );
            state.target_temperature = Some(
                entity
                    .attr_f64("temperature")
                    .unwrap_or(DEFAULT_TARGET_TEMPERATURE),
            );
            DeviceType::Thermostat
        }
        "lock" => {
            state.is_locked = Some(native == "locked");
            DeviceType::Lock
        }
        "cover" => {
            state.is_on = native == "open";
            state.level = Some(clamp_percent(
                entity.attr_i64("current_position").unwrap_or(0),
            ));
            DeviceType::Blinds
        }
        "sensor" | "binary_sensor" => {
            state.is_on = true;
            DeviceType::Sensor
        }
        "camera" => {
            state.is_on = native == "recording";
            DeviceType::Camera
        }
        "media_player" => {
            state.is_on = matches!(native, "on" | "playing");
            DeviceType::Tv
        }
        _ => return None,
    };

    Some(Device {
        id: DeviceId::new(entity.entity_id.clone()),
        name: entity
            .attr_str("friendly_name")
            .unwrap_or(&entity.entity_id)
            .to_owned(),
        device_type,
        room: entity.attr_str("room").unwrap_or(UNKNOWN_ROOM).to_owned(),
        integration: Integration::HomeAssistant,
        state,
        route: DeviceRoute::HomeAssistant {
            entity_id: entity.entity_id.clone(),
        },
    })
}

/// `[255, 128, 0]` → `#ff8000`. A plain string is passed through.
fn rgb_hex(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(parts) if parts.len() == 3 => {
            let mut hex = String::from("#");
            for part in parts {
                let channel = u8::try_from(part.as_u64()?.min(255)).ok()?;
                hex.push_str(&format!("{channel:02x}"));
            }
            Some(hex)
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// A service invocation derived from a desired state.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: &'static str,
    pub data: ServiceData,
}

/// Translate a desired state into one service call.
///
/// Locks use `lock`/`unlock` when a lock flag is present; everything else
/// uses `turn_on`/`turn_off` from the on flag. Brightness (rescaled to
/// 0–255) and target temperature ride along on either verb when present.
pub fn service_call(entity_id: &str, state: &DeviceState) -> ServiceCall {
    let domain = entity_id
        .split_once('.')
        .map_or(entity_id, |(domain, _)| domain)
        .to_owned();

    let mut data = ServiceData {
        entity_id: entity_id.to_owned(),
        ..ServiceData::default()
    };

    let service = match (domain.as_str(), state.is_locked) {
        ("lock", Some(true)) => "lock",
        ("lock", Some(false)) => "unlock",
        _ => {
            data.brightness = state
                .brightness
                .map(|b| native_from_percent(b, HASS_BRIGHTNESS_MAX));
            data.temperature = state.target_temperature;
            if state.is_on { "turn_on" } else { "turn_off" }
        }
    };

    ServiceCall {
        domain,
        service,
        data,
    }
}
