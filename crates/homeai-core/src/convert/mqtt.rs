// Broker firmware payloads ↔ Device.

use homeai_api::mqtt::{
    TasmotaState, ZigbeeCommand, ZigbeeState, tasmota_command_topic, tasmota_power_payload,
    zigbee_command_topic,
};

use super::{UNKNOWN_ROOM, ZIGBEE_BRIGHTNESS_MAX, display_name_from_id, native_from_percent, percent_from_native};
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceRoute, DeviceState, DeviceType, FirmwareFamily, Integration};

pub const TASMOTA_ID_PREFIX: &str = "tasmota_";
pub const ZIGBEE_ID_PREFIX: &str = "zigbee_";

/// A Tasmota relay seen on `tele/<id>/STATE`.
pub fn tasmota_device(native_id: &str, payload: &TasmotaState) -> Device {
    Device {
        id: DeviceId::new(format!("{TASMOTA_ID_PREFIX}{native_id}")),
        name: display_name_from_id(native_id),
        device_type: DeviceType::Switch,
        room: UNKNOWN_ROOM.to_owned(),
        integration: Integration::Mqtt,
        state: DeviceState {
            is_on: payload.is_on(),
            ..DeviceState::default()
        },
        route: DeviceRoute::Mqtt {
            topic: tasmota_command_topic(native_id),
            family: FirmwareFamily::Tasmota,
        },
    }
}

/// A Zigbee2MQTT device seen on `zigbee2mqtt/<id>`.
///
/// Category follows the fields present: brightness → light, temperature →
/// sensor, a bare state → switch, nothing recognizable → other.
pub fn zigbee_device(native_id: &str, payload: &ZigbeeState) -> Device {
    let device_type = if payload.brightness.is_some() {
        DeviceType::Light
    } else if payload.temperature.is_some() {
        DeviceType::Sensor
    } else if payload.state.as_deref().is_some_and(|s| !s.is_empty()) {
        DeviceType::Switch
    } else {
        DeviceType::Other
    };

    Device {
        id: DeviceId::new(format!("{ZIGBEE_ID_PREFIX}{native_id}")),
        name: display_name_from_id(native_id),
        device_type,
        room: UNKNOWN_ROOM.to_owned(),
        integration: Integration::Mqtt,
        state: DeviceState {
            is_on: payload.is_on(),
            brightness: payload
                .brightness
                .map(|b| percent_from_native(b, ZIGBEE_BRIGHTNESS_MAX)),
            temperature: payload.temperature,
            ..DeviceState::default()
        },
        route: DeviceRoute::Mqtt {
            topic: zigbee_command_topic(native_id),
            family: FirmwareFamily::Zigbee2Mqtt,
        },
    }
}

/// Payload to publish for a desired state, shaped by firmware family.
pub fn command_payload(family: FirmwareFamily, state: &DeviceState) -> Result<Vec<u8>, CoreError> {
    match family {
        FirmwareFamily::Tasmota => Ok(tasmota_power_payload(state.is_on).as_bytes().to_vec()),
        FirmwareFamily::Zigbee2Mqtt => {
            let command = ZigbeeCommand {
                state: tasmota_power_payload(state.is_on),
                brightness: state
                    .brightness
                    .map(|b| native_from_percent(b, ZIGBEE_BRIGHTNESS_MAX)),
            };
            serde_json::to_vec(&command)
                .map_err(|e| CoreError::Internal(format!("failed to encode command: {e}")))
        }
    }
}
