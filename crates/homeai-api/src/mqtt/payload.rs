// Firmware payload schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Tasmota `tele/<id>/STATE` body. Only relay power is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasmotaState {
    #[serde(rename = "POWER", default)]
    pub power: Option<String>,
    #[serde(rename = "POWER1", default)]
    pub power1: Option<String>,
}

impl TasmotaState {
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        decode(payload)
    }

    /// `POWER` (falling back to `POWER1`) equals "ON", case-insensitively.
    pub fn is_on(&self) -> bool {
        self.power
            .as_deref()
            .or(self.power1.as_deref())
            .is_some_and(|p| p.eq_ignore_ascii_case("ON"))
    }
}

/// Zigbee2MQTT device state.
///
/// Read leniently: a field with an unexpected JSON type counts as absent
/// rather than failing the whole message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZigbeeState {
    pub state: Option<String>,
    pub brightness: Option<i64>,
    pub temperature: Option<f64>,
}

impl ZigbeeState {
    /// Parse a device message. The body must be a JSON object.
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        let value: Value = decode(payload)?;
        let Value::Object(map) = value else {
            return Err(Error::Deserialization {
                message: "expected a JSON object".into(),
                body: String::from_utf8_lossy(payload).into_owned(),
            });
        };

        Ok(Self {
            state: map
                .get("state")
                .and_then(Value::as_str)
                .map(str::to_owned),
            brightness: map.get("brightness").and_then(Value::as_i64),
            temperature: map.get("temperature").and_then(Value::as_f64),
        })
    }

    /// `state` equals "ON", case-insensitively.
    pub fn is_on(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ON"))
    }
}

/// Body published to `zigbee2mqtt/<id>/set`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZigbeeCommand {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

/// Relay command published to `cmnd/<id>/POWER`.
pub fn tasmota_power_payload(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn decode<T: serde::de::DeserializeOwned>(payload: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(payload).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(payload).into_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tasmota_power_falls_back_to_power1() {
        let state = TasmotaState::parse(br#"{"Time":"2024-01-01T00:00:00","POWER1":"on"}"#).unwrap();
        assert!(state.is_on());

        let state = TasmotaState::parse(br#"{"POWER":"OFF","POWER1":"ON"}"#).unwrap();
        assert!(!state.is_on());

        let state = TasmotaState::parse(b"{}").unwrap();
        assert!(!state.is_on());
    }

    #[test]
    fn zigbee_state_is_lenient() {
        let state =
            ZigbeeState::parse(br#"{"state":"ON","brightness":"bright","temperature":21.5}"#)
                .unwrap();
        assert!(state.is_on());
        assert_eq!(state.brightness, None);
        assert_eq!(state.temperature, Some(21.5));
    }

    #[test]
    fn zigbee_state_requires_object() {
        assert!(ZigbeeState::parse(b"\"online\"").is_err());
        assert!(ZigbeeState::parse(b"not json").is_err());
    }

    #[test]
    fn zigbee_command_serializes_brightness_only_when_set() {
        let cmd = ZigbeeCommand {
            state: "ON",
            brightness: Some(127),
        };
        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"state":"ON","brightness":127}"#
        );
        let cmd = ZigbeeCommand {
            state: "OFF",
            brightness: None,
        };
        assert_eq!(serde_json::to_string(&cmd).unwrap(), r#"{"state":"OFF"}"#);
    }
}
