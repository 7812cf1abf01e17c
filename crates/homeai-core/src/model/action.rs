// ── Device actions ──
//
// A normalized control request, produced by the intent parser or the CLI
// and consumed by the command router.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::device::DeviceId;

/// What to do to a device.
///
/// Unrecognized verbs are preserved so the router can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionVerb {
    TurnOn,
    TurnOff,
    SetBrightness,
    SetTemperature,
    Lock,
    Unlock,
    Unknown(String),
}

impl ActionVerb {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetBrightness => "set_brightness",
            Self::SetTemperature => "set_temperature",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Unknown(verb) => verb,
        }
    }
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ActionVerb {
    fn from(s: &str) -> Self {
        match s {
            "turn_on" => Self::TurnOn,
            "turn_off" => Self::TurnOff,
            "set_brightness" => Self::SetBrightness,
            "set_temperature" => Self::SetTemperature,
            "lock" => Self::Lock,
            "unlock" => Self::Unlock,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for ActionVerb {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl FromStr for ActionVerb {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<ActionVerb> for String {
    fn from(verb: ActionVerb) -> Self {
        verb.as_str().to_owned()
    }
}

/// Verb parameters. Each verb reads only its own key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A command request against one device. Built per command, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAction {
    pub device_id: DeviceId,
    /// Display name echoed into the confirmation message.
    pub device_name: String,
    pub verb: ActionVerb,
    #[serde(default)]
    pub parameters: ActionParams,
}

impl DeviceAction {
    pub fn new(device_id: impl Into<DeviceId>, device_name: impl Into<String>, verb: ActionVerb) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            verb,
            parameters: ActionParams::default(),
        }
    }

    pub fn with_brightness(mut self, brightness: i64) -> Self {
        self.parameters.brightness = Some(brightness);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.parameters.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_and_preserve_unknown() {
        assert_eq!("set_brightness".parse::<ActionVerb>().unwrap(), ActionVerb::SetBrightness);
        assert_eq!(
            "dance".parse::<ActionVerb>().unwrap(),
            ActionVerb::Unknown("dance".into())
        );
        assert_eq!(ActionVerb::Unknown("dance".into()).to_string(), "dance");
    }

    #[test]
    fn action_serializes_verb_as_string() {
        let action = DeviceAction::new("light.kitchen", "Kitchen", ActionVerb::TurnOn);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["verb"], "turn_on");
        assert_eq!(json["device_id"], "light.kitchen");

        let back: DeviceAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
