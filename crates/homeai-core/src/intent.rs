// ── Keyword intent parsing ──
//
// Plain substring matching over a fixed phrase table. Anything this does
// not recognize is left to the completion backend.

use std::sync::Arc;

use crate::model::{ActionVerb, Device, DeviceAction, DeviceType};
use crate::router::{DEFAULT_BRIGHTNESS, DEFAULT_TEMPERATURE};

/// Rooms recognized by the whole-room light commands.
pub const KNOWN_ROOMS: [&str; 6] = [
    "living room",
    "bedroom",
    "kitchen",
    "bathroom",
    "office",
    "garage",
];

/// Turns a chat message into zero or more device actions.
pub trait IntentParser: Send + Sync {
    fn parse(&self, message: &str, devices: &[Arc<Device>]) -> Vec<DeviceAction>;
}

/// Phrase-table parser.
///
/// A device is addressed when the message contains its name
/// (case-insensitive). If no name matches, "turn on"/"lights on" and
/// "turn off"/"lights off" next to a known room act on that room's lights.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentParser;

impl IntentParser for KeywordIntentParser {
    fn parse(&self, message: &str, devices: &[Arc<Device>]) -> Vec<DeviceAction> {
        let lower = message.to_lowercase();

        let named: Vec<&Arc<Device>> = devices
            .iter()
            .filter(|device| !device.name.is_empty() && lower.contains(&device.name.to_lowercase()))
            .collect();

        if named.is_empty() {
            return room_actions(&lower, devices);
        }

        named
            .into_iter()
            .filter_map(|device| device_action(&lower, device))
            .collect()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn device_action(lower: &str, device: &Device) -> Option<DeviceAction> {
    let action = |verb| DeviceAction::new(device.id.clone(), device.name.clone(), verb);

    if contains_any(lower, &["turn on", "switch on"]) {
        Some(action(ActionVerb::TurnOn))
    } else if contains_any(lower, &["turn off", "switch off"]) {
        Some(action(ActionVerb::TurnOff))
    } else if lower.contains("brightness") {
        let level = first_integer(lower).unwrap_or(DEFAULT_BRIGHTNESS);
        Some(action(ActionVerb::SetBrightness).with_brightness(level))
    } else if contains_any(lower, &["temperature", "degrees"]) {
        let target = first_number(lower).unwrap_or(DEFAULT_TEMPERATURE);
        Some(action(ActionVerb::SetTemperature).with_temperature(target))
    } else if lower.contains("unlock") {
        Some(action(ActionVerb::Unlock))
    } else if lower.contains("lock") {
        Some(action(ActionVerb::Lock))
    } else {
        None
    }
}

fn room_actions(lower: &str, devices: &[Arc<Device>]) -> Vec<DeviceAction> {
    let Some(room) = KNOWN_ROOMS.iter().find(|room| lower.contains(**room)) else {
        return Vec::new();
    };

    let verb = if contains_any(lower, &["turn on", "lights on"]) {
        ActionVerb::TurnOn
    } else if contains_any(lower, &["turn off", "lights off"]) {
        ActionVerb::TurnOff
    } else {
        return Vec::new();
    };

    devices
        .iter()
        .filter(|d| d.device_type == DeviceType::Light && d.room.eq_ignore_ascii_case(room))
        .map(|d| DeviceAction::new(d.id.clone(), d.name.clone(), verb.clone()))
        .collect()
}

/// First run of ASCII digits, as an integer.
fn first_integer(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// First decimal number (`68`, `68.5`).
fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let mut seen_dot = false;
    let number: String = text[start..]
        .chars()
        .take_while(|c| {
            if c.is_ascii_digit() {
                true
            } else if *c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                false
            }
        })
        .collect();
    number.trim_end_matches('.').parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::demo;

    fn devices() -> Vec<Arc<Device>> {
        demo::devices().into_iter().map(Arc::new).collect()
    }

    fn parse(message: &str) -> Vec<DeviceAction> {
        KeywordIntentParser.parse(message, &devices())
    }

    #[test]
    fn turns_on_named_device() {
        let actions = parse("Please turn on the Kitchen Light");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].device_id.as_str(), "kitchen_light");
        assert_eq!(actions[0].verb, ActionVerb::TurnOn);
    }

    #[test]
    fn brightness_reads_first_integer() {
        let actions = parse("set main light brightness to 30%");
        assert_eq!(actions[0].verb, ActionVerb::SetBrightness);
        assert_eq!(actions[0].parameters.brightness, Some(30));

        let actions = parse("main light brightness up");
        assert_eq!(actions[0].parameters.brightness, Some(50));
    }

    #[test]
    fn temperature_reads_decimal() {
        let actions = parse("set the main thermostat temperature to 68.5");
        assert_eq!(actions[0].verb, ActionVerb::SetTemperature);
        assert_eq!(actions[0].parameters.temperature, Some(68.5));

        let actions = parse("main thermostat degrees please");
        assert_eq!(actions[0].parameters.temperature, Some(72.0));
    }

    #[test]
    fn unlock_wins_over_lock() {
        let actions = parse("unlock the front door");
        assert_eq!(actions[0].verb, ActionVerb::Unlock);
        let actions = parse("lock the front door");
        assert_eq!(actions[0].verb, ActionVerb::Lock);
    }

    #[test]
    fn room_fallback_targets_lights() {
        let actions = parse("living room lights off");
        let ids: Vec<_> = actions.iter().map(|a| a.device_id.as_str()).collect();
        assert_eq!(ids, ["living_room_light", "living_room_lamp"]);
        assert!(actions.iter().all(|a| a.verb == ActionVerb::TurnOff));
    }

    #[test]
    fn room_fallback_skipped_when_a_name_matches() {
        let actions = parse("turn on the bedside lamp in the bedroom");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].device_id.as_str(), "bedroom_lamp");
    }

    #[test]
    fn unrecognized_message_yields_nothing() {
        assert!(parse("what's the weather like?").is_empty());
        assert!(parse("kitchen light, how are you").is_empty());
    }

    #[test]
    fn number_scanning() {
        assert_eq!(first_integer("abc 12x 34"), Some(12));
        assert_eq!(first_integer("none"), None);
        assert_eq!(first_number("to 70. now"), Some(70.0));
        assert_eq!(first_number("1.2.3"), Some(1.2));
    }
}
