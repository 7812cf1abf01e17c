// Topic conventions for the firmware families we understand.

/// Application namespace for HomeAI's own messages.
pub const HOMEAI_FILTER: &str = "homeai/#";
/// Tasmota periodic telemetry carrying relay state.
pub const TASMOTA_STATE_FILTER: &str = "tele/+/STATE";
/// Every Zigbee2MQTT device and bridge message.
pub const ZIGBEE_FILTER: &str = "zigbee2mqtt/#";

/// The fixed subscription set opened on every session.
pub const DEFAULT_FILTERS: [&str; 3] = [HOMEAI_FILTER, TASMOTA_STATE_FILTER, ZIGBEE_FILTER];

const TASMOTA_TELE_PREFIX: &str = "tele/";
const TASMOTA_STATE_SUFFIX: &str = "/STATE";
const ZIGBEE_PREFIX: &str = "zigbee2mqtt/";

/// What an inbound topic carries, by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind<'a> {
    /// `tele/<device>/STATE`
    TasmotaState { device: &'a str },
    /// `zigbee2mqtt/<device>` with no deeper nesting.
    Zigbee { device: &'a str },
    Other,
}

/// Classify a topic into one of the known firmware families.
pub fn classify_topic(topic: &str) -> TopicKind<'_> {
    if topic.starts_with(TASMOTA_TELE_PREFIX) && topic.ends_with(TASMOTA_STATE_SUFFIX) {
        if let Some(device) = topic.split('/').nth(1).filter(|d| !d.is_empty()) {
            return TopicKind::TasmotaState { device };
        }
    }

    if let Some(device) = topic.strip_prefix(ZIGBEE_PREFIX) {
        if !device.is_empty() && !device.contains('/') {
            return TopicKind::Zigbee { device };
        }
    }

    TopicKind::Other
}

/// Command topic for a Tasmota relay.
pub fn tasmota_command_topic(device: &str) -> String {
    format!("cmnd/{device}/POWER")
}

/// Command topic for a Zigbee2MQTT device.
pub fn zigbee_command_topic(device: &str) -> String {
    format!("{ZIGBEE_PREFIX}{device}/set")
}
