// homeai-api: Async protocol clients for Home Assistant, MQTT device firmware,
// SmartThings, and chat completions

pub mod completion;
pub mod error;
pub mod hass;
pub mod mqtt;
pub mod smartthings;
pub mod transport;

pub use completion::{ChatTurn, CompletionClient};
pub use error::Error;
pub use hass::HassClient;
pub use mqtt::MqttSession;
pub use smartthings::SmartThingsClient;
