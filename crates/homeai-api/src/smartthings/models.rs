use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl DeviceEntry {
    /// Label, else name, else "Unknown".
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Unknown")
    }

    /// Capability ids across all components, in declaration order.
    pub fn capability_ids(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .flat_map(|c| c.capabilities.iter().map(|cap| cap.id.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub capabilities: Vec<CapabilityRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapabilityRef {
    pub id: String,
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of a `POST /devices/{id}/commands` batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCommand {
    pub component: String,
    pub capability: String,
    pub command: String,
    pub arguments: Vec<Value>,
}

impl DeviceCommand {
    /// A command against the `main` component.
    pub fn main(capability: &str, command: &str, arguments: Vec<Value>) -> Self {
        Self {
            component: "main".into(),
            capability: capability.into(),
            command: command.into(),
            arguments,
        }
    }
}
