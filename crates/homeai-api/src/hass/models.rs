use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One element of `GET /api/states`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: Option<String>,
}

impl EntityState {
    /// Domain prefix of the entity id (`light` for `light.kitchen`).
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        let value = self.attributes.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.round() as i64))
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }
}

/// Body for `POST /api/services/{domain}/{service}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceData {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}
