// SmartThings cloud API client
//
// Personal-access-token client for the v1 REST surface. State is spread
// across capability status endpoints, so callers make several round trips
// per device; this module only provides the individual calls.

mod models;

pub use models::{CapabilityRef, Component, DeviceCommand, DeviceEntry, Location, Room};

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.smartthings.com/v1";

/// Paged list envelope: `{ "items": [...] }`.
#[derive(Debug, Deserialize)]
struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Raw HTTP client for the SmartThings cloud API.
pub struct SmartThingsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SmartThingsClient {
    /// Create a client against the production API.
    pub fn new(token: &secrecy::SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        Self::with_base_url(base_url, token, transport)
    }

    /// Create a client against a custom API root (proxies, tests).
    pub fn with_base_url(
        base_url: Url,
        token: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(transport::bearer_headers(token)?)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        transport::parse_json(resp).await
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /locations`. Also serves as the token check.
    pub async fn list_locations(&self) -> Result<Vec<Location>, Error> {
        let page: ItemsResponse<Location> = self.get("locations").await?;
        Ok(page.items)
    }

    /// `GET /devices`. Entries that fail to decode are skipped.
    pub async fn list_devices(&self) -> Result<Vec<DeviceEntry>, Error> {
        let page: ItemsResponse<Value> = self.get("devices").await?;
        let devices = page
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<DeviceEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping malformed device entry");
                    None
                }
            })
            .collect();
        Ok(devices)
    }

    /// Status of one capability on the `main` component.
    ///
    /// `GET /devices/{id}/components/main/capabilities/{capability}/status`,
    /// returned raw (e.g. `{"switch": {"value": "on"}}`).
    pub async fn capability_status(&self, device_id: &str, capability: &str) -> Result<Value, Error> {
        self.get(&format!(
            "devices/{device_id}/components/main/capabilities/{capability}/status"
        ))
        .await
    }

    /// Full device status across all components, returned raw.
    ///
    /// `GET /devices/{id}/status`
    pub async fn device_status(&self, device_id: &str) -> Result<Value, Error> {
        self.get(&format!("devices/{device_id}/status")).await
    }

    /// `GET /rooms/{id}`
    pub async fn get_room(&self, room_id: &str) -> Result<Room, Error> {
        self.get(&format!("rooms/{room_id}")).await
    }

    /// Send a batch of commands in one request.
    ///
    /// `POST /devices/{id}/commands` with `{"commands": [...]}`.
    pub async fn execute_commands(
        &self,
        device_id: &str,
        commands: &[DeviceCommand],
    ) -> Result<(), Error> {
        let url = self.url(&format!("devices/{device_id}/commands"))?;
        debug!(device_id, count = commands.len(), "POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(&json!({ "commands": commands }))
            .send()
            .await?;
        transport::error_for_status(resp).await?;
        Ok(())
    }
}
