// Home Assistant REST API client
//
// Stateless bearer-token client over the hub's `/api` surface. Endpoint
// coverage is intentionally narrow: ping, state listing, and service calls.

mod models;

pub use models::{EntityState, ServiceData};

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Raw HTTP client for a Home Assistant instance.
pub struct HassClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HassClient {
    /// Create a client for the hub at `base_url` (e.g. `http://homeassistant.local:8123`).
    pub fn new(
        base_url: Url,
        token: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(transport::bearer_headers(token)?)?;
        Ok(Self { http, base_url })
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// Probe the API root. Succeeds when the hub accepts the token.
    ///
    /// `GET /api/`
    pub async fn ping(&self) -> Result<(), Error> {
        let url = self.api_url("")?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        transport::error_for_status(resp).await?;
        Ok(())
    }

    /// List every entity state known to the hub.
    ///
    /// `GET /api/states`. Elements that fail to decode are skipped so one
    /// odd integration cannot hide the rest of the house.
    pub async fn list_states(&self) -> Result<Vec<EntityState>, Error> {
        let url = self.api_url("states")?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let raw: Vec<serde_json::Value> = transport::parse_json(resp).await?;

        let states = raw
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<EntityState>(item) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(error = %e, "skipping malformed entity state");
                    None
                }
            })
            .collect();
        Ok(states)
    }

    /// Invoke a service on a domain.
    ///
    /// `POST /api/services/{domain}/{service}`. The response body (the list
    /// of changed states) is not inspected.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &impl Serialize,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("services/{domain}/{service}"))?;
        debug!(domain, service, "POST {}", url);
        let resp = self.http.post(url).json(data).send().await?;
        transport::error_for_status(resp).await?;
        Ok(())
    }
}
