// Broker addressing and session options.

use std::time::Duration;

use rumqttc::MqttOptions;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

const DEFAULT_PORT: u16 = 1883;

/// Host and port of an MQTT broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

/// Parse a broker URL of the form `tcp://host:port`.
///
/// `mqtt://` is accepted as a synonym; the port defaults to 1883.
pub fn parse_broker_url(raw: &str) -> Result<BrokerAddress, Error> {
    let invalid = |reason: &str| Error::InvalidBrokerUrl {
        url: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "tcp" | "mqtt") {
        return Err(invalid("scheme must be tcp:// or mqtt://"));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;

    Ok(BrokerAddress {
        host: host.to_owned(),
        port: url.port().unwrap_or(DEFAULT_PORT),
    })
}

/// Random session id: `HomeAI_` followed by eight characters of a v4 UUID.
pub fn generate_client_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("HomeAI_{}", &uuid[..8])
}

/// Everything needed to open a broker session.
#[derive(Debug, Clone)]
pub struct BrokerOptions {
    pub address: BrokerAddress,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    pub clean_session: bool,
}

impl BrokerOptions {
    /// Options with the stock timings (keep-alive 60s, connect 10s, clean session).
    pub fn new(address: BrokerAddress) -> Self {
        Self {
            address,
            client_id: generate_client_id(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            clean_session: true,
        }
    }

    /// Attach credentials. A blank username means anonymous access.
    pub fn with_credentials(mut self, username: Option<String>, password: Option<SecretString>) -> Self {
        self.username = username.filter(|u| !u.trim().is_empty());
        self.password = password;
        self
    }

    pub(crate) fn to_mqtt_options(&self) -> MqttOptions {
        let mut opts = MqttOptions::new(
            self.client_id.clone(),
            self.address.host.clone(),
            self.address.port,
        );
        opts.set_keep_alive(self.keep_alive);
        opts.set_clean_session(self.clean_session);
        if let Some(ref username) = self.username {
            let password = self
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_owned())
                .unwrap_or_default();
            opts.set_credentials(username.clone(), password);
        }
        opts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_url_with_port() {
        let addr = parse_broker_url("tcp://192.168.1.20:1884").unwrap();
        assert_eq!(addr.host, "192.168.1.20");
        assert_eq!(addr.port, 1884);
    }

    #[test]
    fn defaults_port_when_missing() {
        let addr = parse_broker_url("mqtt://broker.local").unwrap();
        assert_eq!(addr.port, 1883);
    }

    #[test]
    fn rejects_http_scheme() {
        let err = parse_broker_url("http://broker.local:1883").unwrap_err();
        assert!(matches!(err, Error::InvalidBrokerUrl { .. }));
    }

    #[test]
    fn client_id_shape() {
        let id = generate_client_id();
        assert!(id.starts_with("HomeAI_"));
        assert_eq!(id.len(), "HomeAI_".len() + 8);
    }

    #[test]
    fn blank_username_is_anonymous() {
        let opts = BrokerOptions::new(parse_broker_url("tcp://localhost:1883").unwrap())
            .with_credentials(Some("  ".into()), None);
        assert!(opts.username.is_none());
        assert_eq!(opts.keep_alive, Duration::from_secs(60));
        assert!(opts.clean_session);
    }
}
