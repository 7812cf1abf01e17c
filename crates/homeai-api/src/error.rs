use thiserror::Error;

/// Top-level error type for the `homeai-api` crate.
///
/// Covers every failure mode across all protocol surfaces: HTTP transport,
/// the Home Assistant REST API, the SmartThings cloud API, the chat
/// completion service, and MQTT broker sessions. `homeai-core` maps these
/// into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected by the remote service (HTTP 401 / 403).
    #[error("Authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    /// Token contains characters that cannot be sent in a header.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request or connect handshake timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP APIs ───────────────────────────────────────────────────
    /// Non-success HTTP status with the response body for debugging.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── MQTT ────────────────────────────────────────────────────────
    /// Broker URL could not be parsed.
    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    /// Initial broker connection failed.
    #[error("MQTT connection failed: {0}")]
    MqttConnect(String),

    /// Request could not be queued on the MQTT client.
    #[error("MQTT client error: {0}")]
    MqttClient(#[from] rumqttc::ClientError),

    /// The session event loop is no longer running.
    #[error("MQTT session closed")]
    MqttClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::MqttConnect(_) | Self::MqttClosed => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status } | Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_classification() {
        let err = Error::Http {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));

        let err = Error::Http {
            status: 404,
            body: "missing".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn broker_errors_are_transient() {
        assert!(Error::MqttClosed.is_transient());
        assert!(Error::MqttConnect("refused".into()).is_transient());
        assert_eq!(Error::MqttClosed.status(), None);
    }
}
