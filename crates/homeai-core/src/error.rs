// ── Core error types ──
//
// Domain errors from homeai-core. Consumers never see raw HTTP or broker
// failures; the `From<homeai_api::Error>` impl translates transport-layer
// errors into these variants.

use thiserror::Error;

use crate::model::Integration;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{} is not connected", .integration.label())]
    IntegrationDisconnected { integration: Integration },

    #[error("{} is not configured", .integration.label())]
    NotConfigured { integration: Integration },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device {identifier} cannot be controlled through {}", .integration.label())]
    RouteMismatch {
        identifier: String,
        integration: Integration,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that mean "the backend is unreachable" rather than "the request was bad".
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::IntegrationDisconnected { .. }
                | Self::NotConfigured { .. }
                | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<homeai_api::Error> for CoreError {
    fn from(err: homeai_api::Error) -> Self {
        match err {
            homeai_api::Error::Authentication { status } => CoreError::AuthenticationFailed {
                message: format!("token rejected (HTTP {status})"),
            },
            homeai_api::Error::InvalidToken(reason) => CoreError::Config {
                message: format!("Invalid token: {reason}"),
            },
            homeai_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        target: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            homeai_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            homeai_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            homeai_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                target: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            homeai_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                status: Some(status),
            },
            homeai_api::Error::InvalidBrokerUrl { url, reason } => CoreError::Config {
                message: format!("Invalid broker URL '{url}': {reason}"),
            },
            homeai_api::Error::MqttConnect(reason) => CoreError::ConnectionFailed {
                target: "MQTT broker".into(),
                reason,
            },
            homeai_api::Error::MqttClient(e) => CoreError::ConnectionFailed {
                target: "MQTT broker".into(),
                reason: e.to_string(),
            },
            homeai_api::Error::MqttClosed => CoreError::IntegrationDisconnected {
                integration: Integration::Mqtt,
            },
            homeai_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_not_found_message() {
        let err = CoreError::DeviceNotFound {
            identifier: "porch".into(),
        };
        assert_eq!(err.to_string(), "Device not found: porch");
        assert!(!err.is_connectivity());
    }

    #[test]
    fn api_errors_map_to_domain() {
        let err: CoreError = homeai_api::Error::Authentication { status: 401 }.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(err.is_connectivity());

        let err: CoreError = homeai_api::Error::Http {
            status: 500,
            body: String::new(),
        }
        .into();
        assert_eq!(err.to_string(), "API error: HTTP 500");

        let err: CoreError = homeai_api::Error::MqttClosed.into();
        assert_eq!(err.to_string(), "MQTT is not connected");
    }
}
