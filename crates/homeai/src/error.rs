//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use homeai_config::ConfigError;
use homeai_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {target}")]
    #[diagnostic(
        code(homeai::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Try: homeai status -v"
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("{integration} connectivity test failed")]
    #[diagnostic(
        code(homeai::test_failed),
        help("Re-run with -vv to see the underlying error.")
    )]
    TestFailed { integration: String },

    #[error("{integration} is not configured in profile '{profile}'")]
    #[diagnostic(
        code(homeai::not_configured),
        help(
            "Add it with: homeai config init\n\
             or store its secret with: homeai config set-secret"
        )
    )]
    NotConfigured { integration: String, profile: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(homeai::auth_failed),
        help(
            "Verify the token for this backend.\n\
             Run: homeai config set-secret <secret> --profile <profile>"
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(homeai::not_found),
        help("Run: homeai devices list to see available devices")
    )]
    DeviceNotFound { identifier: String },

    #[error("Command rejected: {message}")]
    #[diagnostic(code(homeai::rejected))]
    Rejected { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(homeai::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(code(homeai::unsupported), help("This operation requires {required}."))]
    Unsupported { operation: String, required: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(homeai::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(homeai::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: homeai config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(homeai::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(homeai::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("Internal error: {0}")]
    #[diagnostic(code(homeai::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(homeai::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TestFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NotConfigured { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => Self::ConnectionFailed { target, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::IntegrationDisconnected { integration } => Self::ConnectionFailed {
                target: integration.label().into(),
                reason: "not connected".into(),
            },

            CoreError::NotConfigured { integration } => Self::NotConfigured {
                integration: integration.label().into(),
                profile: "current".into(),
            },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::DeviceNotFound { identifier } => Self::DeviceNotFound { identifier },

            err @ CoreError::RouteMismatch { .. } => Self::Rejected {
                message: err.to_string(),
            },

            CoreError::Unsupported {
                operation,
                required,
            } => Self::Unsupported {
                operation,
                required,
            },

            CoreError::Api { message, status } => Self::ApiError { message, status },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use homeai_core::Integration;

    use super::*;

    #[test]
    fn core_errors_pick_exit_codes() {
        let not_found: CliError = CoreError::DeviceNotFound {
            identifier: "porch".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let disconnected: CliError = CoreError::IntegrationDisconnected {
            integration: Integration::Mqtt,
        }
        .into();
        assert_eq!(disconnected.exit_code(), exit_code::CONNECTION);
        assert_eq!(disconnected.to_string(), "Could not connect to MQTT");

        let auth: CliError = CoreError::AuthenticationFailed {
            message: "token rejected (HTTP 401)".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err: CliError = ConfigError::Validation {
            field: "mqtt.broker_url".into(),
            reason: "expected tcp://host:port".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
