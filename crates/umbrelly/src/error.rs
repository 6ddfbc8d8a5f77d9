//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use umbrelly_config::ConfigError;
use umbrelly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to umbrelOS at {url}")]
    #[diagnostic(
        code(umbrelly::connection_failed),
        help(
            "Check that the host is powered on and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("umbrelOS host is not ready")]
    #[diagnostic(
        code(umbrelly::not_ready),
        help(
            "{reason}\n\
             The host may still be booting. Try again in a minute."
        )
    )]
    NotReady { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(umbrelly::auth_failed),
        help(
            "{message}\n\
             Update the stored password with: umbrelly config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(umbrelly::no_credentials),
        help(
            "Configure one with: umbrelly config init\n\
             Or set the UMBRELLY_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(umbrelly::not_found),
        help("Run: umbrelly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(umbrelly::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    #[error("The host did not accept '{action}'")]
    #[diagnostic(
        code(umbrelly::action_failed),
        help("Run with -v to see the response from the host.")
    )]
    ActionFailed { action: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(umbrelly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(umbrelly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: umbrelly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No host configured")]
    #[diagnostic(
        code(umbrelly::no_config),
        help(
            "Create a profile with: umbrelly config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(umbrelly::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(umbrelly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(umbrelly::timeout),
        help("Increase the timeout with --timeout or check the host's load.")
    )]
    Timeout,

    #[error("Internal error: {0}")]
    #[diagnostic(code(umbrelly::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NotReady { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. }
            | Self::ApiError {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::NotReady { reason } => Self::NotReady { reason },
            CoreError::AppNotFound { identifier } => Self::NotFound {
                resource_type: "app".into(),
                identifier,
                list_command: "apps list".into(),
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
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_failures_map_to_distinct_exit_codes() {
        let auth: CliError = CoreError::AuthenticationFailed {
            message: "rejected".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let not_ready: CliError = CoreError::NotReady {
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(not_ready.exit_code(), exit_code::CONNECTION);

        let timeout: CliError = CoreError::Timeout.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn missing_app_points_at_the_list_command() {
        let err: CliError = CoreError::AppNotFound {
            identifier: "plex".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            err,
            CliError::NotFound { ref list_command, .. } if list_command == "apps list"
        ));
    }

    #[test]
    fn missing_password_is_an_auth_error() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "home".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
