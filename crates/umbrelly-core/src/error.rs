// ── Core error types ──
//
// User-facing errors from umbrelly-core. Consumers never match on HTTP
// status codes or JSON parse failures directly: the `From<umbrelly_api::Error>`
// impl folds transport-layer errors into setup and refresh diagnostics.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to umbrelOS at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    /// Setup could not produce a first snapshot. Retrying later may succeed.
    #[error("umbrelOS host not ready: {reason}")]
    NotReady { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("App not found: {identifier}")]
    AppNotFound { identifier: String },

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
    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::NotReady { .. }
        ) || matches!(self, Self::Api { status: Some(s), .. } if *s >= 500 || *s == 429)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<umbrelly_api::Error> for CoreError {
    fn from(err: umbrelly_api::Error) -> Self {
        match err {
            umbrelly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            umbrelly_api::Error::Api { status: 401, message } => CoreError::AuthenticationFailed {
                message: if message.is_empty() {
                    "session rejected by host".into()
                } else {
                    message
                },
            },
            umbrelly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            umbrelly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid host URL: {e}"),
            },
            umbrelly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            umbrelly_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            umbrelly_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Malformed response: {message}"),
                status: None,
            },
        }
    }
}
