// Shared transport configuration for building reqwest::Client instances.
//
// TLS and timeout settings live here so the client constructor and tests
// share one builder path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("umbrelly/", env!("CARGO_PKG_VERSION"));

/// Timeout applied to every data call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout applied to the login call.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (umbrelOS ships self-signed or plain HTTP).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout for data and action calls.
    pub timeout: Duration,
    /// Per-request timeout for `user.login`.
    pub login_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: DEFAULT_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build the `reqwest::Client` shared by every call of one `UmbrelClient`.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("HTTP client setup failed: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_accept_self_signed_hosts() {
        let transport = TransportConfig::default();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(20));
        assert_eq!(transport.login_timeout, Duration::from_secs(10));
        assert!(transport.build_client().is_ok());
    }

    #[test]
    fn missing_ca_bundle_is_a_tls_error() {
        let transport = TransportConfig {
            tls: TlsMode::CustomCa("/nonexistent/umbrel-ca.pem".into()),
            ..TransportConfig::default()
        };
        let err = transport.build_client().err();
        assert!(matches!(err, Some(Error::Tls(msg)) if msg.contains("umbrel-ca.pem")));
    }
}
