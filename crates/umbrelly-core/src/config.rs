// ── Runtime connection configuration ──
//
// These types describe *how* to reach one umbrelOS host and how often to
// poll it. They carry credential data but never touch disk: the CLI builds
// a `CoordinatorConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use umbrelly_api::transport::{DEFAULT_LOGIN_TIMEOUT, DEFAULT_TIMEOUT, TlsMode, TransportConfig};
use umbrelly_api::UmbrelClient;

use crate::error::CoreError;

/// Default period between scheduled refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. umbrelOS serves plain HTTP or a self-signed cert.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for polling a single umbrelOS host.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Host as entered by the user: `umbrel.local`, `10.0.0.5:80`, or a full URL.
    pub host: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout for data and action calls.
    pub timeout: Duration,
    /// Per-request timeout for `user.login`.
    pub login_timeout: Duration,
    /// Period of the scheduled refresh. Zero disables the timer.
    pub refresh_interval: Duration,
}

impl CoordinatorConfig {
    pub fn new(host: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            login_timeout: self.login_timeout,
        }
    }

    /// Build the API client this configuration describes.
    pub fn build_client(&self) -> Result<UmbrelClient, CoreError> {
        Ok(UmbrelClient::new(
            &self.host,
            self.password.clone(),
            &self.transport(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = CoordinatorConfig::new("umbrel.local", SecretString::from("pw".to_string()));
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.login_timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn client_normalizes_bare_host() {
        let config = CoordinatorConfig::new("umbrel.local/", SecretString::from("pw".to_string()));
        let client = config.build_client().expect("client");
        assert_eq!(client.base_url().as_str(), "http://umbrel.local/");
    }
}
