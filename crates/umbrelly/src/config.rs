//! CLI configuration: resolves the active profile and layers global flags
//! on top before handing a `CoordinatorConfig` to core.
//!
//! Loading, saving and password resolution live in `umbrelly-config`.

use std::time::Duration;

use secrecy::SecretString;

use umbrelly_config::{Config, Profile};
use umbrelly_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use umbrelly_config::{config_path, load_config_or_default, save_config, store_password};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the runtime config for the active profile, falling back to
/// `--host` alone when no profile exists.
pub fn coordinator_config(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    if global.host.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    resolve_profile(&Profile::default(), &profile_name, &cfg, global)
}

/// Translate a profile plus global flags into a `CoordinatorConfig`.
///
/// Flags win over the profile: `--host`, `--password`, `--insecure`,
/// `--timeout`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<CoordinatorConfig, CliError> {
    let effective = Profile {
        host: global.host.clone().unwrap_or_else(|| profile.host.clone()),
        password: profile.password.clone(),
        password_env: profile.password_env.clone(),
        ca_cert: profile.ca_cert.clone(),
        insecure: if global.insecure {
            Some(true)
        } else {
            profile.insecure
        },
        timeout: global.timeout.or(profile.timeout),
        refresh_interval: profile.refresh_interval,
    };

    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => umbrelly_config::resolve_password(&effective, profile_name)?,
    };

    let config = umbrelly_config::build_coordinator_config(&effective, &cfg.defaults, password)?;
    tracing::debug!(
        profile = profile_name,
        host = %config.host,
        timeout_secs = config.timeout.as_secs(),
        "resolved coordinator config"
    );
    Ok(config)
}

/// Apply a `watch --interval` override.
pub fn with_refresh_interval(mut config: CoordinatorConfig, secs: Option<u64>) -> CoordinatorConfig {
    if let Some(secs) = secs {
        config.refresh_interval = Duration::from_secs(secs);
    }
    config
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::Parser;
    use secrecy::ExposeSecret;
    use umbrelly_core::TlsVerification;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["umbrelly"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn home_profile() -> Profile {
        Profile {
            host: "umbrel.local".into(),
            password: Some("from-file".into()),
            insecure: Some(false),
            timeout: Some(45),
            ..Profile::default()
        }
    }

    #[test]
    fn flags_override_profile() {
        let cfg = Config::default();
        let opts = global(&[
            "--host",
            "http://10.0.0.5",
            "--password",
            "from-flag",
            "--insecure",
            "--timeout",
            "5",
        ]);
        let config = resolve_profile(&home_profile(), "home", &cfg, &opts).unwrap();

        assert_eq!(config.host, "http://10.0.0.5");
        assert_eq!(config.password.expose_secret(), "from-flag");
        assert!(matches!(config.tls, TlsVerification::DangerAcceptInvalid));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let cfg = Config::default();
        let opts = GlobalOpts {
            password: Some("pw".into()),
            ..global(&[])
        };
        let config = resolve_profile(&home_profile(), "home", &cfg, &opts).unwrap();

        assert_eq!(config.host, "umbrel.local");
        assert!(matches!(config.tls, TlsVerification::SystemDefaults));
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn profile_name_prefers_flag_then_default() {
        let mut cfg = Config::default();
        assert_eq!(active_profile_name(&global(&[]), &cfg), "default");

        cfg.default_profile = Some("home".into());
        assert_eq!(active_profile_name(&global(&[]), &cfg), "home");
        assert_eq!(
            active_profile_name(&global(&["--profile", "office"]), &cfg),
            "office"
        );
    }

    #[test]
    fn watch_interval_override() {
        let config = CoordinatorConfig::new("umbrel.local", SecretString::from("pw"));
        assert_eq!(
            with_refresh_interval(config.clone(), Some(5)).refresh_interval,
            Duration::from_secs(5)
        );
        assert_eq!(
            with_refresh_interval(config, None).refresh_interval,
            Duration::from_secs(30)
        );
    }
}
