//! CLI configuration: thin wrapper around `classdesk_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--base-url, --session-file, --insecure, --timeout).

use classdesk_config::{Defaults, Profile, config_path, load_config};
use classdesk_core::DashboardConfig;
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile in effect for this invocation, with flag overrides applied.
#[derive(Debug)]
pub struct ActiveProfile {
    pub name: String,
    pub profile: Profile,
    pub defaults: Defaults,
}

impl ActiveProfile {
    /// Resolve from the config file, environment and flags.
    ///
    /// A missing profile is fine when `--base-url` is given.
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut cfg = load_config()?;
        let name = cfg.profile_name(global.profile.as_deref()).to_owned();

        let mut profile = match cfg.profiles.remove(&name) {
            Some(profile) => profile,
            None if global.base_url.is_some() => Profile::default(),
            None if global.profile.is_some() => {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available.join(", "),
                });
            }
            None => {
                return Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                });
            }
        };

        if let Some(ref url) = global.base_url {
            profile.base_url.clone_from(url);
        }
        if let Some(ref path) = global.session_file {
            profile.session_file = Some(path.clone());
        }
        if global.insecure {
            profile.insecure = Some(true);
        }
        if let Some(timeout) = global.timeout {
            profile.timeout = Some(timeout);
        }

        Ok(Self {
            name,
            profile,
            defaults: cfg.defaults,
        })
    }

    pub fn dashboard_config(&self) -> Result<DashboardConfig, CliError> {
        Ok(classdesk_config::profile_to_dashboard_config(
            &self.profile,
            &self.name,
            &self.defaults,
        )?)
    }

    /// Email from the flag, else the profile / environment.
    pub fn email(&self, flag: Option<&str>) -> Result<String, CliError> {
        match flag {
            Some(email) => Ok(email.to_owned()),
            None => Ok(classdesk_config::resolve_email(&self.profile, &self.name)?),
        }
    }

    /// Password from the credential chain, prompting on a terminal when
    /// nothing is configured.
    pub fn password(&self) -> Result<SecretString, CliError> {
        match classdesk_config::resolve_password(&self.profile, &self.name) {
            Ok(password) => Ok(password),
            Err(classdesk_config::ConfigError::NoCredentials { profile }) => {
                rpassword::prompt_password("Password: ")
                    .map(SecretString::from)
                    .map_err(|_| CliError::NoCredentials { profile })
            }
            Err(other) => Err(other.into()),
        }
    }
}
