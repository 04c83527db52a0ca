//! Discovery configuration.
//!
//! Every field has a default, so an absent or partial YAML file is valid.
//!
//! # Example YAML
//!
//! ```yaml
//! target_program: kubectl
//! registry_url: http://10.0.0.5:8080
//! help_timeout_ms: 5000
//! probe_jobs: 4
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Registry CLI used by the structured fast-path.
pub const DEFAULT_REGISTRY_PROGRAM: &str = "mcpjungle";

/// Registry endpoint the registry CLI talks to when no flag is passed.
pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:8080";

/// Minimum confidence for a candidate to appear in a subcommand listing.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.35;

/// Hard cap on subcommands listed (and look-ahead probes issued) per level.
pub const DEFAULT_MAX_SUBCOMMANDS: usize = 15;

/// Cap on formatted options listed in option mode.
pub const DEFAULT_MAX_OPTIONS: usize = 50;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLIMB_CONFIG";
/// Environment override for [`DiscoverConfig::target_program`].
pub const TARGET_ENV: &str = "CLIMB_TARGET";
/// Environment override for [`DiscoverConfig::registry_url`].
pub const REGISTRY_URL_ENV: &str = "CLIMB_REGISTRY_URL";

/// Settings for a discovery run.
///
/// # Examples
///
/// ```
/// use climb_discovery::config::DiscoverConfig;
///
/// let config: DiscoverConfig = serde_yaml::from_str("target_program: git").unwrap();
/// assert_eq!(config.target_program.as_deref(), Some("git"));
/// assert_eq!(config.min_confidence, 0.35);
/// assert_eq!(config.max_subcommands, 15);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverConfig {
    /// Program inspected when the invocation names none.
    pub target_program: Option<String>,
    /// Registry CLI that gets the structured listing treatment.
    pub registry_program: String,
    pub registry_url: String,
    pub help_timeout_ms: u64,
    pub usage_timeout_ms: u64,
    pub listing_timeout_ms: u64,
    pub min_confidence: f64,
    pub max_subcommands: usize,
    pub max_options: usize,
    /// Look-ahead probe parallelism; `1` keeps probes sequential.
    pub probe_jobs: usize,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            target_program: Some(DEFAULT_REGISTRY_PROGRAM.to_string()),
            registry_program: DEFAULT_REGISTRY_PROGRAM.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            help_timeout_ms: 8000,
            usage_timeout_ms: 10_000,
            listing_timeout_ms: 30_000,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_subcommands: DEFAULT_MAX_SUBCOMMANDS,
            max_options: DEFAULT_MAX_OPTIONS,
            probe_jobs: 1,
        }
    }
}

impl DiscoverConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit path must exist. Otherwise `$CLIMB_CONFIG` and then the
    /// per-user config file are tried; a missing per-user file is not an
    /// error. Environment overrides are applied last and the result is
    /// validated.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match env::var_os(CONFIG_ENV) {
                Some(path) if !path.is_empty() => Self::load(PathBuf::from(path))?,
                _ => match user_config_path().filter(|path| path.is_file()) {
                    Some(path) => Self::load(path)?,
                    None => Self::default(),
                },
            },
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        debug!(?config, "Resolved discovery config");
        Ok(config)
    }

    /// Applies `CLIMB_TARGET` / `CLIMB_REGISTRY_URL` from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(target) = lookup(TARGET_ENV) {
            self.target_program = Some(target);
        }
        if let Some(url) = lookup(REGISTRY_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.registry_url = url;
        }
    }

    /// Rejects values that would make discovery meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(
                "min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.help_timeout_ms == 0 || self.usage_timeout_ms == 0 || self.listing_timeout_ms == 0
        {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_subcommands == 0 || self.max_options == 0 {
            return Err(ConfigError::Invalid(
                "max_subcommands and max_options must be greater than zero".to_string(),
            ));
        }
        if self.registry_program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "registry_program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured default target, if it is non-blank.
    pub fn default_target(&self) -> Option<&str> {
        self.target_program
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }

    pub fn help_timeout(&self) -> Duration {
        Duration::from_millis(self.help_timeout_ms)
    }

    pub fn usage_timeout(&self) -> Duration {
        Duration::from_millis(self.usage_timeout_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_millis(self.listing_timeout_ms)
    }
}

/// `$XDG_CONFIG_HOME/climb/config.yaml`, else `$HOME/.config/climb/config.yaml`.
pub fn user_config_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("climb").join("config.yaml"))
}
