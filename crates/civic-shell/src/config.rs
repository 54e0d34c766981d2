//! Shell configuration.
//!
//! Loaded from a TOML file, then overridden from `CIVIC_SHELL_*` environment
//! variables, then validated. Every field has a default so an empty file is
//! a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{CitizenProfile, ProfileId, Roster, RosterError};
use crate::notice::MAX_PENDING_NOTICES;
use crate::router::{Screen, DEFAULT_FALLBACK_MESSAGE};

/// Delay of the simulated identity context reload.
pub const DEFAULT_SWITCH_LATENCY_MS: u64 = 1500;

/// Upper bound accepted for `switch_latency_ms`.
pub const MAX_SWITCH_LATENCY_MS: u64 = 60_000;

/// Placeholder avatar service used when a profile has no photo.
pub const DEFAULT_AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CIVIC_SHELL_";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid config file: {0}")]
    Parse(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("default profile {0} is not in the roster")]
    UnknownDefault(ProfileId),
    #[error("switch latency {0}ms exceeds {MAX_SWITCH_LATENCY_MS}ms")]
    LatencyOutOfRange(u64),
    #[error("fallback message must not be empty")]
    EmptyFallback,
}

/// Shell configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Screen shown after boot
    pub start_view: Screen,
    /// Delay before a requested identity switch completes
    pub switch_latency_ms: u64,
    /// Initially active profile; the roster's first entry when unset
    pub default_profile: Option<ProfileId>,
    /// Switchable profiles, in menu order
    pub roster: Vec<CitizenProfile>,
    /// Placeholder avatar service
    pub avatar_base_url: String,
    /// Text shown for modules without a view
    pub fallback_message: String,
    /// Bound on queued notices
    pub max_pending_notices: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            start_view: Screen::Parking,
            switch_latency_ms: DEFAULT_SWITCH_LATENCY_MS,
            default_profile: None,
            roster: default_roster(),
            avatar_base_url: DEFAULT_AVATAR_BASE_URL.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            max_pending_notices: MAX_PENDING_NOTICES,
        }
    }
}

/// Built-in demo roster.
pub fn default_roster() -> Vec<CitizenProfile> {
    vec![
        CitizenProfile::new("citizen-01", "Budi Santoso", "Warga", "budi"),
        CitizenProfile::new("citizen-02", "Siti Aminah", "Ketua RT 05", "siti"),
        CitizenProfile::new("citizen-03", "Agus Pratama", "Pedagang Pasar", "agus"),
        CitizenProfile::new("citizen-04", "Dewi Lestari", "Kader Posyandu", "dewi"),
    ]
}

impl ShellConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "shell config loaded");
        Ok(config)
    }

    /// Merge with `CIVIC_SHELL_*` process environment variables
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_env_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; unrelated names are ignored.
    pub fn merge_env_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "START_VIEW" => {
                    self.start_view = value.parse().map_err(|e: crate::router::UnknownScreen| {
                        invalid(key.as_ref(), e.to_string())
                    })?;
                }
                "SWITCH_LATENCY_MS" => {
                    self.switch_latency_ms = value
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(key.as_ref(), e.to_string()))?;
                }
                "DEFAULT_PROFILE" => {
                    self.default_profile = (!value.is_empty()).then(|| ProfileId::new(value));
                }
                "AVATAR_BASE_URL" => self.avatar_base_url = value.to_string(),
                _ => tracing::debug!(variable = key.as_ref(), "ignoring unknown shell override"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let roster = self.build_roster()?;
        if let Some(default) = &self.default_profile {
            if !roster.contains(default) {
                return Err(ConfigError::UnknownDefault(default.clone()));
            }
        }
        if self.switch_latency_ms > MAX_SWITCH_LATENCY_MS {
            return Err(ConfigError::LatencyOutOfRange(self.switch_latency_ms));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(ConfigError::EmptyFallback);
        }
        Ok(())
    }

    /// Validated roster
    pub fn build_roster(&self) -> Result<Roster, ConfigError> {
        Ok(Roster::new(self.roster.clone())?)
    }

    pub fn switch_latency(&self) -> Duration {
        Duration::from_millis(self.switch_latency_ms)
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}
