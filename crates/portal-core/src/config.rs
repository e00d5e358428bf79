//! Application configuration management.
//!
//! Two sources feed the front-end:
//! - Required environment variables (`VITE_BASE_URL`, `VITE_ENVIRONMENT`),
//!   resolved once at startup. A missing value is fatal.
//! - `Preferences`, a small JSON file remembering the last email used to
//!   log in, stored at `~/.config/portal/config.json`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Application name used for config directory paths
const APP_NAME: &str = "portal";

/// Preferences file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BASE_URL: &str = "VITE_BASE_URL";
pub const ENV_ENVIRONMENT: &str = "VITE_ENVIRONMENT";
pub const ENV_LOCALE: &str = "PORTAL_LOCALE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Locale used for user-facing validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Id,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "id" => Ok(Locale::Id),
            other => Err(format!("unsupported locale '{}'", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Id => write!(f, "id"),
        }
    }
}

/// Values resolved from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub environment: String,
    pub locale: Locale,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = require(&lookup, ENV_BASE_URL)?;
        let environment = require(&lookup, ENV_ENVIRONMENT)?;

        let parsed = Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            name: ENV_BASE_URL,
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                name: ENV_BASE_URL,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let locale = match lookup(ENV_LOCALE).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidValue {
                name: ENV_LOCALE,
                reason,
            })?,
            None => Locale::default(),
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            environment,
            locale,
        })
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev")
    }
}

fn require<F>(lookup: &F, key: &'static str) -> std::result::Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

// ============================================================================
// Preferences
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Preferences {
    pub last_email: Option<String>,
}

impl Preferences {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
