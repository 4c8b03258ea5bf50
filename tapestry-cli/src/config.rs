//! Environment configuration
//!
//! Environments (base URL + API key) live in a TOML file under the user
//! config directory:
//!
//! ```toml
//! default_environment = "staging"
//!
//! [environment.staging]
//! base_url = "https://staging.tapestry.example"
//! api_key = "tap_..."
//!
//! [environment.production]
//! base_url = "https://cms.example.com"
//! api_key = "tap_..."
//! ```
//!
//! The selected [`Environment`] is an explicit value handed to every client
//! and engine entry point; nothing here is global, so reconciliations
//! against different environments can run side by side.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// A resolved target environment
#[derive(Debug, Clone)]
pub struct Environment {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EnvironmentEntry {
    base_url: String,
    api_key: String,
}

/// The parsed configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    default_environment: Option<String>,
    #[serde(default)]
    environment: BTreeMap<String, EnvironmentEntry>,
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine the user config directory")?;
        Ok(base.join("tapestry").join("config.toml"))
    }

    /// Load the configuration from its default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file '{}'", path.display()))
    }

    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text).context("failed to parse config TOML")?)
    }

    /// Resolve an environment by name, falling back to the configured
    /// default, or to the sole entry when only one is defined.
    pub fn environment(&self, name: Option<&str>) -> Result<Environment> {
        let selected = match name.or(self.default_environment.as_deref()) {
            Some(name) => name.to_string(),
            None => {
                let mut names = self.environment.keys();
                match (names.next(), names.next()) {
                    (Some(only), None) => only.clone(),
                    _ => anyhow::bail!(
                        "no environment selected; pass --env or set default_environment"
                    ),
                }
            }
        };

        let entry = self.environment.get(&selected).with_context(|| {
            format!("environment '{}' is not defined in the config file", selected)
        })?;

        Ok(Environment {
            name: selected,
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            api_key: entry.api_key.clone(),
        })
    }
}
