//! Named Limit Configuration
//!
//! Declarative set of named limits to install into a registry at startup.
//! Stored as JSON:
//!
//! ```json
//! {
//!   "limits": {
//!     "api": { "capacity": 100, "window_secs": 60 },
//!     "internal": { "capacity": 0 }
//!   }
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "QUOTA_WINDOW_CONFIG";

/// One named limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum units per window (0 = unlimited)
    pub capacity: u32,

    /// Window length in seconds (ignored when unlimited)
    #[serde(default)]
    pub window_secs: u64,
}

impl LimitConfig {
    /// Window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Named limits, keyed by name
    pub limits: BTreeMap<String, LimitConfig>,
}

impl RegistryConfig {
    /// Load configuration from the file named by `QUOTA_WINDOW_CONFIG`
    ///
    /// Returns the default (empty) configuration if the variable is unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from_path(path),
            None => {
                tracing::debug!("{} not set, using defaults", CONFIG_PATH_ENV);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields the default configuration. A file that cannot
    /// be parsed or fails validation is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: RegistryConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        config.validate()?;

        tracing::info!("Loaded {} named limits from {:?}", config.limits.len(), path);
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, limit) in &self.limits {
            if name.is_empty() {
                bail!("limit names cannot be empty");
            }
            if limit.capacity > 0 && limit.window_secs == 0 {
                bail!("limit '{}' has capacity {} but no window", name, limit.capacity);
            }
        }
        Ok(())
    }
}
