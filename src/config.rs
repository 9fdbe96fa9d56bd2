//! Application Configuration Module
//! Tunables for forecasting and layout, loaded from an optional JSON file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WEATHERCAST_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "weathercast.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Subplots per chart row
    pub grid_columns: usize,
    /// Season length (days) used by the seasonal model
    pub seasonal_period: usize,
    /// Below this many observations the naive model is used
    pub min_model_points: usize,
    /// Largest horizon accepted by input validation
    pub max_horizon_days: usize,
    /// Horizon pre-filled in the input field
    pub default_horizon: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid_columns: 3,
            seasonal_period: 7,
            min_model_points: 10,
            max_horizon_days: 3650,
            default_horizon: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from `$WEATHERCAST_CONFIG`, then `./weathercast.json`,
    /// falling back to defaults when neither is present.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text).context("malformed JSON")?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self> {
        if self.grid_columns == 0 {
            bail!("grid_columns must be at least 1");
        }
        if self.seasonal_period < 2 {
            bail!("seasonal_period must be at least 2");
        }
        if self.max_horizon_days == 0 {
            bail!("max_horizon_days must be at least 1");
        }
        Ok(self)
    }
}
