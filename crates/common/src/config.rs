// Credential configuration for the Tuya cloud

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// The four credential fields, persisted as a single JSON object.
///
/// Keys stay camelCase on disk for compatibility with config files written
/// by earlier versions of this tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TuyaConfig {
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
    pub user_id: String,
}

impl TuyaConfig {
    /// All four fields present; the cloud client is only built from a
    /// complete config
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty()
            && !self.access_key.is_empty()
            && !self.secret_key.is_empty()
            && !self.user_id.is_empty()
    }
}

/// Loads and saves the config file at a fixed per-user path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the default location: `<config_dir>/tuya-tray/config.json`
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        Ok(Self {
            path: config_dir.join("tuya-tray").join("config.json"),
        })
    }

    /// Store at an explicit path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config. A missing file yields the all-empty default;
    /// malformed JSON is an error.
    pub fn load(&self) -> Result<TuyaConfig> {
        if !self.path.exists() {
            debug!("Config file does not exist: {}", self.path.display());
            return Ok(TuyaConfig::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Overwrite the config file with the given values
    pub fn save(&self, config: &TuyaConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, contents)?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}
