// Application state shared between the poller, the tray icon and the
// event loop

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tuya_tray_common::{CloudClient, Device, StatusItem, TuyaConfig};

pub type SharedState = Arc<RwLock<AppState>>;

/// Devices portion of the menu, keeping "fetch failed" distinct from
/// "no devices registered"
#[derive(Debug, Clone)]
pub enum DeviceList {
    /// No complete credentials yet
    Unconfigured,
    /// Last refresh succeeded
    Loaded(Vec<DeviceEntry>),
    /// Last refresh could not produce a device list
    Failed(String),
}

impl Default for DeviceList {
    fn default() -> Self {
        DeviceList::Unconfigured
    }
}

/// One device together with its last fetched status
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device: Device,
    pub status: Vec<StatusItem>,
}

/// Shared application state
pub struct AppState {
    pub config: TuyaConfig,
    /// Present only while the config is complete; replaced wholesale on
    /// config change
    pub client: Option<Arc<CloudClient>>,
    pub devices: DeviceList,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl AppState {
    /// State from the stored config; the client exists only when the
    /// config is complete
    pub fn new(config: TuyaConfig) -> anyhow::Result<Self> {
        let client = if config.is_complete() {
            Some(Arc::new(CloudClient::new(&config)?))
        } else {
            None
        };

        Ok(Self {
            config,
            client,
            devices: DeviceList::default(),
            last_refresh: None,
        })
    }

    /// Install a new config, rebuilding the client when it is complete
    pub fn apply_config(&mut self, config: TuyaConfig) -> anyhow::Result<()> {
        self.client = if config.is_complete() {
            Some(Arc::new(CloudClient::new(&config)?))
        } else {
            None
        };
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> TuyaConfig {
        TuyaConfig {
            base_url: "https://openapi.tuyaeu.com".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            user_id: "uid".to_string(),
        }
    }

    #[test]
    fn test_incomplete_config_has_no_client() {
        let state = AppState::new(TuyaConfig::default()).unwrap();
        assert!(state.client.is_none());
        assert!(matches!(state.devices, DeviceList::Unconfigured));
    }

    #[test]
    fn test_complete_config_builds_client() {
        let state = AppState::new(complete_config()).unwrap();
        assert!(state.client.is_some());
    }

    #[test]
    fn test_apply_config_replaces_client() {
        let mut state = AppState::new(TuyaConfig::default()).unwrap();
        assert!(state.client.is_none());

        state.apply_config(complete_config()).unwrap();
        assert!(state.client.is_some());

        state.apply_config(TuyaConfig::default()).unwrap();
        assert!(state.client.is_none());
    }
}
