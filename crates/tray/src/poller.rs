// Fixed-interval refresh of devices and statuses
//
// A tick that fires while a previous refresh is still in flight is
// skipped, so at most one rebuild runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::state::{DeviceEntry, DeviceList, SharedState};
use crate::tray::DeviceTray;

/// Poll period
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Admits at most one refresh at a time
pub struct RefreshGate {
    busy: AtomicBool,
}

/// Held for the duration of one refresh; released on drop
pub struct RefreshPermit<'a> {
    gate: &'a RefreshGate,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    pub fn try_acquire(&self) -> Option<RefreshPermit<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(RefreshPermit { gate: self })
        }
    }
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Drive the poll loop, pushing a menu update to the tray after each cycle
pub async fn run_poller(state: SharedState, gate: Arc<RefreshGate>, handle: ksni::Handle<DeviceTray>) {
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        refresh(&state, &gate).await;

        // The tray re-reads state when the menu is next built
        handle.update(|_tray: &mut DeviceTray| {});
    }
}

/// One fetch-all cycle; a no-op when a previous cycle is still running
pub async fn refresh(state: &SharedState, gate: &RefreshGate) {
    let Some(_permit) = gate.try_acquire() else {
        debug!("Refresh already in flight, skipping");
        return;
    };

    let (client, user_id) = {
        let state = state.read().await;
        (state.client.clone(), state.config.user_id.clone())
    };

    let Some(client) = client else {
        let mut state = state.write().await;
        state.devices = DeviceList::Unconfigured;
        return;
    };

    let devices = match client.list_devices(&user_id).await {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to fetch device list: {}", e);
            let mut state = state.write().await;
            state.devices = DeviceList::Failed(e.to_string());
            state.last_refresh = Some(chrono::Utc::now());
            return;
        }
    };

    // Status fetches for all devices run concurrently; a failed fetch
    // degrades to an empty status list for that device
    let entries = join_all(devices.into_iter().map(|device| {
        let client = client.clone();
        async move {
            let status = match client.device_status(&device.id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Failed to fetch status for {}: {}", device.id, e);
                    Vec::new()
                }
            };
            DeviceEntry { device, status }
        }
    }))
    .await;

    debug!("Refreshed {} devices", entries.len());

    let mut state = state.write().await;
    state.devices = DeviceList::Loaded(entries);
    state.last_refresh = Some(chrono::Utc::now());
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tokio::sync::RwLock;

    use crate::state::AppState;
    use tuya_tray_common::TuyaConfig;

    fn shared_state(config: TuyaConfig) -> SharedState {
        Arc::new(RwLock::new(AppState::new(config).unwrap()))
    }

    fn server_config(server: &mockito::Server) -> TuyaConfig {
        TuyaConfig {
            base_url: server.url(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            user_id: "u123".to_string(),
        }
    }

    async fn mock_token(server: &mut mockito::Server) {
        server
            .mock("GET", "/v1.0/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "result": {"access_token": "tok", "expire_time": 7200},
                    "t": 1700000000000u64,
                })
                .to_string(),
            )
            .create_async()
            .await;
    }

    #[test]
    fn test_gate_admits_one_holder() {
        let gate = RefreshGate::new();

        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_refresh_without_client_marks_unconfigured() {
        let state = shared_state(TuyaConfig::default());
        let gate = RefreshGate::new();

        refresh(&state, &gate).await;

        let state = state.read().await;
        assert!(matches!(state.devices, DeviceList::Unconfigured));
    }

    #[tokio::test]
    async fn test_refresh_loads_devices_and_statuses() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/v1.0/users/u123/devices")
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "result": [{"id": "dev1", "name": "Desk Plug", "online": true}],
                    "t": 1700000000000u64,
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v1.0/devices/dev1/status")
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "result": [{"code": "switch_1", "value": true}],
                    "t": 1700000000000u64,
                })
                .to_string(),
            )
            .create_async()
            .await;

        let state = shared_state(server_config(&server));
        let gate = RefreshGate::new();

        refresh(&state, &gate).await;

        let state = state.read().await;
        match &state.devices {
            DeviceList::Loaded(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].device.name, "Desk Plug");
                assert_eq!(entries[0].status.len(), 1);
                assert_eq!(entries[0].status[0].code, "switch_1");
            }
            other => panic!("expected loaded devices, got {:?}", other),
        }
        assert!(state.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_device_list_failure_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/v1.0/users/u123/devices")
            .with_status(500)
            .create_async()
            .await;

        let state = shared_state(server_config(&server));
        let gate = RefreshGate::new();

        refresh(&state, &gate).await;

        let state = state.read().await;
        assert!(matches!(state.devices, DeviceList::Failed(_)));
    }

    #[tokio::test]
    async fn test_status_failure_degrades_to_empty_status() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/v1.0/users/u123/devices")
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "result": [{"id": "dev1", "name": "Desk Plug", "online": true}],
                    "t": 1700000000000u64,
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v1.0/devices/dev1/status")
            .with_status(500)
            .create_async()
            .await;

        let state = shared_state(server_config(&server));
        let gate = RefreshGate::new();

        refresh(&state, &gate).await;

        let state = state.read().await;
        match &state.devices {
            DeviceList::Loaded(entries) => {
                assert_eq!(entries.len(), 1);
                assert!(entries[0].status.is_empty());
            }
            other => panic!("expected loaded devices, got {:?}", other),
        }
    }
}
