// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Tuya Tray Contributors

// Tuya Tray - smart device control from the system tray

use std::sync::Arc;

use anyhow::{Context, Result};
use libadwaita as adw;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

mod config_dialog;
mod events;
mod menu;
mod poller;
mod state;
mod tray;

use events::AppEvent;
use poller::RefreshGate;
use state::{AppState, SharedState};
use tray::DeviceTray;
use tuya_tray_common::ConfigStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Tokio runtime for cloud calls; GTK owns the main thread
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let _guard = runtime.enter();

    gtk4::init().context("Failed to initialize GTK")?;
    adw::init().context("Failed to initialize libadwaita")?;

    let store = ConfigStore::new()?;
    let config = store.load().context("Failed to load config")?;
    let needs_setup = !config.is_complete();

    let state: SharedState = Arc::new(RwLock::new(AppState::new(config)?));
    let gate = Arc::new(RefreshGate::new());

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let handle = tray::spawn_tray(state.clone(), events_tx.clone());

    runtime.spawn(poller::run_poller(state.clone(), gate.clone(), handle.clone()));

    // First run without credentials goes straight to the config window
    if needs_setup {
        info!("Config incomplete, opening configuration window");
        let _ = events_tx.send(AppEvent::OpenConfig);
    }

    run_event_loop(state, gate, store, handle, events_tx, events_rx);

    glib::MainLoop::new(None, false).run();
    Ok(())
}

/// Drain application events on the glib main context so the config window
/// can be opened from the main thread; cloud work goes to the runtime
fn run_event_loop(
    state: SharedState,
    gate: Arc<RefreshGate>,
    store: ConfigStore,
    handle: ksni::Handle<DeviceTray>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    mut events_rx: mpsc::UnboundedReceiver<AppEvent>,
) {
    let rt = tokio::runtime::Handle::current();

    glib::MainContext::default().spawn_local(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                AppEvent::OpenConfig => {
                    let current = state.read().await.config.clone();
                    config_dialog::present(&current, events_tx.clone());
                }

                AppEvent::ConfigSubmitted(config) => {
                    info!("Configuration updated");
                    if let Err(e) = store.save(&config) {
                        error!("Failed to save config: {}", e);
                    }

                    {
                        let mut state = state.write().await;
                        if let Err(e) = state.apply_config(config) {
                            error!("Failed to apply config: {}", e);
                        }
                    }

                    spawn_refresh(&rt, state.clone(), gate.clone(), handle.clone());
                }

                AppEvent::Toggle {
                    device_id,
                    code,
                    current,
                } => {
                    let client = state.read().await.client.clone();
                    let Some(client) = client else {
                        warn!("Toggle requested without a configured client");
                        continue;
                    };

                    let toggle_state = state.clone();
                    let toggle_gate = gate.clone();
                    let toggle_handle = handle.clone();
                    rt.spawn(async move {
                        // The menu is refreshed whether or not the command
                        // applied; the refresh reads back actual cloud state
                        if let Err(e) = client.toggle_switch(&device_id, &code, current).await {
                            warn!("Failed to toggle {} on {}: {}", code, device_id, e);
                        }
                        poller::refresh(&toggle_state, &toggle_gate).await;
                        toggle_handle.update(|_tray: &mut DeviceTray| {});
                    });
                }
            }
        }
    });
}

fn spawn_refresh(
    rt: &tokio::runtime::Handle,
    state: SharedState,
    gate: Arc<RefreshGate>,
    handle: ksni::Handle<DeviceTray>,
) {
    rt.spawn(async move {
        poller::refresh(&state, &gate).await;
        handle.update(|_tray: &mut DeviceTray| {});
    });
}
