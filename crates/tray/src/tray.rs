// System tray icon

use tokio::sync::mpsc::UnboundedSender;

use crate::events::AppEvent;
use crate::menu::{self, DevicesSection};
use crate::state::{DeviceList, SharedState};

use ksni::menu::{StandardItem, SubMenu};

/// Tray icon service
#[derive(Clone)]
pub struct DeviceTray {
    state: SharedState,
    events: UnboundedSender<AppEvent>,
}

impl DeviceTray {
    pub fn new(state: SharedState, events: UnboundedSender<AppEvent>) -> Self {
        Self { state, events }
    }

    fn send(&self, event: AppEvent) {
        // The receiver lives for the whole process
        let _ = self.events.send(event);
    }
}

impl ksni::Tray for DeviceTray {
    fn id(&self) -> String {
        "tuya-tray".to_string()
    }

    fn icon_name(&self) -> String {
        let state = self.state.blocking_read();
        match state.devices {
            DeviceList::Loaded(_) => "network-transmit-receive".to_string(),
            DeviceList::Unconfigured | DeviceList::Failed(_) => "network-offline".to_string(),
        }
    }

    fn title(&self) -> String {
        let state = self.state.blocking_read();
        match &state.devices {
            DeviceList::Unconfigured => "Tuya Devices (not configured)".to_string(),
            DeviceList::Failed(_) => "Tuya Devices (unavailable)".to_string(),
            DeviceList::Loaded(entries) => format!("Tuya Devices ({})", entries.len()),
        }
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn icon_theme_path(&self) -> String {
        "/usr/share/icons/hicolor".to_string()
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        let section = {
            let state = self.state.blocking_read();
            menu::devices_section(&state.devices)
        };

        let mut items = vec![];

        match section {
            DevicesSection::Placeholder(label) => {
                items.push(ksni::MenuItem::Standard(StandardItem {
                    label: label.to_string(),
                    enabled: false,
                    ..Default::default()
                }));
            }
            DevicesSection::Devices(devices) => {
                for device in devices {
                    let mut submenu = vec![];
                    for entry in &device.entries {
                        let device_id = device.device_id.clone();
                        let code = entry.code.clone();
                        let current = entry.toggle;

                        submenu.push(ksni::MenuItem::Standard(StandardItem {
                            label: entry.label.clone(),
                            enabled: current.is_some(),
                            activate: Box::new(move |this: &mut Self| {
                                if let Some(current) = current {
                                    this.send(AppEvent::Toggle {
                                        device_id: device_id.clone(),
                                        code: code.clone(),
                                        current,
                                    });
                                }
                            }),
                            ..Default::default()
                        }));
                    }

                    items.push(ksni::MenuItem::SubMenu(SubMenu {
                        label: device.label,
                        submenu,
                        ..Default::default()
                    }));
                }
            }
        }

        items.push(ksni::MenuItem::Separator);

        items.push(ksni::MenuItem::Standard(StandardItem {
            label: "Open Configuration".to_string(),
            activate: Box::new(|this: &mut Self| {
                this.send(AppEvent::OpenConfig);
            }),
            ..Default::default()
        }));

        items.push(ksni::MenuItem::Standard(StandardItem {
            label: "Quit".to_string(),
            activate: Box::new(|_| {
                std::process::exit(0);
            }),
            ..Default::default()
        }));

        items
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        // Single click - show a status summary notification
        let message = {
            let state = self.state.blocking_read();
            match &state.devices {
                DeviceList::Unconfigured => {
                    "No credentials configured.\nOpen Configuration to get started.".to_string()
                }
                DeviceList::Failed(reason) => format!("Device list unavailable: {}", reason),
                DeviceList::Loaded(entries) => match state.last_refresh {
                    Some(refreshed) => format!(
                        "{} devices, last refresh {}",
                        entries.len(),
                        refreshed.format("%H:%M:%S")
                    ),
                    None => format!("{} devices", entries.len()),
                },
            }
        };

        let _ = notify_rust::Notification::new()
            .summary("Tuya Smart Device Control")
            .body(&message)
            .timeout(notify_rust::Timeout::Milliseconds(3000))
            .show();
    }
}

/// Start the tray service on its own thread and return a handle for
/// pushing menu updates
pub fn spawn_tray(state: SharedState, events: UnboundedSender<AppEvent>) -> ksni::Handle<DeviceTray> {
    let service = ksni::TrayService::new(DeviceTray::new(state, events));
    let handle = service.handle();

    // ksni needs its own thread
    std::thread::spawn(move || {
        let _ = service.run();
    });

    handle
}
