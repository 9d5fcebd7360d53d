// Framework-agnostic menu model
//
// Pure functions from application state to a menu description. The ksni
// mapping lives in tray.rs so this part stays unit-testable.

use serde_json::Value;

use tuya_tray_common::StatusItem;

use crate::state::{DeviceEntry, DeviceList};

/// Devices section of the tray menu
#[derive(Debug, Clone, PartialEq)]
pub enum DevicesSection {
    /// Single disabled placeholder row
    Placeholder(&'static str),
    /// One submenu per device
    Devices(Vec<DeviceMenu>),
}

/// Submenu for one device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMenu {
    pub device_id: String,
    pub label: String,
    pub entries: Vec<StatusEntry>,
}

/// One row in a device submenu
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub code: String,
    pub label: String,
    /// Current value when the data point is a togglable boolean;
    /// display-only rows carry `None`
    pub toggle: Option<bool>,
}

/// Build the devices section from the current device list
pub fn devices_section(devices: &DeviceList) -> DevicesSection {
    match devices {
        DeviceList::Unconfigured => DevicesSection::Placeholder("Not configured"),
        DeviceList::Failed(_) => DevicesSection::Placeholder("Device list unavailable"),
        DeviceList::Loaded(entries) if entries.is_empty() => {
            DevicesSection::Placeholder("No devices found")
        }
        DeviceList::Loaded(entries) => {
            DevicesSection::Devices(entries.iter().map(device_menu).collect())
        }
    }
}

/// Build the submenu for a single device. Status rows keep vendor order.
pub fn device_menu(entry: &DeviceEntry) -> DeviceMenu {
    let label = if entry.device.online {
        entry.device.name.clone()
    } else {
        format!("{} (offline)", entry.device.name)
    };

    DeviceMenu {
        device_id: entry.device.id.clone(),
        label,
        entries: entry.status.iter().map(status_entry).collect(),
    }
}

/// Build one status row. Booleans get an On/Off label and are togglable;
/// other scalars are shown as-is.
pub fn status_entry(item: &StatusItem) -> StatusEntry {
    match item.as_bool() {
        Some(value) => StatusEntry {
            code: item.code.clone(),
            label: format!("{} - {}", item.code, if value { "On" } else { "Off" }),
            toggle: Some(value),
        },
        None => StatusEntry {
            code: item.code.clone(),
            label: format!("{} - {}", item.code, render_scalar(&item.value)),
            toggle: None,
        },
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
