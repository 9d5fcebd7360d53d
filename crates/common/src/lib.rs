// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Tuya Tray Contributors

// Tuya Tray - Common Library
// Credential config, cloud client, and shared types

pub mod cloud;
pub mod config;
pub mod error;
pub mod sign;
pub mod types;

pub use cloud::CloudClient;
pub use config::{ConfigStore, TuyaConfig};
pub use error::{Error, Result};
pub use types::{CommandRequest, Device, DeviceCommand, StatusItem};
