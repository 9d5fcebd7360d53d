// Common types for Tuya Tray

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A device registered to the configured cloud user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Opaque vendor device identifier
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Whether the vendor cloud currently reports the device as online
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

/// One status data point of a device
///
/// `value` is whatever scalar the vendor returns; only boolean values are
/// togglable from the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    pub code: String,
    pub value: Value,
}

impl StatusItem {
    /// The boolean value, if this data point is switch-like
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}

/// A single device command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub code: String,
    pub value: Value,
}

/// Body of `POST /v1.0/devices/{id}/commands`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub commands: Vec<DeviceCommand>,
}

/// Envelope wrapping every Tuya API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    pub result: Option<T>,
    #[serde(default)]
    pub t: Option<u64>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, mapping `success: false` to a typed API error
    pub fn into_result(self) -> Result<T> {
        if !self.success {
            return Err(Error::Api {
                code: self.code.unwrap_or(0),
                msg: self.msg.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        self.result.ok_or_else(|| Error::Api {
            code: self.code.unwrap_or(0),
            msg: "missing result in successful response".to_string(),
        })
    }
}

/// Result of `GET /v1.0/token?grant_type=1`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Remaining validity in seconds
    pub expire_time: i64,
    #[serde(default)]
    pub uid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_online_defaults_to_true() {
        let device: Device = serde_json::from_value(json!({
            "id": "dev1",
            "name": "Desk Plug",
        }))
        .unwrap();
        assert!(device.online);
    }

    #[test]
    fn test_status_item_bool_detection() {
        let switch = StatusItem {
            code: "switch_1".to_string(),
            value: json!(true),
        };
        let countdown = StatusItem {
            code: "countdown_1".to_string(),
            value: json!(120),
        };

        assert_eq!(switch.as_bool(), Some(true));
        assert_eq!(countdown.as_bool(), None);
    }

    #[test]
    fn test_envelope_success() {
        let envelope: ApiResponse<Vec<Device>> = serde_json::from_value(json!({
            "success": true,
            "result": [{"id": "dev1", "name": "Desk Plug", "online": false}],
            "t": 1700000000000u64,
        }))
        .unwrap();

        let devices = envelope.into_result().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Desk Plug");
        assert!(!devices[0].online);
    }

    #[test]
    fn test_envelope_failure_maps_to_api_error() {
        let envelope: ApiResponse<Vec<Device>> = serde_json::from_value(json!({
            "success": false,
            "code": 1106,
            "msg": "permission deny",
            "t": 1700000000000u64,
        }))
        .unwrap();

        match envelope.into_result() {
            Err(Error::Api { code, msg }) => {
                assert_eq!(code, 1106);
                assert_eq!(msg, "permission deny");
            }
            other => panic!("expected API error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_command_request_wire_format() {
        let body = CommandRequest {
            commands: vec![DeviceCommand {
                code: "switch_1".to_string(),
                value: json!(false),
            }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"commands": [{"code": "switch_1", "value": false}]})
        );
    }
}
