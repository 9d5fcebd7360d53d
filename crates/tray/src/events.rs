// Application events flowing from the tray icon and the configuration
// window into the main event loop

use tuya_tray_common::TuyaConfig;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Flip a boolean status code on a device
    Toggle {
        device_id: String,
        code: String,
        current: bool,
    },

    /// Show the configuration window
    OpenConfig,

    /// New credentials submitted from the configuration window
    ConfigSubmitted(TuyaConfig),
}
