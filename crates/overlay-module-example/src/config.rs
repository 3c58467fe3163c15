use serde::{Deserialize, Serialize};

/// `[[modules]] id = "example"` section of the host config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleConfig {
    #[serde(default = "default_notification_interval_ms")]
    pub notification_interval_ms: u64,

    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Fixed, module-unique. Never derive it at runtime or the icon moves
    /// between sessions.
    #[serde(default = "default_corner_icon_priority")]
    pub corner_icon_priority: i32,

    /// Unique across the host and every other module.
    #[serde(default = "default_window_id")]
    pub window_id: String,
}

fn default_notification_interval_ms() -> u64 {
    60_000
}
fn default_refresh_interval_ms() -> u64 {
    5_000
}
fn default_corner_icon_priority() -> i32 {
    1_645_843_523
}
fn default_window_id() -> String {
    "ExampleModule_My_Unique_ID_123".to_string()
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            notification_interval_ms: default_notification_interval_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            corner_icon_priority: default_corner_icon_priority(),
            window_id: default_window_id(),
        }
    }
}
