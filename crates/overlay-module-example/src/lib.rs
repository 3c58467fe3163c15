//! Example overlay module.
//!
//! Shows every part of the module contract: persistent settings with a
//! change subscription, owned and shared textures, windows and menus
//! parented to the screen, periodic notifications and a background refresh
//! of authenticated API data.

pub mod config;
pub mod module;
pub mod refresh;
pub mod settings;

pub use config::ExampleConfig;
pub use module::{ExampleModule, GREETING, HEADER_TEXT, LOADING_TEXT, MODULE_ID};
pub use refresh::{refresh_authenticated_data, RefreshOutcome, PLACEHOLDER, REQUIRED_PERMISSIONS};
pub use settings::{ColorType, ExampleSettings, INTERNAL_COLLECTION};
