//! Module settings.
//!
//! Settings live in named collections owned by a [`SettingsStore`]. A module
//! defines its settings once and keeps the returned [`SettingEntry`] handles;
//! the store persists the values across process restarts.

mod collection;
mod entry;
mod error;
mod store;
mod subscription;

pub use collection::SettingCollection;
pub use entry::{SettingEntry, SettingValue, ValueChanged};
pub use error::{SettingsError, SettingsResult};
pub use store::SettingsStore;
pub use subscription::Subscription;
