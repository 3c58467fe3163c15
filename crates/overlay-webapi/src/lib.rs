//! Client side of the remote account API.
//!
//! Public endpoints need no credentials. Authenticated endpoints need a
//! subtoken whose permissions are re-checked before every request through
//! [`ApiManager::has_permissions`].

pub mod client;
pub mod error;
pub mod manager;
pub mod model;
pub mod permission;

pub use client::{FixtureClient, WebApiClient};
pub use error::{ApiError, ApiResult};
pub use manager::ApiManager;
pub use model::{Character, Dungeon, DungeonPath};
pub use permission::{Subtoken, TokenPermission};
