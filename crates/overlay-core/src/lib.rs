//! Host side of the overlay module lifecycle.
//!
//! A [`ModuleHost`] drives one [`Module`] through
//! `define_settings -> load_async -> update* -> unload`. The module reaches
//! its collaborators only through the [`ModuleCtx`] it is handed; the host
//! creates that context on load and drops it on unload.

pub mod config;
pub mod ctx;
pub mod error;
pub mod frame;
pub mod host;
pub mod liveness;
pub mod module;
pub mod phase;
pub mod task;
pub mod timer;

pub use config::{HostConfig, ModuleConfig};
pub use ctx::{ModuleCtx, ModuleParams};
pub use error::{ModuleError, ModuleResult};
pub use frame::Frame;
pub use host::ModuleHost;
pub use liveness::LivenessToken;
pub use module::Module;
pub use phase::LifecyclePhase;
pub use task::{TaskPermit, TaskSlot};
pub use timer::IntervalTimer;
