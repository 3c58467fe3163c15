use async_trait::async_trait;
use overlay_settings::SettingCollection;
use std::sync::Arc;

use crate::ctx::ModuleCtx;
use crate::error::ModuleResult;
use crate::frame::Frame;

/// Module lifecycle contract.
///
/// Methods take `&self`: `unload` may run while `load_async` is still in
/// flight on another task, so module state lives behind interior mutability.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    fn id(&self) -> &'static str;

    /// Register settings. Called on every load, before `load_async`;
    /// redefining a key hands back the existing entry.
    fn define_settings(&self, _settings: &SettingCollection) -> ModuleResult<()> {
        Ok(())
    }

    /// One-time load sequence, run off the update loop.
    ///
    /// Recoverable failures are handled inside. An `Err` is fatal and is
    /// reported by the host.
    async fn load_async(&self, ctx: Arc<ModuleCtx>) -> ModuleResult<()>;

    /// Per-frame tick while loaded. Must not block.
    fn update(&self, _ctx: &Arc<ModuleCtx>, _frame: &Frame) -> ModuleResult<()> {
        Ok(())
    }

    /// Release everything the module owns. May run before `load_async`
    /// completed and must tolerate partially built state.
    fn unload(&self, _ctx: &ModuleCtx) {}
}
