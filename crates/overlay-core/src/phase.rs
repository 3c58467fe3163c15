/// Where a module is in its lifecycle.
///
/// `Unloaded -> Loading -> Loaded`, and from `Loading` or `Loaded` through
/// `Unloading` back to `Unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Unloading,
}

impl LifecyclePhase {
    /// Phases in which the host may call `unload`.
    #[inline]
    pub fn can_unload(self) -> bool {
        matches!(self, LifecyclePhase::Loading | LifecyclePhase::Loaded)
    }
}
