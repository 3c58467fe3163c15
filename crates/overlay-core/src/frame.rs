use std::time::Duration;

/// Timing snapshot handed to `Module::update`.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub frame_index: u64,
    /// Time since the previous update.
    pub dt: Duration,
    /// Time since the module reached `Loaded`.
    pub total: Duration,
}
