use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative "still loaded" flag shared by a context and its tasks.
///
/// The host retires it when unload starts; background work checks it before
/// touching module state.
#[derive(Clone, Debug)]
pub struct LivenessToken {
    retired: Arc<AtomicBool>,
}

impl LivenessToken {
    #[inline]
    pub fn new() -> Self {
        Self {
            retired: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        !self.retired.load(Ordering::Acquire)
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}
