use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-flight flag for one kind of background task.
///
/// A new dispatch is skipped, not queued, while the previous one still
/// holds its [`TaskPermit`].
#[derive(Clone, Debug)]
pub struct TaskSlot {
    name: &'static str,
    busy: Arc<AtomicBool>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the slot. `None` while a previous permit is alive.
    pub fn try_acquire(&self) -> Option<TaskPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TaskPermit {
                busy: self.busy.clone(),
            })
    }
}

/// Held by the running task; frees the slot on drop.
#[derive(Debug)]
pub struct TaskPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for TaskPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
