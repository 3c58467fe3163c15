use log::warn;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Receipt for one acquired resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub kind: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub acquired: u64,
    pub released: u64,
    pub double_released: u64,
}

#[derive(Default)]
struct LedgerInner {
    next: u64,
    live: BTreeMap<ResourceToken, ResourceRecord>,
    stats: LedgerStats,
}

/// Host-side bookkeeping of every caller-owned resource.
///
/// Owned textures and controls acquire a token when created and release it
/// when disposed, which lets the host verify that a module cleaned up after
/// itself on unload.
#[derive(Default)]
pub struct ResourceLedger {
    inner: Mutex<LedgerInner>,
}

impl ResourceLedger {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, kind: &'static str, label: impl Into<String>) -> ResourceToken {
        let mut g = self.inner.lock();
        g.next += 1;
        let token = ResourceToken(g.next);
        g.live.insert(
            token,
            ResourceRecord {
                kind,
                label: label.into(),
            },
        );
        g.stats.acquired += 1;
        token
    }

    /// Returns `false` when the token was already released.
    pub fn release(&self, token: ResourceToken) -> bool {
        let mut g = self.inner.lock();
        match g.live.remove(&token) {
            Some(_) => {
                g.stats.released += 1;
                true
            }
            None => {
                g.stats.double_released += 1;
                warn!(target: "resources", "resource.release twice token={}", token.0);
                false
            }
        }
    }

    #[inline]
    pub fn is_live(&self, token: ResourceToken) -> bool {
        self.inner.lock().live.contains_key(&token)
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    pub fn live(&self) -> Vec<ResourceRecord> {
        self.inner.lock().live.values().cloned().collect()
    }

    #[inline]
    pub fn stats(&self) -> LedgerStats {
        self.inner.lock().stats
    }
}
