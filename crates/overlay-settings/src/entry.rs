use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{SettingsError, SettingsResult};
use crate::subscription::Subscription;

/// Anything that can be stored in a setting.
pub trait SettingValue:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> SettingValue for T where
    T: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Payload of a change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChanged<T> {
    pub previous: T,
    pub new: T,
}

pub(crate) type TextFn = Box<dyn Fn() -> String + Send + Sync>;
type Callback<T> = Arc<dyn Fn(&ValueChanged<T>) + Send + Sync>;
type Constraint<T> = Box<dyn Fn(T) -> T + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    items: Vec<(u64, Callback<T>)>,
}

pub(crate) struct EntryInner<T: SettingValue> {
    key: String,
    value: RwLock<T>,
    display_name: Option<TextFn>,
    tooltip: Option<TextFn>,
    range: RwLock<Option<(T, T)>>,
    constraint: RwLock<Option<Constraint<T>>>,
    listeners: Mutex<Listeners<T>>,
}

impl<T: SettingValue> EntryInner<T> {
    pub(crate) fn new(
        key: String,
        initial: T,
        display_name: Option<TextFn>,
        tooltip: Option<TextFn>,
    ) -> Self {
        Self {
            key,
            value: RwLock::new(initial),
            display_name,
            tooltip,
            range: RwLock::new(None),
            constraint: RwLock::new(None),
            listeners: Mutex::new(Listeners {
                next_id: 0,
                items: Vec::new(),
            }),
        }
    }
}

/// Type-erased view used by collections for persistence and diagnostics.
pub(crate) trait ErasedEntry: Send + Sync {
    fn key(&self) -> &str;
    fn type_name(&self) -> &'static str;
    fn to_json(&self) -> SettingsResult<serde_json::Value>;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: SettingValue> ErasedEntry for EntryInner<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_json(&self) -> SettingsResult<serde_json::Value> {
        Ok(serde_json::to_value(&*self.value.read())?)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Handle to one persisted, typed setting.
///
/// Handles are cheap to clone and all clones observe the same value. Keep
/// the handle returned by `define_setting` instead of looking the setting up
/// by key on every access.
pub struct SettingEntry<T: SettingValue> {
    inner: Arc<EntryInner<T>>,
}

impl<T: SettingValue> Clone for SettingEntry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: SettingValue> fmt::Debug for SettingEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingEntry")
            .field("key", &self.inner.key)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

impl<T: SettingValue> SettingEntry<T> {
    #[inline]
    pub(crate) fn from_inner(inner: Arc<EntryInner<T>>) -> Self {
        Self { inner }
    }

    #[inline]
    pub(crate) fn erased(&self) -> Arc<dyn ErasedEntry> {
        self.inner.clone()
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    #[inline]
    pub fn value(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Display name shown next to the setting; falls back to the key.
    pub fn display_name(&self) -> String {
        match &self.inner.display_name {
            Some(f) => f(),
            None => self.inner.key.clone(),
        }
    }

    pub fn tooltip(&self) -> Option<String> {
        self.inner.tooltip.as_ref().map(|f| f())
    }

    #[inline]
    pub fn range(&self) -> Option<(T, T)> {
        self.inner.range.read().clone()
    }

    /// Store a new value.
    ///
    /// Values outside a declared range are clamped to the nearest bound.
    /// Subscribers are notified only when the stored value actually changes.
    pub fn set_value(&self, value: T) {
        let value = self.constrain(value);

        let previous = {
            let mut cur = self.inner.value.write();
            if *cur == value {
                return;
            }
            std::mem::replace(&mut *cur, value.clone())
        };

        debug!(
            target: "settings",
            "setting.changed key='{}' previous={:?} new={:?}",
            self.inner.key,
            previous,
            value
        );

        // Snapshot so callbacks may (un)subscribe without deadlocking.
        let callbacks: Vec<Callback<T>> = self
            .inner
            .listeners
            .lock()
            .items
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();

        let ev = ValueChanged {
            previous,
            new: value,
        };
        for cb in callbacks {
            cb(&ev);
        }
    }

    /// Register a change callback.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ValueChanged<T>) + Send + Sync + 'static,
    {
        let id = {
            let mut l = self.inner.listeners.lock();
            l.next_id += 1;
            let id = l.next_id;
            l.items.push((id, Arc::new(callback)));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().items.retain(|(i, _)| *i != id);
            }
        })
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().items.len()
    }

    fn constrain(&self, value: T) -> T {
        match &*self.inner.constraint.read() {
            Some(f) => f(value),
            None => value,
        }
    }
}

impl<T: SettingValue + PartialOrd> SettingEntry<T> {
    /// Declare an inclusive `[min, max]` range.
    ///
    /// The current value is clamped into the new range immediately.
    pub fn set_range(&self, min: T, max: T) -> SettingsResult<()> {
        if min > max {
            return Err(SettingsError::InvalidRange {
                key: self.inner.key.clone(),
            });
        }

        let (lo, hi) = (min.clone(), max.clone());
        *self.inner.constraint.write() = Some(Box::new(move |v: T| {
            if v < lo {
                lo.clone()
            } else if v > hi {
                hi.clone()
            } else {
                v
            }
        }));
        *self.inner.range.write() = Some((min, max));

        let current = self.value();
        self.set_value(current);
        Ok(())
    }
}
