use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::entry::{EntryInner, ErasedEntry, SettingEntry, SettingValue, TextFn};
use crate::error::{SettingsError, SettingsResult};

const ENTRIES: &str = "entries";
const COLLECTIONS: &str = "collections";

struct CollectionInner {
    name: String,
    render_in_ui: bool,
    entries: RwLock<Vec<Arc<dyn ErasedEntry>>>,
    children: RwLock<Vec<SettingCollection>>,
    /// Values read from disk, keyed like `entries`/`collections`.
    persisted: RwLock<Map<String, Value>>,
}

/// Named group of settings.
///
/// Collections nest: a module's root collection is shown in the settings UI,
/// sub-collections created with [`SettingCollection::add_sub_collection`] are
/// hidden and hold internal state such as window coordinates.
#[derive(Clone)]
pub struct SettingCollection {
    inner: Arc<CollectionInner>,
}

impl SettingCollection {
    pub(crate) fn with_persisted(
        name: impl Into<String>,
        render_in_ui: bool,
        persisted: Map<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                name: name.into(),
                render_in_ui,
                entries: RwLock::new(Vec::new()),
                children: RwLock::new(Vec::new()),
                persisted: RwLock::new(persisted),
            }),
        }
    }

    /// Detached collection without any persisted state.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_persisted(name, true, Map::new())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn render_in_ui(&self) -> bool {
        self.inner.render_in_ui
    }

    /// Define a setting shown in the UI with a display name and tooltip.
    ///
    /// Redefining an existing key returns the already registered entry, so a
    /// module may define its settings on every load.
    pub fn define_setting<T, N, D>(
        &self,
        key: &str,
        default: T,
        display_name: N,
        tooltip: D,
    ) -> SettingsResult<SettingEntry<T>>
    where
        T: SettingValue,
        N: Fn() -> String + Send + Sync + 'static,
        D: Fn() -> String + Send + Sync + 'static,
    {
        self.define_inner(key, default, Some(Box::new(display_name)), Some(Box::new(tooltip)))
    }

    /// Define a setting without UI metadata (internal state).
    #[inline]
    pub fn define_hidden<T: SettingValue>(
        &self,
        key: &str,
        default: T,
    ) -> SettingsResult<SettingEntry<T>> {
        self.define_inner(key, default, None, None)
    }

    fn define_inner<T: SettingValue>(
        &self,
        key: &str,
        default: T,
        display_name: Option<TextFn>,
        tooltip: Option<TextFn>,
    ) -> SettingsResult<SettingEntry<T>> {
        let mut entries = self.inner.entries.write();

        if let Some(existing) = entries.iter().find(|e| e.key() == key) {
            return downcast(existing.clone());
        }

        let initial = match self.persisted_value(key) {
            Some(raw) => match serde_json::from_value::<T>(raw) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        target: "settings",
                        "setting.restore failed collection='{}' key='{}' error='{}', using default",
                        self.inner.name,
                        key,
                        e
                    );
                    default
                }
            },
            None => default,
        };

        debug!(
            target: "settings",
            "setting.define collection='{}' key='{}' value={:?}",
            self.inner.name,
            key,
            initial
        );

        let entry = SettingEntry::from_inner(Arc::new(EntryInner::new(
            key.to_string(),
            initial,
            display_name,
            tooltip,
        )));
        entries.push(entry.erased());
        Ok(entry)
    }

    /// Look a setting up by key.
    ///
    /// Prefer keeping the handle returned at definition time; this exists for
    /// code that has no access to it.
    pub fn get<T: SettingValue>(&self, key: &str) -> SettingsResult<SettingEntry<T>> {
        let entries = self.inner.entries.read();
        let found = entries
            .iter()
            .find(|e| e.key() == key)
            .cloned()
            .ok_or_else(|| SettingsError::NotFound {
                collection: self.inner.name.clone(),
                key: key.to_string(),
            })?;
        downcast(found)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.read().iter().any(|e| e.key() == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner
            .entries
            .read()
            .iter()
            .map(|e| e.key().to_string())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Add (or fetch) a nested collection that is not rendered in the UI.
    pub fn add_sub_collection(&self, name: &str) -> SettingCollection {
        let mut children = self.inner.children.write();
        if let Some(c) = children.iter().find(|c| c.name() == name) {
            return c.clone();
        }

        let persisted = self
            .inner
            .persisted
            .read()
            .get(COLLECTIONS)
            .and_then(|v| v.get(name))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let child = SettingCollection::with_persisted(name, false, persisted);
        children.push(child.clone());
        child
    }

    pub fn sub_collection(&self, name: &str) -> Option<SettingCollection> {
        self.inner
            .children
            .read()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Serialize current values.
    ///
    /// Persisted values of settings not defined in this run are kept.
    pub fn to_json(&self) -> SettingsResult<Value> {
        let persisted = self.inner.persisted.read().clone();

        let mut entries = persisted
            .get(ENTRIES)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for e in self.inner.entries.read().iter() {
            entries.insert(e.key().to_string(), e.to_json()?);
        }

        let mut collections = persisted
            .get(COLLECTIONS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for c in self.inner.children.read().iter() {
            collections.insert(c.name().to_string(), c.to_json()?);
        }

        let mut out = Map::new();
        out.insert(ENTRIES.into(), Value::Object(entries));
        out.insert(COLLECTIONS.into(), Value::Object(collections));
        Ok(Value::Object(out))
    }

    fn persisted_value(&self, key: &str) -> Option<Value> {
        self.inner
            .persisted
            .read()
            .get(ENTRIES)
            .and_then(|v| v.get(key))
            .cloned()
    }
}

impl std::fmt::Debug for SettingCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingCollection")
            .field("name", &self.inner.name)
            .field("keys", &self.keys())
            .finish()
    }
}

fn downcast<T: SettingValue>(entry: Arc<dyn ErasedEntry>) -> SettingsResult<SettingEntry<T>> {
    let key = entry.key().to_string();
    let actual = entry.type_name();
    entry
        .into_any()
        .downcast::<EntryInner<T>>()
        .map(SettingEntry::from_inner)
        .map_err(|_| SettingsError::TypeMismatch {
            key,
            requested: std::any::type_name::<T>(),
            actual,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    enum Mode {
        Light,
        Dark,
    }

    #[test]
    fn redefine_returns_same_entry() {
        let c = SettingCollection::new("module");
        let a = c
            .define_setting("bool example", true, || "b".into(), || "t".into())
            .unwrap();
        a.set_value(false);

        let b = c
            .define_setting("bool example", true, || "b".into(), || "t".into())
            .unwrap();
        assert!(!b.value());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn lookup_by_key_reports_missing_and_mistyped_settings() {
        let c = SettingCollection::new("module");
        c.define_setting("ExampleSetting", "x".to_string(), || "n".into(), || "t".into())
            .unwrap();

        assert!(c.get::<String>("ExampleSetting").is_ok());
        assert!(matches!(
            c.get::<String>("Examplesetting"),
            Err(SettingsError::NotFound { .. })
        ));
        assert!(matches!(
            c.get::<i32>("ExampleSetting"),
            Err(SettingsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn sub_collections_are_hidden_and_unique() {
        let c = SettingCollection::new("module");
        let hidden = c.add_sub_collection("internal settings (not visible in UI)");
        let again = c.add_sub_collection("internal settings (not visible in UI)");

        hidden.define_hidden("example window x position", 50).unwrap();
        assert!(!hidden.render_in_ui());
        assert!(again.contains("example window x position"));
    }

    #[test]
    fn values_restore_from_persisted_json() {
        let c = SettingCollection::new("module");
        c.define_setting("enum example", Mode::Light, || "m".into(), || "t".into())
            .unwrap()
            .set_value(Mode::Dark);
        c.add_sub_collection("hidden")
            .define_hidden("x", 7)
            .unwrap()
            .set_value(9);

        let json = c.to_json().unwrap();
        let restored =
            SettingCollection::with_persisted("module", true, json.as_object().unwrap().clone());

        let mode = restored
            .define_setting("enum example", Mode::Light, || "m".into(), || "t".into())
            .unwrap();
        assert_eq!(mode.value(), Mode::Dark);
        assert_eq!(
            restored
                .add_sub_collection("hidden")
                .define_hidden("x", 7)
                .unwrap()
                .value(),
            9
        );
    }

    #[test]
    fn unreadable_persisted_value_falls_back_to_default() {
        let mut entries = Map::new();
        entries.insert("int example".into(), Value::String("not a number".into()));
        let mut doc = Map::new();
        doc.insert(ENTRIES.into(), Value::Object(entries));

        let c = SettingCollection::with_persisted("module", true, doc);
        let e = c.define_hidden("int example", 20).unwrap();
        assert_eq!(e.value(), 20);
    }
}
