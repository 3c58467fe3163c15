use log::info;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collection::SettingCollection;
use crate::error::{SettingsError, SettingsResult};

/// Process-wide settings storage.
///
/// Each module gets its own root collection keyed by namespace. Values are
/// persisted as one JSON document.
pub struct SettingsStore {
    path: Option<PathBuf>,
    document: Mutex<Map<String, Value>>,
    roots: Mutex<BTreeMap<String, SettingCollection>>,
}

impl SettingsStore {
    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            document: Mutex::new(Map::new()),
            roots: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open a store backed by `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();

        let document = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Map::new(),
            Ok(s) => {
                let v: Value = serde_json::from_str(&s).map_err(|source| SettingsError::Parse {
                    path: path.clone(),
                    source,
                })?;
                v.as_object().cloned().unwrap_or_default()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        info!(
            target: "settings",
            "store.open path='{}' namespaces={}",
            path.display(),
            document.len()
        );

        Ok(Self {
            path: Some(path),
            document: Mutex::new(document),
            roots: Mutex::new(BTreeMap::new()),
        })
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Root collection of a module. Created on first use.
    pub fn module_settings(&self, namespace: &str) -> SettingCollection {
        let mut roots = self.roots.lock();
        if let Some(c) = roots.get(namespace) {
            return c.clone();
        }

        let persisted = self
            .document
            .lock()
            .get(namespace)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let c = SettingCollection::with_persisted(namespace, true, persisted);
        roots.insert(namespace.to_string(), c.clone());
        c
    }

    /// Current values of every namespace, including ones not opened this run.
    pub fn snapshot(&self) -> SettingsResult<Value> {
        let mut doc = self.document.lock().clone();
        for (ns, c) in self.roots.lock().iter() {
            doc.insert(ns.clone(), c.to_json()?);
        }
        Ok(Value::Object(doc))
    }

    /// Write all values to disk. No-op for in-memory stores.
    pub fn save(&self) -> SettingsResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let snapshot = self.snapshot()?;
        let text = serde_json::to_string_pretty(&snapshot)?;

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(path, text).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;

        if let Value::Object(doc) = snapshot {
            *self.document.lock() = doc;
        }

        info!(target: "settings", "store.save path='{}'", path.display());
        Ok(())
    }
}
