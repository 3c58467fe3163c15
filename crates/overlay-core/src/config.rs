use overlay_webapi::TokenPermission;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ModuleError, ModuleResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Module bundle (owned textures).
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: PathBuf,

    /// Root of the per-module data directories.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory of `<asset id>.png` files preloaded into the shared cache.
    #[serde(default)]
    pub dat_cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub registered_directories: Vec<String>,

    /// JSON fixtures answering the remote API.
    #[serde(default = "default_api_fixture_dir")]
    pub api_fixture_dir: PathBuf,

    /// Grant a subtoken with these permissions after `subtoken_after_ms`.
    #[serde(default)]
    pub subtoken_permissions: Vec<TokenPermission>,

    #[serde(default = "default_subtoken_after_ms")]
    pub subtoken_after_ms: u64,

    /// Stop after this long. Runs until interrupted when unset.
    #[serde(default)]
    pub run_for_ms: Option<u64>,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,

    /// Module specific settings, parsed by the module itself.
    #[serde(default = "default_module_data")]
    pub data: toml::Value,
}

fn default_tick_ms() -> u64 {
    16
}
fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}
fn default_bundle_dir() -> PathBuf {
    PathBuf::from("ref")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_api_fixture_dir() -> PathBuf {
    PathBuf::from("fixtures")
}
fn default_subtoken_after_ms() -> u64 {
    10_000
}
fn default_module_data() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            settings_path: default_settings_path(),
            bundle_dir: default_bundle_dir(),
            data_dir: default_data_dir(),
            dat_cache_dir: None,
            registered_directories: Vec::new(),
            api_fixture_dir: default_api_fixture_dir(),
            subtoken_permissions: Vec::new(),
            subtoken_after_ms: default_subtoken_after_ms(),
            run_for_ms: None,
            modules: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> ModuleResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .map_err(|e| ModuleError::Config(format!("parse {}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ModuleError::Config(format!("read {}: {}", path.display(), e))),
        }
    }

    #[inline]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Entry for `id`, or an empty one.
    pub fn module(&self, id: &str) -> ModuleConfig {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .unwrap_or_else(|| ModuleConfig::empty(id))
    }
}

impl ModuleConfig {
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: default_module_data(),
        }
    }

    /// Deserialize `data` into the module's own config type.
    pub fn parse<T: DeserializeOwned>(&self) -> ModuleResult<T> {
        self.data
            .clone()
            .try_into()
            .map_err(|e| ModuleError::Config(format!("module '{}': {}", self.id, e)))
    }
}
