use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{AssetError, AssetResult};

/// Read-only provider of raw asset bytes addressed by logical path.
pub trait AssetSource: Send + Sync + 'static {
    fn exists(&self, logical: &Path) -> bool;
    fn read(&self, logical: &Path) -> AssetResult<Vec<u8>>;

    /// Short name for diagnostics.
    fn describe(&self) -> String;
}

/// Module bundle unpacked on disk (the `ref` directory).
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    #[inline]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, logical: &Path) -> Option<PathBuf> {
        if !is_contained(logical) {
            return None;
        }
        Some(self.root.join(logical))
    }
}

impl AssetSource for FileSystemSource {
    fn exists(&self, logical: &Path) -> bool {
        self.resolve(logical).is_some_and(|p| p.is_file())
    }

    fn read(&self, logical: &Path) -> AssetResult<Vec<u8>> {
        let path = self
            .resolve(logical)
            .ok_or_else(|| AssetError::InvalidPath(logical.to_string_lossy().into_owned()))?;
        std::fs::read(&path).map_err(|source| AssetError::Io { path, source })
    }

    fn describe(&self) -> String {
        format!("filesystem:{}", self.root.display())
    }
}

/// In-memory bundle, handy for hosts that ship content embedded.
#[derive(Default)]
pub struct MemorySource {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemorySource {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, logical: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.write().insert(logical.into(), bytes.into());
    }
}

impl AssetSource for MemorySource {
    fn exists(&self, logical: &Path) -> bool {
        self.files.read().contains_key(logical)
    }

    fn read(&self, logical: &Path) -> AssetResult<Vec<u8>> {
        self.files
            .read()
            .get(logical)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(logical.to_path_buf()))
    }

    fn describe(&self) -> String {
        format!("memory:{} file(s)", self.files.read().len())
    }
}

/// Relative path that cannot escape its root.
fn is_contained(logical: &Path) -> bool {
    !logical.as_os_str().is_empty()
        && logical
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
