use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};

/// Data directories a module registered in its manifest.
///
/// Each name maps to a directory below the host data root, created on demand.
pub struct DirectoriesManager {
    root: PathBuf,
    registered: Vec<String>,
}

impl DirectoriesManager {
    pub fn new(root: impl Into<PathBuf>, registered: Vec<String>) -> Self {
        Self {
            root: root.into(),
            registered,
        }
    }

    #[inline]
    pub fn registered_directories(&self) -> &[String] {
        &self.registered
    }

    /// Full path of a registered directory. Creates it if missing.
    pub fn full_directory_path(&self, name: &str) -> AssetResult<PathBuf> {
        if !self.registered.iter().any(|d| d == name) {
            return Err(AssetError::UnregisteredDirectory(name.to_string()));
        }

        let path = self.root.join(name);
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
            info!(target: "assets::dirs", "dirs.create path='{}'", path.display());
        }
        Ok(path)
    }
}

/// Count regular files below `dir`, recursively.
pub fn count_files(dir: &Path) -> AssetResult<usize> {
    let mut count = 0usize;
    let mut stack = vec![dir.to_path_buf()];

    while let Some(d) = stack.pop() {
        let rd = fs::read_dir(&d).map_err(|source| AssetError::Io {
            path: d.clone(),
            source,
        })?;
        for ent in rd {
            let ent = ent.map_err(|source| AssetError::Io {
                path: d.clone(),
                source,
            })?;
            let p = ent.path();
            if p.is_dir() {
                stack.push(p);
            } else if p.is_file() {
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_directories_are_created_and_counted() {
        let root = tempfile::tempdir().unwrap();
        let dirs = DirectoriesManager::new(root.path(), vec!["example".into()]);

        let p = dirs.full_directory_path("example").unwrap();
        assert!(p.is_dir());

        fs::create_dir_all(p.join("nested")).unwrap();
        fs::write(p.join("a.txt"), b"a").unwrap();
        fs::write(p.join("nested/b.txt"), b"b").unwrap();
        assert_eq!(count_files(&p).unwrap(), 2);

        assert!(matches!(
            dirs.full_directory_path("other"),
            Err(AssetError::UnregisteredDirectory(_))
        ));
    }
}
