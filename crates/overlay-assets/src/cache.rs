use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AssetError, AssetResult};
use crate::id::AssetId;
use crate::texture::{SharedTexture, Texture, TextureHandle};

/// Host-wide texture cache keyed by numeric game asset id.
///
/// Textures returned from here are shared with the host and every other
/// module. Callers must not release them; dropping a [`SharedTexture`] only
/// drops a reference.
#[derive(Default)]
pub struct DatAssetCache {
    textures: RwLock<HashMap<u32, TextureHandle>>,
}

impl DatAssetCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, asset_id: u32, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        debug!(target: "assets::dat", "dat.insert asset_id={} bytes={}", asset_id, bytes.len());
        let handle = TextureHandle::new(Texture {
            id: AssetId::dat(asset_id),
            name: format!("{asset_id}.png"),
            bytes: Arc::from(bytes),
        });
        self.textures.write().insert(asset_id, handle);
    }

    /// Look up a cached texture.
    pub fn texture(&self, asset_id: u32) -> Option<SharedTexture> {
        let found = self.textures.read().get(&asset_id).cloned();
        if found.is_none() {
            warn!(target: "assets::dat", "dat.miss asset_id={}", asset_id);
        }
        found.map(SharedTexture::new)
    }

    #[inline]
    pub fn contains(&self, asset_id: u32) -> bool {
        self.textures.read().contains_key(&asset_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.read().is_empty()
    }

    /// Seed the cache from `<asset id>.png` files in `dir`.
    ///
    /// Files whose stem is not a number are skipped. Returns the number of
    /// textures added.
    pub fn preload_dir(&self, dir: &Path) -> AssetResult<usize> {
        let rd = std::fs::read_dir(dir).map_err(|source| AssetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut added = 0usize;
        for ent in rd {
            let ent = ent.map_err(|source| AssetError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = ent.path();
            let Some(asset_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
            self.insert(asset_id, bytes);
            added += 1;
        }

        info!(
            target: "assets::dat",
            "dat.preload dir='{}' added={}",
            dir.display(),
            added
        );
        Ok(added)
    }
}
