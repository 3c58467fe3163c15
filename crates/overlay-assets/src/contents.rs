use log::{debug, info, warn};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AssetError, AssetResult};
use crate::id::AssetId;
use crate::ledger::ResourceLedger;
use crate::source::AssetSource;
use crate::texture::{OwnedTexture, Texture, TextureHandle};

/// Access to the module's private content bundle.
///
/// Everything handed out here is owned by the caller.
pub struct ContentsManager {
    sources: RwLock<Vec<Arc<dyn AssetSource>>>,
    ledger: Arc<ResourceLedger>,
}

impl ContentsManager {
    #[inline]
    pub fn new(ledger: Arc<ResourceLedger>) -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
            ledger,
        }
    }

    pub fn add_source(&self, source: Arc<dyn AssetSource>) {
        info!(target: "assets", "contents.source.register '{}'", source.describe());
        self.sources.write().push(source);
    }

    /// Raw bytes of a bundle file.
    pub fn read(&self, logical: impl AsRef<Path>) -> AssetResult<Vec<u8>> {
        let logical = logical.as_ref();
        let t0 = Instant::now();

        let sources = self.sources.read();
        if sources.is_empty() {
            return Err(AssetError::NoSources);
        }

        let source = sources
            .iter()
            .find(|s| s.exists(logical))
            .ok_or_else(|| AssetError::NotFound(logical.to_path_buf()))?;
        let bytes = source.read(logical)?;

        debug!(
            target: "assets::io",
            "io.read path='{}' source='{}' bytes={} dt_us={}",
            logical.display(),
            source.describe(),
            bytes.len(),
            t0.elapsed().as_micros()
        );
        Ok(bytes)
    }

    /// Load a texture from the bundle. The caller must release it.
    pub fn texture(&self, logical: impl AsRef<Path>) -> AssetResult<OwnedTexture> {
        let logical = logical.as_ref();
        let bytes = match self.read(logical) {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    target: "assets",
                    "texture.load failed path='{}' error='{}'",
                    logical.display(),
                    e
                );
                return Err(e);
            }
        };

        let id = AssetId::from_path(logical);
        info!(
            target: "assets",
            "texture.ready id={} path='{}' bytes={}",
            id,
            logical.display(),
            bytes.len()
        );

        let handle = TextureHandle::new(Texture {
            id,
            name: logical.to_string_lossy().replace('\\', "/"),
            bytes: Arc::from(bytes),
        });
        Ok(OwnedTexture::new(handle, self.ledger.clone()))
    }

    #[inline]
    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn contents() -> ContentsManager {
        let src = MemorySource::new();
        src.insert("155985.png", vec![1u8, 2, 3]);
        src.insert("test/603447.png", vec![4u8]);

        let c = ContentsManager::new(Arc::new(ResourceLedger::new()));
        c.add_source(Arc::new(src));
        c
    }

    #[test]
    fn owned_texture_is_released_exactly_once_on_drop() {
        let c = contents();
        let tex = c.texture("155985.png").unwrap();
        assert_eq!(tex.handle().byte_len(), 3);
        assert_eq!(c.ledger().live_count(), 1);

        let view = tex.handle();
        tex.dispose();

        assert_eq!(c.ledger().live_count(), 0);
        assert_eq!(c.ledger().stats().double_released, 0);
        // Views stay readable; they never release anything.
        assert_eq!(view.name(), "155985.png");
    }

    #[test]
    fn missing_texture_is_an_error() {
        let c = contents();
        assert!(matches!(
            c.texture("nope.png"),
            Err(AssetError::NotFound(_))
        ));
        assert_eq!(c.ledger().stats().acquired, 0);
    }

    #[test]
    fn no_sources_is_reported() {
        let c = ContentsManager::new(Arc::new(ResourceLedger::new()));
        assert!(matches!(c.read("a.png"), Err(AssetError::NoSources)));
    }
}
