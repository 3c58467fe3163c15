use std::fmt;
use std::sync::Arc;

use crate::id::AssetId;
use crate::ledger::{ResourceLedger, ResourceToken};

/// Encoded texture payload. Decoding is left to the renderer.
pub struct Texture {
    pub id: AssetId,
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Non-owning reference used by controls that display a texture.
#[derive(Clone)]
pub struct TextureHandle(Arc<Texture>);

impl TextureHandle {
    #[inline]
    pub(crate) fn new(texture: Texture) -> Self {
        Self(Arc::new(texture))
    }

    #[inline]
    pub fn id(&self) -> AssetId {
        self.0.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.0.bytes.len()
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("bytes", &self.0.bytes.len())
            .finish()
    }
}

/// Texture loaded from the module's own bundle.
///
/// The module owns it and releases it by dropping it (or calling
/// [`OwnedTexture::dispose`]). Not `Clone`: there is exactly one release.
pub struct OwnedTexture {
    handle: TextureHandle,
    ledger: Arc<ResourceLedger>,
    token: ResourceToken,
}

impl OwnedTexture {
    pub(crate) fn new(handle: TextureHandle, ledger: Arc<ResourceLedger>) -> Self {
        let token = ledger.acquire("texture", handle.name());
        Self {
            handle,
            ledger,
            token,
        }
    }

    #[inline]
    pub fn handle(&self) -> TextureHandle {
        self.handle.clone()
    }

    #[inline]
    pub fn dispose(self) {}
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        self.ledger.release(self.token);
    }
}

impl fmt::Debug for OwnedTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedTexture").field(&self.handle).finish()
    }
}

/// Texture owned by the host cache and shared between modules.
///
/// Dropping it only drops this reference; the cached texture stays.
#[derive(Clone, Debug)]
pub struct SharedTexture(TextureHandle);

impl SharedTexture {
    #[inline]
    pub(crate) fn new(handle: TextureHandle) -> Self {
        Self(handle)
    }

    #[inline]
    pub fn handle(&self) -> TextureHandle {
        self.0.clone()
    }
}
