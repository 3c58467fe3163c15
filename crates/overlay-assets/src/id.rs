use std::fmt;
use std::path::Path;

/// Stable id of a bundle asset, derived from its normalized logical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u128);

impl AssetId {
    pub fn from_path(logical: &Path) -> Self {
        let norm = logical.to_string_lossy().replace('\\', "/").to_ascii_lowercase();
        let hash = blake3::hash(norm.as_bytes());
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&hash.as_bytes()[..16]);
        Self(u128::from_le_bytes(raw))
    }

    /// Id of a host cache asset (numeric dat id).
    #[inline]
    pub const fn dat(asset_id: u32) -> Self {
        Self(asset_id as u128)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
