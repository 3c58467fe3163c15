pub mod cache;
pub mod contents;
pub mod directories;
pub mod error;
pub mod id;
pub mod ledger;
pub mod source;
pub mod texture;

pub use cache::DatAssetCache;
pub use contents::ContentsManager;
pub use directories::DirectoriesManager;
pub use error::{AssetError, AssetResult};
pub use id::AssetId;
pub use ledger::{LedgerStats, ResourceLedger, ResourceRecord, ResourceToken};
pub use source::{AssetSource, FileSystemSource, MemorySource};
pub use texture::{OwnedTexture, SharedTexture, Texture, TextureHandle};
