use std::path::PathBuf;
use thiserror::Error;

pub type AssetResult<T> = Result<T, AssetError>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no asset sources registered")]
    NoSources,

    #[error("asset not found in any source: '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("asset path rejected: '{0}'")]
    InvalidPath(String),

    #[error("io '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory '{0}' is not registered")]
    UnregisteredDirectory(String),
}
