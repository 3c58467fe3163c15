use std::path::PathBuf;
use thiserror::Error;

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting '{key}' is not defined in collection '{collection}'")]
    NotFound { collection: String, key: String },

    #[error("setting '{key}' holds {actual}, requested as {requested}")]
    TypeMismatch {
        key: String,
        requested: &'static str,
        actual: &'static str,
    },

    #[error("setting '{key}' got an empty range (min > max)")]
    InvalidRange { key: String },

    #[error("settings io '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings encode: {0}")]
    Encode(#[from] serde_json::Error),
}
