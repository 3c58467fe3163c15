use std::path::PathBuf;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no subtoken with the required permissions is available")]
    Unauthorized,

    #[error("endpoint '{endpoint}' is unavailable: {reason}")]
    Transport { endpoint: &'static str, reason: String },

    #[error("endpoint '{endpoint}' returned a malformed response: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Errors that a later retry may resolve.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
