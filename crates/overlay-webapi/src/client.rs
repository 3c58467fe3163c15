use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};
use crate::model::{Character, Dungeon};
use crate::permission::Subtoken;

/// Transport to the remote account API.
#[async_trait]
pub trait WebApiClient: Send + Sync + 'static {
    /// Public endpoint, no credentials needed.
    async fn dungeons(&self) -> ApiResult<Vec<Dungeon>>;

    /// Authenticated endpoint.
    async fn characters(&self, token: &Subtoken) -> ApiResult<Vec<Character>>;
}

/// Client answering from JSON files (`dungeons.json`, `characters.json`).
///
/// A missing file behaves like an unreachable endpoint.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    root: PathBuf,
}

impl FixtureClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read<T: DeserializeOwned>(&self, endpoint: &'static str) -> ApiResult<T> {
        let path = self.root.join(format!("{endpoint}.json"));
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::Transport {
                    endpoint,
                    reason: format!("no fixture at '{}'", path.display()),
                })
            }
            Err(source) => return Err(ApiError::Io { path, source }),
        };

        debug!(target: "webapi", "fixture.read endpoint='{}' bytes={}", endpoint, text.len());
        serde_json::from_str(&text).map_err(|source| ApiError::Malformed { endpoint, source })
    }
}

#[async_trait]
impl WebApiClient for FixtureClient {
    async fn dungeons(&self) -> ApiResult<Vec<Dungeon>> {
        self.read("dungeons")
    }

    async fn characters(&self, _token: &Subtoken) -> ApiResult<Vec<Character>> {
        self.read("characters")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::TokenPermission;

    #[tokio::test]
    async fn reads_fixtures_and_reports_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dungeons.json"),
            r#"[{"id":"ascalonian_catacombs","paths":[{"id":"hodgins","type":"Story"}]}]"#,
        )
        .unwrap();

        let client = FixtureClient::new(dir.path());
        let dungeons = client.dungeons().await.unwrap();
        assert_eq!(dungeons[0].paths[0].kind, "Story");

        let token = Subtoken::new("t", [TokenPermission::Account]);
        let err = client.characters(&token).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn malformed_fixture_is_not_transient() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dungeons.json"), "{").unwrap();

        let err = FixtureClient::new(dir.path()).dungeons().await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed { endpoint: "dungeons", .. }));
        assert!(!err.is_transient());
    }
}
