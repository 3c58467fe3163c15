use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::WebApiClient;
use crate::error::{ApiError, ApiResult};
use crate::model::{Character, Dungeon};
use crate::permission::{Subtoken, TokenPermission};

/// Gate between a module and the API client.
///
/// The host may replace or clear the subtoken at any time, so callers check
/// [`ApiManager::has_permissions`] right before each authenticated request
/// instead of caching the answer.
#[derive(Clone)]
pub struct ApiManager {
    client: Arc<dyn WebApiClient>,
    subtoken: Arc<RwLock<Option<Subtoken>>>,
}

impl ApiManager {
    pub fn new(client: Arc<dyn WebApiClient>) -> Self {
        Self {
            client,
            subtoken: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set_subtoken(&self, token: Subtoken) {
        info!(
            target: "webapi",
            "subtoken.updated permissions={:?}",
            token.permissions()
        );
        *self.subtoken.write() = Some(token);
    }

    pub fn clear_subtoken(&self) {
        if self.subtoken.write().take().is_some() {
            info!(target: "webapi", "subtoken.cleared");
        }
    }

    #[inline]
    pub fn has_subtoken(&self) -> bool {
        self.subtoken.read().is_some()
    }

    /// `true` if a subtoken is present and grants all of `required`.
    pub fn has_permissions(&self, required: &[TokenPermission]) -> bool {
        self.subtoken
            .read()
            .as_ref()
            .is_some_and(|t| t.grants(required))
    }

    pub async fn dungeons(&self) -> ApiResult<Vec<Dungeon>> {
        let out = self.client.dungeons().await?;
        debug!(target: "webapi", "dungeons.fetched count={}", out.len());
        Ok(out)
    }

    /// Fails with [`ApiError::Unauthorized`] without touching the network
    /// when the current subtoken lacks the characters scope.
    pub async fn characters(&self) -> ApiResult<Vec<Character>> {
        let token = self
            .subtoken
            .read()
            .clone()
            .filter(|t| t.grants(&[TokenPermission::Characters]))
            .ok_or(ApiError::Unauthorized)?;

        let out = self.client.characters(&token).await?;
        debug!(target: "webapi", "characters.fetched count={}", out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        last_token: parking_lot::Mutex<Option<String>>,
    }

    #[async_trait]
    impl WebApiClient for Counting {
        async fn dungeons(&self) -> ApiResult<Vec<Dungeon>> {
            Ok(Vec::new())
        }

        async fn characters(&self, token: &Subtoken) -> ApiResult<Vec<Character>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock() = Some(token.token().to_string());
            Ok(vec![Character { name: "Zojja".into() }])
        }
    }

    const NEEDED: [TokenPermission; 2] = [TokenPermission::Account, TokenPermission::Characters];

    #[test]
    fn permissions_follow_the_current_subtoken() {
        let api = ApiManager::new(Arc::new(Counting::default()));
        assert!(!api.has_permissions(&NEEDED));

        api.set_subtoken(Subtoken::new("a", NEEDED));
        assert!(api.has_permissions(&NEEDED));

        api.set_subtoken(Subtoken::new("b", [TokenPermission::Account]));
        assert!(!api.has_permissions(&NEEDED));

        api.clear_subtoken();
        assert!(!api.has_subtoken());
    }

    #[tokio::test]
    async fn characters_without_token_never_reach_the_client() {
        let client = Arc::new(Counting::default());
        let api = ApiManager::new(client.clone());

        assert!(matches!(api.characters().await, Err(ApiError::Unauthorized)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);

        api.set_subtoken(Subtoken::new("a", NEEDED));
        assert_eq!(api.characters().await.unwrap().len(), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn characters_are_requested_with_the_latest_subtoken() {
        let client = Arc::new(Counting::default());
        let api = ApiManager::new(client.clone());

        api.set_subtoken(Subtoken::new("first", NEEDED));
        api.characters().await.unwrap();
        assert_eq!(client.last_token.lock().as_deref(), Some("first"));

        api.set_subtoken(Subtoken::new("second", NEEDED));
        api.characters().await.unwrap();
        assert_eq!(client.last_token.lock().as_deref(), Some("second"));
    }
}
