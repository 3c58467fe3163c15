use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Scope granted to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPermission {
    /// Every key carries it, so it doubles as "a token exists at all".
    Account,
    Builds,
    Characters,
    Guilds,
    Inventories,
    Progression,
    Pvp,
    Tradingpost,
    Unlocks,
    Wallet,
}

/// Restricted token the host hands to modules instead of the user's key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtoken {
    token: String,
    permissions: BTreeSet<TokenPermission>,
}

impl Subtoken {
    pub fn new(
        token: impl Into<String>,
        permissions: impl IntoIterator<Item = TokenPermission>,
    ) -> Self {
        Self {
            token: token.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[inline]
    pub fn permissions(&self) -> &BTreeSet<TokenPermission> {
        &self.permissions
    }

    pub fn grants(&self, required: &[TokenPermission]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Subtoken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtoken")
            .field("token", &"<redacted>")
            .field("permissions", &self.permissions)
            .finish()
    }
}
