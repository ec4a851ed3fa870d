//! In-process token cache shared across sessions.
//!
//! Entries are keyed by token endpoint plus the full credential set (id,
//! secret, scope) and held behind `Arc<tokio::sync::Mutex<_>>`,
//! so concurrent callers using the same credentials wait on one refresh
//! instead of each starting their own exchange.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Credentials, TokenManager, TokenSession};
use crate::error::AcquireError;

#[derive(Clone, PartialEq, Eq, Hash)]
struct CredentialKey {
    token_url: String,
    credentials: Credentials,
}

impl From<&TokenManager> for CredentialKey {
    fn from(manager: &TokenManager) -> Self {
        Self {
            token_url: manager.token_url().to_string(),
            credentials: manager.credentials().clone(),
        }
    }
}

type Slot = Arc<tokio::sync::Mutex<TokenSession>>;

#[derive(Default)]
pub struct TokenCache {
    slots: Mutex<HashMap<CredentialKey, Slot>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl TokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: CredentialKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }

    /// Returns a valid access token for `manager`'s credentials, refreshing at
    /// most once per endpoint and credential set no matter how many callers
    /// are waiting.
    ///
    /// # Errors
    ///
    /// Propagates the classified failure from [`TokenManager::ensure_valid`].
    pub async fn token_for(&self, manager: &TokenManager) -> Result<String, AcquireError> {
        let slot = self.slot(CredentialKey::from(manager));
        let mut session = slot.lock().await;
        manager.ensure_valid(&mut session).await?;
        session
            .access_token()
            .map(str::to_owned)
            .ok_or_else(|| AcquireError::Auth("no access token after refresh".to_owned()))
    }

    /// Drops the cached token for `manager`'s endpoint and credentials,
    /// forcing the next caller to refresh.
    pub fn invalidate(&self, manager: &TokenManager) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&CredentialKey::from(manager));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
