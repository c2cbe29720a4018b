// Token storage capability
// Each platform supplies its own adapter; the client only sees this trait

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::Credentials;

/// Persisted credentials consumed by the API client.
///
/// The store is the single source of truth for the current access token.
/// It is read concurrently by requests and written by at most one in-flight
/// refresh at a time.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;

    async fn refresh_token(&self) -> Result<Option<String>>;

    /// Persist a refreshed access token
    async fn set_access_token(&self, access_token: &str) -> Result<()>;

    /// Persist both tokens after signup, login or a rotating refresh
    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<()>;

    /// Remove access token, refresh token and cached profile id.
    /// Clearing an empty store is a no-op.
    async fn clear_tokens(&self) -> Result<()>;

    async fn profile_id(&self) -> Result<Option<String>>;

    async fn set_profile_id(&self, profile_id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    credentials: Credentials,
    profile_id: Option<String>,
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: RwLock<MemoryState>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token pair
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                credentials,
                profile_id: None,
            }),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.state.read().await.credentials.access_token.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.state.read().await.credentials.refresh_token.clone())
    }

    async fn set_access_token(&self, access_token: &str) -> Result<()> {
        self.state.write().await.credentials.access_token = Some(access_token.to_string());
        Ok(())
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.state.write().await.credentials = Credentials::new(access_token, refresh_token);
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.credentials = Credentials::default();
        state.profile_id = None;
        Ok(())
    }

    async fn profile_id(&self) -> Result<Option<String>> {
        Ok(self.state.read().await.profile_id.clone())
    }

    async fn set_profile_id(&self, profile_id: &str) -> Result<()> {
        self.state.write().await.profile_id = Some(profile_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.access_token().await.unwrap(), None);

        store.set_tokens("access-1", "refresh-1").await.unwrap();
        store.set_profile_id("profile-9").await.unwrap();
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));

        store.set_access_token("access-2").await.unwrap();
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.profile_id().await.unwrap().as_deref(), Some("profile-9"));
    }

    #[tokio::test]
    async fn test_memory_store_clear_is_idempotent() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("a", "r"));
        store.set_profile_id("p").await.unwrap();

        store.clear_tokens().await.unwrap();
        store.clear_tokens().await.unwrap();

        assert_eq!(store.access_token().await.unwrap(), None);
        assert_eq!(store.refresh_token().await.unwrap(), None);
        assert_eq!(store.profile_id().await.unwrap(), None);
    }
}
