use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::refresh;
use super::store::TokenStore;
use super::types::UnauthorizedHandler;

/// Outcome shared by every caller of one refresh: the new token, or `None`
type PendingRefresh = Shared<BoxFuture<'static, Option<String>>>;

enum RefreshState {
    Idle,
    InFlight(PendingRefresh),
}

/// Single-slot refresh coordinator.
///
/// At most one refresh operation runs at a time. Callers arriving while one is
/// in flight await the same outcome instead of starting their own. The slot is
/// returned to `Idle` before any waiter observes the outcome, so a later
/// authentication failure can start a fresh refresh.
///
/// A failed refresh (no refresh token, rejected, timed out) clears the store
/// and fires the unauthorized handler once; it never surfaces as an error.
pub struct RefreshCoordinator {
    state: Arc<Mutex<RefreshState>>,
    store: Arc<dyn TokenStore>,
    client: Client,
    base_url: String,
    timeout: Duration,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl RefreshCoordinator {
    pub fn new(
        client: Client,
        base_url: String,
        store: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(RefreshState::Idle)),
            store,
            client,
            base_url,
            timeout,
            on_unauthorized: None,
        }
    }

    /// Register the callback fired after a failed refresh
    pub fn set_unauthorized_handler(&mut self, handler: UnauthorizedHandler) {
        self.on_unauthorized = Some(handler);
    }

    /// Join the in-flight refresh or start one
    pub async fn coordinate(&self) -> Option<String> {
        let pending = {
            let mut state = self.state.lock().await;
            match &*state {
                RefreshState::InFlight(pending) => {
                    tracing::debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                RefreshState::Idle => {
                    let pending = self.start();
                    *state = RefreshState::InFlight(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// True while a refresh is outstanding
    pub async fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock().await, RefreshState::InFlight(_))
    }

    /// Spawn the refresh so it completes even if every waiter is dropped
    fn start(&self) -> PendingRefresh {
        let state = self.state.clone();
        let store = self.store.clone();
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let timeout = self.timeout;
        let on_unauthorized = self.on_unauthorized.clone();

        let task = tokio::spawn({
            let state = state.clone();
            async move {
                let attempt = refresh::refresh_access_token(&client, &base_url, store.as_ref());
                let outcome = match tokio::time::timeout(timeout, attempt).await {
                    Ok(Ok(token)) => Some(token),
                    Ok(Err(e)) => {
                        tracing::error!("Token refresh failed: {:#}", e);
                        None
                    }
                    Err(_) => {
                        tracing::error!("Token refresh timed out after {:?}", timeout);
                        None
                    }
                };

                if outcome.is_none() {
                    expire_session(store.as_ref(), on_unauthorized.as_ref()).await;
                }

                *state.lock().await = RefreshState::Idle;
                outcome
            }
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Token refresh task failed: {}", e);
                    *state.lock().await = RefreshState::Idle;
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Wipe stored credentials and notify the application
async fn expire_session(store: &dyn TokenStore, on_unauthorized: Option<&UnauthorizedHandler>) {
    if let Err(e) = store.clear_tokens().await {
        tracing::error!("Failed to clear stored credentials: {:#}", e);
    } else {
        tracing::warn!("Stored credentials cleared after failed refresh");
    }

    if let Some(handler) = on_unauthorized {
        handler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryTokenStore;
    use crate::auth::types::Credentials;
    use mockito::Server;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler() -> (UnauthorizedHandler, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler: UnauthorizedHandler = {
            let calls = calls.clone();
            Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        (handler, calls)
    }

    #[tokio::test]
    async fn test_missing_refresh_token_yields_none_and_clears() {
        let mut server = Server::new_async().await;
        let refresh_mock = server
            .mock("POST", refresh::REFRESH_PATH)
            .expect(0)
            .create_async()
            .await;

        let store = Arc::new(MemoryTokenStore::with_credentials(Credentials {
            access_token: Some("stale".to_string()),
            refresh_token: None,
        }));
        store.set_profile_id("profile-1").await.unwrap();

        let (handler, calls) = counting_handler();
        let mut coordinator = RefreshCoordinator::new(
            Client::new(),
            server.url(),
            store.clone(),
            Duration::from_secs(5),
        );
        coordinator.set_unauthorized_handler(handler);

        assert_eq!(coordinator.coordinate().await, None);
        assert_eq!(store.access_token().await.unwrap(), None);
        assert_eq!(store.profile_id().await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_refreshing().await);
        refresh_mock.assert_async().await;

        // Clearing an already-empty store is not an error
        assert_eq!(coordinator.coordinate().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_successful_refresh_returns_to_idle() {
        let mut server = Server::new_async().await;
        let refresh_mock = server
            .mock("POST", refresh::REFRESH_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"access_token":"fresh"}}"#)
            .expect(2)
            .create_async()
            .await;

        let store = Arc::new(MemoryTokenStore::with_credentials(Credentials::new(
            "stale", "r1",
        )));
        let coordinator =
            RefreshCoordinator::new(Client::new(), server.url(), store.clone(), Duration::from_secs(5));

        assert_eq!(coordinator.coordinate().await.as_deref(), Some("fresh"));
        assert!(!coordinator.is_refreshing().await);

        // A later failure starts a new refresh rather than reusing the old outcome
        assert_eq!(coordinator.coordinate().await.as_deref(), Some("fresh"));
        refresh_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_store() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", refresh::REFRESH_PATH)
            .with_status(401)
            .create_async()
            .await;

        let store = Arc::new(MemoryTokenStore::with_credentials(Credentials::new(
            "stale", "r1",
        )));
        let (handler, calls) = counting_handler();
        let mut coordinator =
            RefreshCoordinator::new(Client::new(), server.url(), store.clone(), Duration::from_secs(5));
        coordinator.set_unauthorized_handler(handler);

        assert_eq!(coordinator.coordinate().await, None);
        assert_eq!(store.refresh_token().await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
