use std::sync::Arc;

use crate::auth::REFRESH_PATH;
use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{
    AuthResponse, LoginCredentials, RefreshRequest, RefreshResponse, SignupCredentials,
    UserProfile,
};

/// Signup, login and session endpoints. A 401 from any of these is final.
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn signup(&self, credentials: &SignupCredentials) -> Result<AuthResponse> {
        self.client.post("/auth/signup", credentials).await
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        self.client.post("/auth/login", credentials).await
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get("/auth/me").await
    }

    /// Explicit refresh. Does not touch the token store.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.client.post(REFRESH_PATH, &body).await
    }
}
