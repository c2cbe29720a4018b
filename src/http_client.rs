use anyhow::{Context, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{RefreshCoordinator, TokenStore, UnauthorizedHandler};
use crate::config::ClientSettings;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::response;

/// Authenticated client for the SSW backend.
///
/// Construct once at startup and share it (`Arc<ApiClient>`): the refresh
/// slot lives inside the client, so separate instances would refresh
/// independently.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL without trailing slash, e.g. `http://localhost:8080/v1`
    base_url: String,

    /// Source of truth for the current access token
    store: Arc<dyn TokenStore>,

    /// Single refresh slot shared by every request of this client
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(settings: &ClientSettings, store: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(settings.max_connections)
            .connect_timeout(Duration::from_secs(settings.connect_timeout))
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let refresh = RefreshCoordinator::new(
            client.clone(),
            base_url.clone(),
            store.clone(),
            Duration::from_secs(settings.refresh_timeout),
        );

        Ok(Self {
            client,
            base_url,
            store,
            refresh,
        })
    }

    /// Register the callback fired when a refresh fails and the session ends
    pub fn with_unauthorized_handler(mut self, handler: UnauthorizedHandler) -> Self {
        self.refresh.set_unauthorized_handler(handler);
        self
    }

    /// Token store backing this client
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request, refreshing the access token once on 401.
    ///
    /// Auth endpoints and unauthenticated requests are never retried. The
    /// retried response is final whatever its status; if the refresh fails the
    /// original 401 is classified instead.
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let token = self.store.access_token().await.map_err(|e| {
            tracing::error!("Failed to read access token: {:#}", e);
            ApiError::Storage(e)
        })?;

        let response = self.send(request, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && token.is_some()
            && !request.is_auth_endpoint()
        {
            tracing::warn!(
                path = %request.path(),
                "Received 401, refreshing token and retrying..."
            );

            match self.refresh.coordinate().await {
                Some(new_token) => {
                    tracing::debug!(path = %request.path(), "Retrying with refreshed token");
                    let retry = self.send(request, Some(&new_token)).await?;
                    return response::classify(retry).await;
                }
                None => {
                    tracing::debug!(
                        path = %request.path(),
                        "Token refresh unavailable, returning original response"
                    );
                }
            }
        }

        response::classify(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(&ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = ApiRequest::post(path).with_body(encode_body(path, body)?);
        self.request(&request).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = ApiRequest::patch(path).with_body(encode_body(path, body)?);
        self.request(&request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(&ApiRequest::delete(path)).await
    }

    /// Build and send a single attempt
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path());

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in request.headers() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                tracing::error!(error = %e, "Access token is not a valid header value");
                ApiError::Connectivity
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .client
            .request(request.method().into(), &url)
            .headers(headers);

        if let Some(body) = request.body() {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to encode request body");
                ApiError::Connectivity
            })?;
            builder = builder.body(bytes);
        }

        tracing::debug!(
            method = ?request.method(),
            url = %url,
            authenticated = token.is_some(),
            "Sending HTTP request"
        );

        match builder.send().await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), url = %url, "Received HTTP response");
                Ok(response)
            }
            Err(e) => {
                // Categorize the error for better debugging
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else if e.is_body() {
                    "body_error"
                } else if e.is_decode() {
                    "decode_error"
                } else {
                    "unknown"
                };

                tracing::error!(
                    error_kind = error_kind,
                    error = %e,
                    error_debug = ?e,
                    url = %url,
                    "HTTP request failed"
                );

                Err(ApiError::Connectivity)
            }
        }
    }
}

/// Serialize a request body up front; failure counts as a construction error
fn encode_body<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| {
        tracing::error!(path = %path, error = %e, "Failed to serialize request body");
        ApiError::Connectivity
    })
}
