// Token refresh logic

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::store::TokenStore;
use crate::models::{DataEnvelope, RefreshRequest, RefreshResponse};

/// Refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Exchange the stored refresh token for a new access token and persist it.
///
/// Fails without touching the network when no refresh token is stored.
pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    store: &dyn TokenStore,
) -> Result<String> {
    let refresh_token = store
        .refresh_token()
        .await
        .context("Failed to read refresh token")?
        .context("No refresh token available")?;

    tracing::info!("Refreshing access token...");

    let url = format!("{}{}", base_url, REFRESH_PATH);
    let request = RefreshRequest {
        refresh_token: refresh_token.clone(),
    };

    let response = client
        .post(&url)
        .header(CONTENT_TYPE, "application/json")
        .json(&request)
        .send()
        .await
        .context("Failed to send refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %error_text,
            "Token refresh rejected"
        );
        anyhow::bail!("Token refresh failed: {} - {}", status, error_text);
    }

    let envelope: DataEnvelope<RefreshResponse> = response
        .json()
        .await
        .context("Failed to parse refresh response")?;
    let data = envelope.data;

    if data.access_token.is_empty() {
        anyhow::bail!("Refresh response does not contain access_token");
    }

    // Rotated refresh tokens replace the old pair
    match data.refresh_token.as_deref() {
        Some(rotated) if !rotated.is_empty() && rotated != refresh_token => {
            store
                .set_tokens(&data.access_token, rotated)
                .await
                .context("Failed to persist refreshed token pair")?;
        }
        _ => {
            store
                .set_access_token(&data.access_token)
                .await
                .context("Failed to persist refreshed access token")?;
        }
    }

    tracing::info!("Access token refreshed");

    Ok(data.access_token)
}
