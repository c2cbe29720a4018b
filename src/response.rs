// Response classification
// Turns an HTTP response into the payload or a classified ApiError

use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{DataEnvelope, ErrorEnvelope};

/// Read the body and classify the response
pub async fn classify<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let url = response.url().clone();

    let body = response.bytes().await.map_err(|e| {
        tracing::warn!(
            status = %status,
            url = %url,
            error = %e,
            "Failed to read response body"
        );
        ApiError::Connectivity
    })?;

    classify_parts(status, content_type.as_deref(), &body)
}

/// Classification over an already-read response
pub fn classify_parts<T: DeserializeOwned>(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<T, ApiError> {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));

    if !status.is_success() {
        if !is_json {
            return Err(ApiError::undecoded(status));
        }
        // A JSON error body must be the error envelope; anything else is malformed
        return match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => Err(ApiError::decoded(
                status,
                envelope.error.code,
                envelope.error.message,
            )),
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "Failed to decode error envelope");
                Err(ApiError::Connectivity)
            }
        };
    }

    if !is_json || body.is_empty() {
        return empty_shape();
    }

    serde_json::from_slice::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| {
            tracing::warn!(status = %status, error = %e, "Failed to decode response envelope");
            ApiError::Connectivity
        })
}

/// Default value for bodiless success responses
fn empty_shape<T: DeserializeOwned>() -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(Default::default()))
        .or_else(|_| serde_json::from_value(Value::Null))
        .map_err(|e| {
            tracing::warn!(error = %e, "Response has no body and the target type has no empty shape");
            ApiError::Connectivity
        })
}
