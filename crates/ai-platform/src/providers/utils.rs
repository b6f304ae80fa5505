use serde_json::Value;
use tracing::warn;

use crate::errors::{PlatformError, PlatformResult};
use crate::transport::TransportResponse;

/// Check the static configuration every model client needs
pub fn validate_credentials(api_key: &str, base_url: &str) -> PlatformResult<()> {
    if api_key.trim().is_empty() {
        return Err(PlatformError::InvalidConfiguration(
            "The API key must not be empty.".to_string(),
        ));
    }
    if base_url.trim().is_empty() {
        return Err(PlatformError::InvalidConfiguration(
            "The base URL must not be empty.".to_string(),
        ));
    }
    Ok(())
}

pub fn bearer(api_key: &str) -> String {
    format!("Bearer {api_key}")
}

/// Pass successful responses through, turn everything else into a provider error
pub async fn ensure_success(response: TransportResponse) -> PlatformResult<TransportResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await?;
    warn!(status, "provider returned an error response");
    let error = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|payload| payload.get("error").cloned());

    Err(match error {
        Some(error) => error_from_payload(status, &error),
        None => PlatformError::Provider {
            status,
            message: body,
        },
    })
}

/// Fail if a response body carries an `error` object despite a success status
pub fn check_error_payload(status: u16, data: &Value) -> PlatformResult<()> {
    match data.get("error") {
        Some(error) if !error.is_null() => Err(error_from_payload(status, error)),
        _ => Ok(()),
    }
}

/// Build an error from the `error` member of a provider response
pub fn error_from_payload(status: u16, error: &Value) -> PlatformError {
    if let Some(exceeded) = check_context_length_error(error) {
        return exceeded;
    }

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    PlatformError::Provider { status, message }
}

/// Recognize the ways providers report an overlong prompt
pub fn check_context_length_error(error: &Value) -> Option<PlatformError> {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();

    let code = error.get("code").and_then(Value::as_str);
    if matches!(
        code,
        Some("context_length_exceeded") | Some("string_above_max_length")
    ) {
        return Some(PlatformError::ContextLengthExceeded(message));
    }

    if message.to_lowercase().contains("prompt is too long") {
        return Some(PlatformError::ContextLengthExceeded(message));
    }

    None
}
