//! Mapping of HTTP failures to `ProviderError`.

use std::time::Duration;

use ragdoll_core::ProviderError;
use reqwest::{StatusCode, header::HeaderValue};
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Structured { message: String },
    Plain(String),
}

/// Transport-level failure (connection refused, timeout, ...).
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    ProviderError::ProcessError {
        status_code: None,
        message: format!("{} request failed: {}", provider, err),
        is_retryable: err.is_connect() || err.is_timeout(),
        retry_after: None,
    }
}

/// Response body that could not be decoded.
pub(crate) fn decode_error(provider: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Other(format!("Failed to parse {} response: {}", provider, err))
}

/// Non-2xx status. Pulls `error.message` (OpenAI) or `error` (Ollama) out of a
/// JSON body when present, otherwise keeps the raw body.
pub(crate) fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> ProviderError {
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse {
            error: ErrorBody::Structured { message },
        }) => message,
        Ok(ErrorResponse {
            error: ErrorBody::Plain(message),
        }) => message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ProviderError::ProcessError {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

/// Seconds form of `Retry-After`; HTTP-date values are ignored.
pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Turns a non-success response into an error, passing successes through.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let retry_after = parse_retry_after(response.headers().get("retry-after"));
    let body = response.text().await.unwrap_or_default();
    Err(map_http_error(status, body, retry_after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_error_body_message_is_extracted() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#.into(),
            Some(Duration::from_secs(2)),
        );
        assert_eq!(err.to_string(), "Rate limit reached");
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn plain_error_field_is_extracted() {
        let err = map_http_error(
            StatusCode::NOT_FOUND,
            r#"{"error": "model 'mistral' not found"}"#.into(),
            None,
        );
        assert_eq!(err.to_string(), "model 'mistral' not found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, String::new(), None);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn retry_after_seconds_only() {
        let seconds = HeaderValue::from_static("7");
        assert_eq!(parse_retry_after(Some(&seconds)), Some(Duration::from_secs(7)));

        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
