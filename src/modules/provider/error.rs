use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// What went wrong talking to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Request rejected as malformed (HTTP 400)
    InvalidRequest,
    /// Key rejected or missing permission (HTTP 401/403)
    PermissionDenied,
    /// Referenced resource does not exist (HTTP 404)
    NotFound,
    /// Quota exhausted (HTTP 429)
    RateLimited,
    /// Provider-side failure (HTTP 5xx)
    Unavailable,
    /// Network, TLS or timeout failure before a response arrived
    Transport,
    /// Response arrived but could not be understood
    InvalidResponse,
    /// Generation produced no text, e.g. the prompt was blocked
    Blocked,
}

impl ProviderErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited
                | ProviderErrorKind::Unavailable
                | ProviderErrorKind::Transport
        )
    }

    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => ProviderErrorKind::InvalidRequest,
            401 | 403 => ProviderErrorKind::PermissionDenied,
            404 => ProviderErrorKind::NotFound,
            429 => ProviderErrorKind::RateLimited,
            s if s >= 500 => ProviderErrorKind::Unavailable,
            _ => ProviderErrorKind::InvalidRequest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderErrorKind::InvalidRequest => "invalid_request",
            ProviderErrorKind::PermissionDenied => "permission_denied",
            ProviderErrorKind::NotFound => "not_found",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::InvalidResponse => "invalid_response",
            ProviderErrorKind::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged provider failure. Nothing in the service retries, `retryable` is
/// informational for callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidResponse, message)
    }

    /// Build an error from a non-success HTTP response body.
    ///
    /// Google APIs answer with `{"error": {"code", "message", "status"}}`; anything
    /// else is kept verbatim.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let kind = ProviderErrorKind::from_status(status);
        let message = serde_json::from_str::<GoogleErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("Provider returned HTTP {}", status)
                } else {
                    format!("Provider returned HTTP {}: {}", status, trimmed)
                }
            });

        Self::new(kind, message)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::invalid_response(format!("Failed to decode provider response: {}", err))
        } else if let Some(status) = err.status() {
            ProviderError::new(ProviderErrorKind::from_status(status), err.to_string())
        } else {
            ProviderError::new(
                ProviderErrorKind::Transport,
                format!("Provider request failed: {}", err),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_follows_kind() {
        assert!(ProviderError::new(ProviderErrorKind::RateLimited, "slow down").retryable);
        assert!(ProviderError::new(ProviderErrorKind::Unavailable, "503").retryable);
        assert!(ProviderError::new(ProviderErrorKind::Transport, "reset").retryable);
        assert!(!ProviderError::not_found("gone").retryable);
        assert!(!ProviderError::new(ProviderErrorKind::Blocked, "safety").retryable);
    }

    #[test]
    fn test_from_google_error_body() {
        let body = r#"{"error":{"code":404,"message":"File files/abc does not exist.","status":"NOT_FOUND"}}"#;
        let err = ProviderError::from_response(StatusCode::NOT_FOUND, body);
        assert_eq!(err.kind, ProviderErrorKind::NotFound);
        assert_eq!(err.message, "File files/abc does not exist.");
        assert_eq!(err.to_string(), "not_found: File files/abc does not exist.");
    }

    #[test]
    fn test_from_plain_body() {
        let err = ProviderError::from_response(StatusCode::BAD_GATEWAY, "upstream hiccup");
        assert_eq!(err.kind, ProviderErrorKind::Unavailable);
        assert!(err.message.contains("upstream hiccup"));

        let err = ProviderError::from_response(StatusCode::FORBIDDEN, "");
        assert_eq!(err.kind, ProviderErrorKind::PermissionDenied);
        assert!(err.message.contains("403"));
    }
}
