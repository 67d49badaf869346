//! Upstream model API errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the chat-completion API.
///
/// The set is closed so callers can discriminate on the cause instead of
/// matching on message text.
#[derive(Error, Debug)]
pub enum AiError {
    /// The request never produced an HTTP response (connect, timeout, IO).
    #[error("Network error: {0}")]
    Transport(String),

    /// The API rejected the credentials.
    #[error("Authentication failed (HTTP {status}): {body}")]
    Authentication {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Response body, as sent.
        body: String,
    },

    /// The API throttled the request.
    #[error("Rate limit exceeded by upstream API: {0}")]
    RateLimited(String),

    /// Any other non-success HTTP status.
    #[error("API request failed (HTTP {status}): {body}")]
    Api {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Response body, as sent.
        body: String,
    },

    /// The response envelope could not be decoded or carried no text.
    #[error("Invalid response format from API: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Classifies a non-success HTTP status from the API.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authentication { status, body },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(body),
            _ => Self::Api { status, body },
        }
    }

    /// Short stable label, used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Authentication { .. } => "authentication",
            Self::RateLimited(_) => "upstream_rate_limited",
            Self::Api { .. } => "api",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            AiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            AiError::Authentication { .. }
        ));
        assert!(matches!(
            AiError::from_status(StatusCode::FORBIDDEN, String::new()),
            AiError::Authentication { .. }
        ));
        assert!(matches!(
            AiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AiError::RateLimited(_)
        ));
        assert!(matches!(
            AiError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            AiError::Api { .. }
        ));
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = AiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert_eq!(
            err.to_string(),
            "API request failed (HTTP 500 Internal Server Error): boom"
        );
    }
}
