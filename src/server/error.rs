//! HTTP-facing errors and their JSON rendering.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::commit::GenerateError;
use crate::data::ErrorResponse;
use crate::server::rate_limit::RateLimitExceeded;

/// Every failure a route can report.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request carried no usable diff.
    #[error("No diff provided")]
    MissingDiff,

    /// Generation failed (configuration, upstream, or response shape).
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// The caller exhausted a rate limit.
    #[error("Rate limit exceeded: {}", .0.limit)]
    RateLimited(RateLimitExceeded),

    /// No route matched.
    #[error("Resource not found")]
    NotFound,

    /// A handler failed outside the error paths above.
    #[error("Internal server error")]
    Internal,
}

impl ServiceError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingDiff => StatusCode::BAD_REQUEST,
            Self::Generate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingDiff => "missing_diff",
            Self::Generate(e) => e.kind(),
            Self::RateLimited(_) => "rate_limited",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }

    fn body(&self) -> ErrorResponse {
        let raw = match self {
            Self::Generate(e) => e.raw().map(str::to_string),
            _ => None,
        };
        ErrorResponse {
            error: self.to_string(),
            raw,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();

        if let Self::RateLimited(exceeded) = &self {
            let secs = exceeded.retry_after.as_secs_f64().ceil() as u64;
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }

        response
    }
}
