//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::commit::GenerateError;
use crate::data::{GenerateRequest, GenerateResponse, HealthResponse};
use crate::server::error::ServiceError;
use crate::server::state::AppState;

/// `POST /generate`: turn a diff into commit message candidates.
pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ServiceError> {
    state.metrics.inc_generate_requests();

    let result = generate_inner(&state, &body).await;
    match &result {
        Ok(Json(response)) => state
            .metrics
            .record_success(response.commits.len(), response.warning.len()),
        Err(e) => {
            state.metrics.record_failure(e.kind());
            if let ServiceError::Generate(GenerateError::Upstream(upstream)) = e {
                state.metrics.record_upstream_failure(upstream.kind());
            }
        }
    }
    result
}

async fn generate_inner(
    state: &AppState,
    body: &[u8],
) -> Result<Json<GenerateResponse>, ServiceError> {
    // Configuration problems take precedence over anything in the body.
    if let Err(e) = state.generator.ensure_configured() {
        error!("API request failed: {e}");
        return Err(e.into());
    }

    let Some(diff) = read_diff(body) else {
        warn!("API request failed: No diff provided");
        return Err(ServiceError::MissingDiff);
    };
    debug!(diff_len = diff.len(), "Generating commit messages");

    let generated = state.generator.generate(&diff).await?;

    Ok(Json(GenerateResponse {
        warning: generated.report.warnings(),
        commits: generated.commits,
    }))
}

/// Extracts a non-empty diff from a JSON object body; anything else yields
/// `None`.
fn read_diff(body: &[u8]) -> Option<String> {
    // serde also deserializes structs from sequences, so `["..."]` must be
    // turned away before the struct is built.
    let value = serde_json::from_slice::<Value>(body).ok()?;
    if !value.is_object() {
        return None;
    }
    let request: GenerateRequest = serde_json::from_value(value).ok()?;
    request.diff().map(str::to_string)
}

/// `GET /health`: report configuration state.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    state.metrics.inc_health_checks();
    Json(HealthResponse {
        status: "healthy".to_string(),
        openai_api_key_set: state.generator.is_configured(),
        system_prompt_loaded: state.generator.has_system_prompt(),
    })
}

/// `GET /metrics`: counters in Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .render(&[state.default_limiter.as_ref(), state.generate_limiter.as_ref()]);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Fallback for unknown routes.
pub async fn not_found() -> ServiceError {
    ServiceError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_diff_accepts_only_nonempty_string_diffs() {
        assert_eq!(read_diff(br#"{"diff": "+x"}"#).as_deref(), Some("+x"));
        assert_eq!(read_diff(br#"{"diff": ""}"#), None);
        assert_eq!(read_diff(br"{}"), None);
        assert_eq!(read_diff(br#"{"diff": 5}"#), None);
        assert_eq!(read_diff(br#"["+x"]"#), None);
        assert_eq!(read_diff(br#"[{"diff": "+x"}]"#), None);
        assert_eq!(read_diff(br#""+x""#), None);
        assert_eq!(read_diff(b"not json"), None);
        assert_eq!(read_diff(b""), None);
    }
}
