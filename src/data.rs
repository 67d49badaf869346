//! Wire types for the HTTP API.

use serde::{Deserialize, Serialize};

pub mod check;

pub use check::*;

/// Body of `POST /generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Unified diff to describe. Missing and empty are treated alike.
    #[serde(default)]
    pub diff: Option<String>,
}

impl GenerateRequest {
    /// Returns the diff if one was supplied and is non-empty.
    pub fn diff(&self) -> Option<&str> {
        self.diff.as_deref().filter(|d| !d.is_empty())
    }
}

/// Successful `POST /generate` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Candidate commit messages, exactly as produced by the model.
    pub commits: Vec<String>,
    /// Format warnings; omitted when every candidate conforms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Raw model output, when the failure concerns its shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process answers.
    pub status: String,
    /// Whether an upstream API key was configured at startup.
    pub openai_api_key_set: bool,
    /// Whether a non-empty system prompt was loaded at startup.
    pub system_prompt_loaded: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_diff_missing_or_empty() {
        let missing: GenerateRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.diff(), None);

        let empty: GenerateRequest = serde_json::from_value(json!({"diff": ""})).unwrap();
        assert_eq!(empty.diff(), None);

        let null: GenerateRequest = serde_json::from_value(json!({"diff": null})).unwrap();
        assert_eq!(null.diff(), None);

        let present: GenerateRequest =
            serde_json::from_value(json!({"diff": "+line", "extra": 1})).unwrap();
        assert_eq!(present.diff(), Some("+line"));
    }

    #[test]
    fn warning_key_omitted_when_empty() {
        let response = GenerateResponse {
            commits: vec!["feat: a".to_string()],
            warning: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"commits": ["feat: a"]})
        );
    }

    #[test]
    fn raw_key_omitted_when_absent() {
        let body = ErrorResponse {
            error: "No diff provided".to_string(),
            raw: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"error": "No diff provided"})
        );
    }
}
