//! Commit generation errors.

use thiserror::Error;

use crate::ai::AiError;
use crate::commit::parse::CandidateError;

/// Failures of a single generation request.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// No upstream API key was configured at startup.
    #[error("OpenAI API key is not set")]
    MissingApiKey,

    /// The completion was not JSON.
    #[error("Response is not valid JSON")]
    MalformedResponse {
        /// Trimmed completion text.
        raw: String,
    },

    /// The completion was JSON but not an array of strings.
    #[error("Response is not a list of strings")]
    ShapeMismatch {
        /// Trimmed completion text.
        raw: String,
    },

    /// The upstream call itself failed.
    #[error("Error generating commit message: {0}")]
    Upstream(#[from] AiError),
}

impl GenerateError {
    /// Attaches the offending completion text to a parse failure.
    pub fn from_candidate_error(err: CandidateError, raw: String) -> Self {
        match err {
            CandidateError::NotJson => Self::MalformedResponse { raw },
            CandidateError::NotStringList => Self::ShapeMismatch { raw },
        }
    }

    /// The completion text attached to shape failures.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw } | Self::ShapeMismatch { raw } => Some(raw),
            Self::MissingApiKey | Self::Upstream(_) => None,
        }
    }

    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::Upstream(_) => "upstream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_api_contract() {
        assert_eq!(GenerateError::MissingApiKey.to_string(), "OpenAI API key is not set");
        assert_eq!(
            GenerateError::from_candidate_error(CandidateError::NotJson, "x".into()).to_string(),
            "Response is not valid JSON"
        );
        assert_eq!(
            GenerateError::from_candidate_error(CandidateError::NotStringList, "x".into())
                .to_string(),
            "Response is not a list of strings"
        );
        assert_eq!(
            GenerateError::Upstream(AiError::Transport("connection refused".into())).to_string(),
            "Error generating commit message: Network error: connection refused"
        );
    }

    #[test]
    fn raw_only_on_shape_failures() {
        let err = GenerateError::from_candidate_error(CandidateError::NotJson, "not json".into());
        assert_eq!(err.raw(), Some("not json"));
        assert_eq!(GenerateError::MissingApiKey.raw(), None);
    }
}
