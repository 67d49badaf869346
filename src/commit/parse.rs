//! Interpretation of raw completion text as candidate commit messages.

use serde_json::Value;
use thiserror::Error;

/// Why the completion text could not be turned into candidates.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateError {
    /// The text is not JSON at all.
    #[error("Response is not valid JSON")]
    NotJson,
    /// The JSON is not an array, or holds a non-string element.
    #[error("Response is not a list of strings")]
    NotStringList,
}

/// Parses `raw` as a JSON array of strings.
///
/// `raw` is expected to be trimmed already. Shape errors are detected here,
/// before any grammar validation runs.
pub fn parse_candidates(raw: &str) -> Result<Vec<String>, CandidateError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| CandidateError::NotJson)?;

    let Value::Array(items) = value else {
        return Err(CandidateError::NotStringList);
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(CandidateError::NotStringList),
        })
        .collect()
}
