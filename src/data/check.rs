//! Validation result types for generated commit messages.

use std::fmt;

use serde::Serialize;

/// Prefix of every format warning; the offending message follows verbatim.
pub const FORMAT_WARNING_PREFIX: &str =
    "Commit message does not fully match Conventional Commit format: ";

/// Classification of candidate commit messages, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Individual candidate results.
    pub checks: Vec<CandidateCheck>,
    /// Summary statistics.
    pub summary: CheckSummary,
}

/// Result of checking a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCheck {
    /// The candidate exactly as produced.
    pub message: String,
    /// Whether the candidate matches the Conventional Commit grammar.
    pub conforms: bool,
}

/// Summary statistics for a validation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    /// Number of candidates checked.
    pub total: usize,
    /// Number of conforming candidates.
    pub conforming: usize,
    /// Number of non-conforming candidates.
    pub non_conforming: usize,
}

impl CheckSummary {
    /// Creates a summary from a list of candidate results.
    pub fn from_checks(checks: &[CandidateCheck]) -> Self {
        let total = checks.len();
        let conforming = checks.iter().filter(|c| c.conforms).count();
        Self {
            total,
            conforming,
            non_conforming: total - conforming,
        }
    }
}

impl CandidateCheck {
    /// The advisory warning for this candidate, if it does not conform.
    pub fn warning(&self) -> Option<String> {
        (!self.conforms).then(|| format!("{FORMAT_WARNING_PREFIX}{}", self.message))
    }
}

impl ValidationReport {
    /// Creates a report from candidate results.
    pub fn new(checks: Vec<CandidateCheck>) -> Self {
        let summary = CheckSummary::from_checks(&checks);
        Self { checks, summary }
    }

    /// One warning per non-conforming candidate, in input order.
    pub fn warnings(&self) -> Vec<String> {
        self.checks.iter().filter_map(CandidateCheck::warning).collect()
    }

    /// Checks if any candidate failed to conform.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.summary.non_conforming > 0
    }

    /// Exit code for the offline checker: 1 when anything failed to conform.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_warnings())
    }
}

/// Output format for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON format.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
