//! Conventional Commit header grammar.
//!
//! A conforming message starts with
//! `<type>[(<scope>)][!]: <description>` where the description is non-empty
//! on the first line. Anything after the first line is not inspected.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::data::check::{CandidateCheck, ValidationReport};

/// Header pattern. Unanchored at the end so bodies and footers are tolerated.
#[allow(clippy::unwrap_used)]
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(?:\((?P<scope>[a-z0-9/-]+)\))?(?P<breaking>!)?: (?P<desc>.+)",
    )
    .unwrap()
});

/// The commit types accepted in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    /// A new feature.
    Feat,
    /// A bug fix.
    Fix,
    /// Documentation only.
    Docs,
    /// Formatting, whitespace.
    Style,
    /// Code change that neither fixes a bug nor adds a feature.
    Refactor,
    /// Performance improvement.
    Perf,
    /// Tests.
    Test,
    /// Build system or dependencies.
    Build,
    /// CI configuration.
    Ci,
    /// Maintenance.
    Chore,
    /// Reverts a previous commit.
    Revert,
}

impl CommitType {
    /// Every accepted type, in grammar order.
    pub const ALL: [Self; 11] = [
        Self::Feat,
        Self::Fix,
        Self::Docs,
        Self::Style,
        Self::Refactor,
        Self::Perf,
        Self::Test,
        Self::Build,
        Self::Ci,
        Self::Chore,
        Self::Revert,
    ];

    /// The lowercase keyword as written in a header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Test => "test",
            Self::Build => "build",
            Self::Ci => "ci",
            Self::Chore => "chore",
            Self::Revert => "revert",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown commit type: {s}"))
    }
}

/// A parsed, conforming commit header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    /// The commit type keyword.
    pub commit_type: CommitType,
    /// Optional scope between parentheses.
    pub scope: Option<String>,
    /// Whether `!` marked a breaking change.
    pub breaking: bool,
    /// First-line description after `: `.
    pub description: String,
}

/// Returns whether `message` starts with a conforming header.
pub fn is_conventional(message: &str) -> bool {
    HEADER_PATTERN.is_match(message)
}

/// Parses the header of `message`, or `None` if it does not conform.
pub fn parse_header(message: &str) -> Option<ConventionalCommit> {
    let caps = HEADER_PATTERN.captures(message)?;
    let commit_type = caps.name("type")?.as_str().parse().ok()?;

    Some(ConventionalCommit {
        commit_type,
        scope: caps.name("scope").map(|m| m.as_str().to_string()),
        breaking: caps.name("breaking").is_some(),
        description: caps.name("desc")?.as_str().to_string(),
    })
}

/// Classifies each candidate, preserving order. Candidates are not modified.
pub fn validate<S: AsRef<str>>(candidates: &[S]) -> ValidationReport {
    let checks = candidates
        .iter()
        .map(|candidate| {
            let message = candidate.as_ref();
            CandidateCheck {
                message: message.to_string(),
                conforms: is_conventional(message),
            }
        })
        .collect();

    ValidationReport::new(checks)
}
