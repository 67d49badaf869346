//! Commit message generation and Conventional Commit validation.

pub mod conventional;
pub mod error;
pub mod generator;
pub mod parse;
pub mod prompts;

pub use conventional::{is_conventional, parse_header, validate, CommitType, ConventionalCommit};
pub use error::GenerateError;
pub use generator::{CommitGenerator, GeneratedCommits};
pub use parse::{parse_candidates, CandidateError};
