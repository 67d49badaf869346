//! # omni-commit-api
//!
//! An HTTP service that turns a git diff into Conventional Commit message
//! candidates using an OpenAI chat completion model.
//!
//! ## Features
//!
//! - `POST /generate` returns candidate commit messages for a diff
//! - Conventional Commit header validation with non-blocking warnings
//! - Per-client rate limiting and Prometheus-style metrics
//!
//! ## Quick Start
//!
//! ```rust
//! use omni_commit_api::commit::is_conventional;
//!
//! assert!(is_conventional("feat(api): add endpoint"));
//! assert!(!is_conventional("Added endpoint"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod cli;
pub mod commit;
pub mod config;
pub mod data;
pub mod server;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of omni-commit-api.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
