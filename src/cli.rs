//! CLI interface for omni-commit-api.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::ServiceConfig;
use crate::utils::Settings;

pub mod check;
pub mod serve;

/// omni-commit-api: Conventional Commit messages from diffs.
#[derive(Parser)]
#[command(name = "omni-commit-api")]
#[command(about = "Generates Conventional Commit messages from diffs over HTTP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Runs the HTTP service.
    Serve(serve::ServeCommand),
    /// Validates commit messages without calling the model.
    Check(check::CheckCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self, settings: &Settings) -> Result<()> {
        match self.command {
            Commands::Serve(serve_cmd) => {
                let config = ServiceConfig::from_settings(settings)?;
                serve_cmd.execute(config).await
            }
            Commands::Check(check_cmd) => check_cmd.execute(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data::check::OutputFormat;

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from(["omni-commit-api", "serve", "--port", "8080", "--model", "gpt-4o"])
            .unwrap();
        let Commands::Serve(cmd) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(cmd.port, Some(8080));
        assert_eq!(cmd.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cmd.host, None);
    }

    #[test]
    fn parses_check_messages_and_format() {
        let cli = Cli::try_parse_from([
            "omni-commit-api",
            "check",
            "--format",
            "json",
            "feat: a",
            "oops",
        ])
        .unwrap();
        let Commands::Check(cmd) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(cmd.messages, vec!["feat: a", "oops"]);
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["omni-commit-api", "check", "--format", "xml"]).is_err());
    }
}
