//! Offline Conventional Commit validation.

use std::io::{self, IsTerminal, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::commit::{parse_candidates, parse_header, validate};
use crate::data::check::{OutputFormat, ValidationReport};

/// Validates commit messages against the Conventional Commit header grammar.
///
/// Messages come from the arguments, or from stdin when none are given.
/// Stdin may hold a JSON array of strings (as produced by the model) or one
/// message per line.
#[derive(Parser)]
pub struct CheckCommand {
    /// Commit messages to validate.
    pub messages: Vec<String>,

    /// Output format (text or json).
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

impl CheckCommand {
    /// Executes the check command. Exits with 1 if any message fails.
    pub fn execute(self) -> Result<()> {
        let messages = if self.messages.is_empty() {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read commit messages from stdin")?;
            messages_from_input(&input)
        } else {
            self.messages
        };

        let report = validate(&messages);
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize validation report")?;
                println!("{json}");
            }
            OutputFormat::Text => print_text(&report).context("Failed to write report")?,
        }

        let exit_code = report.exit_code();
        if exit_code != 0 {
            std::process::exit(exit_code);
        }
        Ok(())
    }
}

/// Splits raw input into candidates: a JSON string array if it parses as
/// one, otherwise each non-blank line.
fn messages_from_input(input: &str) -> Vec<String> {
    match parse_candidates(input.trim()) {
        Ok(messages) => messages,
        Err(_) => input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn print_text(report: &ValidationReport) -> io::Result<()> {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut out = StandardStream::stdout(choice);

    for check in &report.checks {
        let first_line = check.message.lines().next().unwrap_or_default();
        if check.conforms {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "PASS")?;
            out.reset()?;
            write!(out, "  {first_line}")?;
            if let Some(header) = parse_header(&check.message) {
                let scope = header.scope.map(|s| format!("({s})")).unwrap_or_default();
                let breaking = if header.breaking { ", breaking" } else { "" };
                write!(out, "  [{}{scope}{breaking}]", header.commit_type)?;
            }
            writeln!(out)?;
        } else {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "FAIL")?;
            out.reset()?;
            writeln!(out, "  {first_line}")?;
        }
    }

    let summary = &report.summary;
    writeln!(
        out,
        "\n{} checked, {} conforming, {} not conforming",
        summary.total, summary.conforming, summary.non_conforming
    )
}
