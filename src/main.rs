use std::process;

use clap::Parser;
use omni_commit_api::config::{parse_log_level, LOG_LEVEL};
use omni_commit_api::utils::Settings;
use omni_commit_api::Cli;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside development.
    dotenvy::dotenv().ok();

    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    // RUST_LOG wins; otherwise LOG_LEVEL, otherwise info. Logs go to stderr
    // so `check --format json` output stays clean.
    let level_name = settings.get_env_var(LOG_LEVEL);
    let level = level_name.as_deref().map_or(Some(LevelFilter::INFO), parse_log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(level.unwrap_or(LevelFilter::INFO).into())
    });
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if level.is_none() {
        warn!(
            value = level_name.as_deref().unwrap_or_default(),
            "Unrecognised {LOG_LEVEL}, using info"
        );
    }
    if let Some(e) = settings_error {
        warn!(error = %e, "Ignoring unreadable settings file");
    }

    let cli = Cli::parse();

    if let Err(e) = cli.execute(&settings).await {
        eprintln!("Error: {e}");

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(1);
    }
}
