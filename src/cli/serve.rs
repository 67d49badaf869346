//! Runs the HTTP service.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::config::ServiceConfig;
use crate::server::{self, AppState};

/// Serves the commit message API.
///
/// Flags override the environment and settings file.
#[derive(Parser)]
pub struct ServeCommand {
    /// Address to bind.
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Path to the system prompt file.
    #[arg(long)]
    pub system_prompt: Option<PathBuf>,

    /// Model identifier to request completions from.
    #[arg(long)]
    pub model: Option<String>,
}

impl ServeCommand {
    /// Applies flag overrides to `config`.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = self.host {
            config.bind_addr.set_ip(host);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(path) = &self.system_prompt {
            config.system_prompt_path.clone_from(path);
        }
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
    }

    /// Executes the serve command with an already-resolved configuration.
    pub async fn execute(self, mut config: ServiceConfig) -> Result<()> {
        self.apply(&mut config);
        config.warn_if_incomplete();

        let system_prompt = config.load_system_prompt();
        info!(
            model = %config.model,
            base_url = %config.base_url,
            api_key_set = config.api_key.is_some(),
            system_prompt_loaded = system_prompt.is_loaded(),
            "Starting commit message service"
        );
        let state = AppState::from_config(&config, system_prompt)?;

        server::serve(config.bind_addr, state).await
    }
}
