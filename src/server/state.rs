//! Shared application state handed to every handler.

use std::sync::Arc;

use anyhow::Result;

use crate::ai::{AiClient, OpenAiAiClient};
use crate::commit::CommitGenerator;
use crate::config::{ServiceConfig, SystemPrompt};
use crate::server::metrics::Metrics;
use crate::server::rate_limit::{RateLimit, RateLimiter};

/// Immutable wiring plus the process-wide counters and limiter tables.
#[derive(Clone)]
pub struct AppState {
    /// Generation pipeline.
    pub generator: Arc<CommitGenerator>,
    /// Request counters.
    pub metrics: Arc<Metrics>,
    /// Limits for routes without their own.
    pub default_limiter: Arc<RateLimiter>,
    /// Limits for `/generate`.
    pub generate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Assembles state from already-built parts.
    pub fn new(
        generator: CommitGenerator,
        default_limits: Vec<RateLimit>,
        generate_limits: Vec<RateLimit>,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            metrics: Arc::new(Metrics::new()),
            default_limiter: Arc::new(RateLimiter::new("default", default_limits)),
            generate_limiter: Arc::new(RateLimiter::new("generate", generate_limits)),
        }
    }

    /// Builds the OpenAI client (when a key is set) and wires everything.
    pub fn from_config(config: &ServiceConfig, system_prompt: SystemPrompt) -> Result<Self> {
        let client: Option<Arc<dyn AiClient>> = match &config.api_key {
            Some(key) => Some(Arc::new(OpenAiAiClient::new(
                config.model.clone(),
                key.clone(),
                &config.base_url,
            )?)),
            None => None,
        };

        Ok(Self::new(
            CommitGenerator::new(client, system_prompt.text),
            config.default_rate_limits.clone(),
            config.generate_rate_limits.clone(),
        ))
    }
}
