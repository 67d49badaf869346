//! Service configuration resolved once at startup.
//!
//! Keys are looked up in the process environment first and then in the
//! `env` map of `$HOME/.omni-commit/settings.json`. The resulting
//! [`ServiceConfig`] is passed explicitly to the server.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

use crate::server::rate_limit::{parse_rate_limits, RateLimit};
use crate::utils::Settings;

/// Upstream API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Upstream model identifier.
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
/// Upstream base URL.
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Location of the system prompt file.
pub const SYSTEM_PROMPT_PATH: &str = "SYSTEM_PROMPT_PATH";
/// Log verbosity when `RUST_LOG` is unset; read by the binary before
/// anything else so startup is logged.
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Bind host.
pub const HOST: &str = "HOST";
/// Bind port.
pub const PORT: &str = "PORT";
/// Limits applied to every route without its own.
pub const RATE_LIMIT_DEFAULT: &str = "RATE_LIMIT_DEFAULT";
/// Limits applied to `/generate`.
pub const RATE_LIMIT_GENERATE: &str = "RATE_LIMIT_GENERATE";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4";
/// Prompt file used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT_PATH: &str = "/app/system-prompt.txt";
/// Prompt files tried, in order, when the configured one cannot be read.
pub const FALLBACK_SYSTEM_PROMPT_PATHS: [&str; 2] = ["system-prompt.txt", "../system-prompt.txt"];
/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;
/// Default limits for routes without their own.
pub const DEFAULT_RATE_LIMITS: &str = "200 per day;50 per hour";
/// Default limits for `/generate`.
pub const DEFAULT_GENERATE_RATE_LIMITS: &str = "10 per minute";

/// Maps a `LOG_LEVEL` value to a level filter, case-insensitively.
///
/// Both tracing names and the logging names used by most deployment
/// tooling (`WARNING`, `CRITICAL`, `FATAL`) are accepted. Returns `None` for
/// anything else.
pub fn parse_log_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// System instruction sent ahead of every diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPrompt {
    /// Prompt text; empty when no file could be read.
    pub text: String,
    /// File the text came from.
    pub source: Option<PathBuf>,
}

impl SystemPrompt {
    /// Loads `primary`, falling back to each of `fallbacks` in order.
    ///
    /// A missing prompt is not fatal: the result is empty and the failure is
    /// logged.
    pub fn load(primary: &Path, fallbacks: &[PathBuf]) -> Self {
        if let Some(prompt) = Self::read(primary) {
            info!(path = %primary.display(), "Successfully loaded system prompt");
            return prompt;
        }

        for path in fallbacks {
            if let Some(prompt) = Self::read(path) {
                info!(path = %path.display(), "Successfully loaded system prompt from fallback path");
                return prompt;
            }
        }

        error!(
            path = %primary.display(),
            "System prompt file not found at configured path or fallback locations"
        );
        Self::default()
    }

    /// Whether a non-empty prompt is available.
    pub fn is_loaded(&self) -> bool {
        !self.text.is_empty()
    }

    fn read(path: &Path) -> Option<Self> {
        fs::read_to_string(path).ok().map(|text| Self {
            text,
            source: Some(path.to_path_buf()),
        })
    }
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upstream API key; `None` when unset or empty.
    pub api_key: Option<String>,
    /// Upstream model identifier.
    pub model: String,
    /// Upstream base URL.
    pub base_url: String,
    /// Configured prompt file location.
    pub system_prompt_path: PathBuf,
    /// Address to listen on.
    pub bind_addr: SocketAddr,
    /// Limits for routes without their own.
    pub default_rate_limits: Vec<RateLimit>,
    /// Limits for `/generate`.
    pub generate_rate_limits: Vec<RateLimit>,
}

impl ServiceConfig {
    /// Resolves configuration from the environment, falling back to `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::from_lookup(|key| settings.get_env_var(key))
    }

    /// Resolves configuration through `lookup`, applying defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host: IpAddr = get(HOST)
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .parse()
            .with_context(|| format!("Invalid {HOST}"))?;
        let port: u16 = match get(PORT) {
            Some(port) => port.parse().with_context(|| format!("Invalid {PORT}: {port}"))?,
            None => DEFAULT_PORT,
        };

        let default_rate_limits =
            parse_rate_limits(&get(RATE_LIMIT_DEFAULT).unwrap_or_else(|| DEFAULT_RATE_LIMITS.to_string()))
                .with_context(|| format!("Invalid {RATE_LIMIT_DEFAULT}"))?;
        let generate_rate_limits = parse_rate_limits(
            &get(RATE_LIMIT_GENERATE).unwrap_or_else(|| DEFAULT_GENERATE_RATE_LIMITS.to_string()),
        )
        .with_context(|| format!("Invalid {RATE_LIMIT_GENERATE}"))?;

        Ok(Self {
            // Empty keys count as unset.
            api_key: lookup(OPENAI_API_KEY).filter(|k| !k.is_empty()),
            model: get(OPENAI_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get(OPENAI_BASE_URL)
                .unwrap_or_else(|| crate::ai::openai::DEFAULT_BASE_URL.to_string()),
            system_prompt_path: get(SYSTEM_PROMPT_PATH)
                .map_or_else(|| PathBuf::from(DEFAULT_SYSTEM_PROMPT_PATH), PathBuf::from),
            bind_addr: SocketAddr::new(host, port),
            default_rate_limits,
            generate_rate_limits,
        })
    }

    /// Loads the system prompt from the configured path or its fallbacks.
    pub fn load_system_prompt(&self) -> SystemPrompt {
        let fallbacks: Vec<PathBuf> = FALLBACK_SYSTEM_PROMPT_PATHS
            .iter()
            .map(PathBuf::from)
            .collect();
        SystemPrompt::load(&self.system_prompt_path, &fallbacks)
    }

    /// Logs configuration problems that are reported per request later.
    pub fn warn_if_incomplete(&self) {
        if self.api_key.is_none() {
            warn!("{OPENAI_API_KEY} environment variable is not set");
        }
    }
}
