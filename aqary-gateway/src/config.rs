//! Configuration for the gateway
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;
use std::time::Duration;

use aqary_agent::backend::gemini::{DEFAULT_BASE_URL, DEFAULT_DEEP_MODEL, DEFAULT_FAST_MODEL};
use aqary_agent::{ClientConfig, RetryPolicy};
use aqary_registry::identity::DEFAULT_ADMIN_EMAIL;
use clap::Parser;

use crate::cli::Commands;

/// Aqary Trust gateway - registry administration and property analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "aqary-gateway")]
#[command(about = "Registry administration and property analysis for Aqary Trust")]
pub struct Args {
    /// Path of the registry JSON file
    #[arg(long, env = "REGISTRY_PATH", default_value = "aqary-registry.json")]
    pub registry_path: PathBuf,

    /// Email that always resolves to the superuser
    #[arg(long, env = "ADMIN_EMAIL", default_value = DEFAULT_ADMIN_EMAIL)]
    pub admin_email: String,

    /// Identity the command runs as (required for admin and analysis commands)
    #[arg(long = "as", env = "AQARY_USER", global = true)]
    pub user: Option<String>,

    /// Gemini configuration
    #[command(flatten)]
    pub gemini: GeminiArgs,

    /// Total attempts per analysis, first try included
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value = "5")]
    pub retry_max_attempts: u32,

    /// Backoff unit in milliseconds; retry n waits n units
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value = "2000")]
    pub retry_backoff_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Gemini connection configuration
#[derive(Parser, Debug, Clone)]
pub struct GeminiArgs {
    /// Gemini API key (required for analysis commands)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini REST endpoint
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Model for quick lookups
    #[arg(long, env = "GEMINI_FAST_MODEL", default_value = DEFAULT_FAST_MODEL)]
    pub fast_model: String,

    /// Model for deeper reasoning and images
    #[arg(long, env = "GEMINI_DEEP_MODEL", default_value = DEFAULT_DEEP_MODEL)]
    pub deep_model: String,
}

impl Args {
    /// Retry settings for the analysis client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            retry: RetryPolicy {
                max_attempts: self.retry_max_attempts,
                backoff_step: Duration::from_millis(self.retry_backoff_ms),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.retry_max_attempts == 0 {
            return Err("RETRY_MAX_ATTEMPTS must be at least 1".to_string());
        }

        if !self.admin_email.contains('@') {
            return Err(format!("ADMIN_EMAIL is not an email: {}", self.admin_email));
        }

        if self.command.needs_analysis() && self.gemini.gemini_api_key.is_none() {
            return Err("GEMINI_API_KEY is required for analysis commands".to_string());
        }

        Ok(())
    }
}
