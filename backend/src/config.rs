//! Configuration management for the Demand Replenishment Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DRP_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// LLM completion endpoint configuration
    pub llm: LlmConfig,

    /// Scheduler and worker configuration
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Configuration for the OpenAI-compatible completion endpoint backing the
/// LLM predictor. An empty `api_key` disables the LLM predictor and the
/// composition root falls back to the heuristic alone.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,

    /// Per-request timeout; a timed-out call counts as predictor failure.
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Hour of day (UTC) at which the daily forecast sweep fires
    pub daily_hour_utc: u32,

    /// Size of the forecast worker pool
    pub forecast_workers: usize,

    /// Sliding-window rate limit for forecast jobs (jobs per minute)
    pub forecast_jobs_per_minute: usize,

    /// Bounded queue depth per job queue
    pub queue_depth: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("DRP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("llm.endpoint", "https://api.openai.com/v1")?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.timeout_seconds", 30)?
            .set_default("scheduler.daily_hour_utc", 2)?
            .set_default("scheduler.forecast_workers", 2)?
            .set_default("scheduler.forecast_jobs_per_minute", 10)?
            .set_default("scheduler.queue_depth", 256)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DRP_ prefix)
            .add_source(
                Environment::with_prefix("DRP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
