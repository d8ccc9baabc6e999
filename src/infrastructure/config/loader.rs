use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".ferrets";

/// Environment variable prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "FERRETS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Server port cannot be 0")]
    InvalidPort,

    #[error("Judge endpoint cannot be empty")]
    EmptyJudgeEndpoint,

    #[error("Invalid judge timeout: {0}s. Must be at least 1")]
    InvalidJudgeTimeout(u64),

    #[error("Invalid default_target_runs: {0}. Must be between 1 and max_target_runs ({1})")]
    InvalidDefaultTargetRuns(u32, u32),

    #[error("Invalid max_in_flight: {0}. Must be at least 1")]
    InvalidMaxInFlight(usize),

    #[error("Invalid barrier timeout: {0}s. Must be at least 1")]
    InvalidBarrierTimeout(u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ferrets/config.yaml (project config)
    /// 3. .ferrets/local.yaml (project local overrides, optional)
    /// 4. Environment variables (FERRETS_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.judge.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyJudgeEndpoint);
        }

        if config.judge.timeout_secs == 0 {
            return Err(ConfigError::InvalidJudgeTimeout(config.judge.timeout_secs));
        }

        if let Some(url) = &config.judge.callback_url {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "judge.callback_url cannot be empty when set".to_string(),
                ));
            }
        }

        let experiment = &config.experiment;
        if experiment.default_target_runs == 0
            || experiment.default_target_runs > experiment.max_target_runs
        {
            return Err(ConfigError::InvalidDefaultTargetRuns(
                experiment.default_target_runs,
                experiment.max_target_runs,
            ));
        }

        if experiment.max_in_flight == 0 {
            return Err(ConfigError::InvalidMaxInFlight(experiment.max_in_flight));
        }

        if experiment.barrier_timeout_secs == 0 {
            return Err(ConfigError::InvalidBarrierTimeout(
                experiment.barrier_timeout_secs,
            ));
        }

        if config.champion.seed_phrase.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "champion.seed_phrase cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
