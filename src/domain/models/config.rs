use serde::{Deserialize, Serialize};

use super::champion::DEFAULT_CHAMPION_PHRASE;

/// Main configuration structure for the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Judge service configuration
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Experiment engine configuration
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Champion phrase configuration
    #[serde(default)]
    pub champion: ChampionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
        }
    }
}

impl ServerConfig {
    /// Base URL clients use to reach this server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".ferrets/ferrets.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling JSON log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Judge service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JudgeConfig {
    /// Scoring endpoint receiving `{"input": phrase}`
    #[serde(default = "default_judge_endpoint")]
    pub endpoint: String,

    /// Bounded wait for a verdict
    #[serde(default = "default_judge_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound of the random pause before a verdict is delivered (0 disables)
    #[serde(default = "default_thinking_delay_ms")]
    pub thinking_delay_ms: u64,

    /// Webhook receiving verdict callbacks. Verdicts are delivered in-process when unset.
    #[serde(default)]
    pub callback_url: Option<String>,
}

fn default_judge_endpoint() -> String {
    "https://spark-joy.local-services.workers.dev/spark".to_string()
}

const fn default_judge_timeout_secs() -> u64 {
    30
}

const fn default_thinking_delay_ms() -> u64 {
    1000
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_judge_endpoint(),
            timeout_secs: default_judge_timeout_secs(),
            thinking_delay_ms: default_thinking_delay_ms(),
            callback_url: None,
        }
    }
}

/// Experiment engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExperimentConfig {
    /// Runs used when a create request omits `target_runs`
    #[serde(default = "default_target_runs")]
    pub default_target_runs: u32,

    /// Largest accepted `target_runs`
    #[serde(default = "default_max_target_runs")]
    pub max_target_runs: u32,

    /// Judge calls allowed in flight at once per experiment
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Bound on the wait for all trials of an experiment
    #[serde(default = "default_barrier_timeout_secs")]
    pub barrier_timeout_secs: u64,

    /// Pause after the barrier before still-pending trials are failed. Needed
    /// when `judge.callback_url` names a receiver that acknowledges before it
    /// records the verdict; this service's own webhook records first.
    #[serde(default)]
    pub settle_grace_ms: u64,
}

const fn default_target_runs() -> u32 {
    100
}

const fn default_max_target_runs() -> u32 {
    10_000
}

const fn default_max_in_flight() -> usize {
    100
}

const fn default_barrier_timeout_secs() -> u64 {
    300
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            default_target_runs: default_target_runs(),
            max_target_runs: default_max_target_runs(),
            max_in_flight: default_max_in_flight(),
            barrier_timeout_secs: default_barrier_timeout_secs(),
            settle_grace_ms: 0,
        }
    }
}

/// Champion phrase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChampionConfig {
    /// Phrase seeded when the store is empty
    #[serde(default = "default_seed_phrase")]
    pub seed_phrase: String,
}

fn default_seed_phrase() -> String {
    DEFAULT_CHAMPION_PHRASE.to_string()
}

impl Default for ChampionConfig {
    fn default() -> Self {
        Self {
            seed_phrase: default_seed_phrase(),
        }
    }
}
