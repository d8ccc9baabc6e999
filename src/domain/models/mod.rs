//! Domain models.

pub mod champion;
pub mod config;
pub mod experiment;
pub mod trial;

pub use champion::{ChampionPhrase, DEFAULT_CHAMPION_PHRASE};
pub use config::{
    ChampionConfig, Config, DatabaseConfig, ExperimentConfig, JudgeConfig, LoggingConfig,
    ServerConfig,
};
pub use experiment::{win_rate, Experiment, ExperimentResults, ExperimentStatus, Variant};
pub use trial::{ResolveOutcome, Trial, TrialStatus, VerdictEvent};
