//! Judge client port - the external scoring service.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a judge call. None of them are retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeError {
    /// Connection could not be made or was dropped
    #[error("Transport error: {0}")]
    Transport(String),

    /// No verdict within the bounded wait
    #[error("Judge timed out after {0}s")]
    Timeout(u64),

    /// Response was not a well-formed boolean verdict
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Scores a phrase with a boolean verdict.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn judge(&self, phrase: &str) -> Result<bool, JudgeError>;
}
