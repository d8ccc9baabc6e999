//! Verdict sink port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::VerdictEvent;

#[derive(Debug, Error)]
#[error("Verdict delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Destination for verdict events produced by trial runners.
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn deliver(&self, event: VerdictEvent) -> Result<(), DeliveryError>;
}
