//! Trial domain model.
//!
//! A trial is one phrase submission and its eventual verdict from the judge.
//! Trials are append-only: they are created before the judge is called and
//! settle exactly once, either with a verdict or as failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    /// Dispatched, verdict not yet received
    #[default]
    Pending,
    /// Verdict received
    Resolved,
    /// Judge call or verdict delivery failed; no verdict will arrive
    Failed,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "resolved" => Some(Self::Resolved),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Resolved and failed trials never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One phrase submitted to the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub phrase: String,
    pub status: TrialStatus,
    /// Only set once the trial is resolved
    pub verdict: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Set when the trial was dispatched by an experiment
    pub experiment_id: Option<Uuid>,
    pub failure_reason: Option<String>,
}

impl Trial {
    /// Create a new pending trial for a phrase.
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phrase: phrase.into(),
            status: TrialStatus::Pending,
            verdict: None,
            created_at: Utc::now(),
            resolved_at: None,
            experiment_id: None,
            failure_reason: None,
        }
    }

    /// Tag the trial as part of an experiment.
    pub fn for_experiment(mut self, experiment_id: Uuid) -> Self {
        self.experiment_id = Some(experiment_id);
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.status == TrialStatus::Resolved
    }

    /// True when the judge was pleased with the phrase.
    pub fn sparked_joy(&self) -> bool {
        self.is_resolved() && self.verdict == Some(true)
    }
}

/// Verdict event emitted by the trial runner and consumed by the callback ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictEvent {
    #[serde(alias = "affirmation_id")]
    pub trial_id: Uuid,
    #[serde(alias = "joy_sparked")]
    pub verdict: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl VerdictEvent {
    pub fn new(trial_id: Uuid, verdict: bool) -> Self {
        Self {
            trial_id,
            verdict,
            timestamp: Utc::now(),
        }
    }
}

/// Result of trying to settle a trial in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The trial moved out of `pending`
    Settled,
    /// The trial had already been resolved or failed; nothing changed
    AlreadySettled,
    /// No trial with that id exists
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trial_is_pending() {
        let trial = Trial::new("You are wonderful");
        assert_eq!(trial.status, TrialStatus::Pending);
        assert!(trial.verdict.is_none());
        assert!(trial.resolved_at.is_none());
        assert!(trial.experiment_id.is_none());
        assert!(!trial.sparked_joy());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [TrialStatus::Pending, TrialStatus::Resolved, TrialStatus::Failed] {
            assert_eq!(TrialStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TrialStatus::from_str("RESOLVED"), Some(TrialStatus::Resolved));
        assert_eq!(TrialStatus::from_str("lost"), None);
        assert!(!TrialStatus::Pending.is_terminal());
        assert!(TrialStatus::Failed.is_terminal());
    }

    #[test]
    fn test_verdict_event_accepts_legacy_field_names() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"affirmation_id": "{id}", "joy_sparked": true}}"#);
        let event: VerdictEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.trial_id, id);
        assert!(event.verdict);
    }
}
