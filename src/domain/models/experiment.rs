//! Experiment domain model.
//!
//! An experiment is a bounded A/B comparison between the champion phrase
//! (variant A, snapshotted at creation) and a challenger (variant B).
//! Status only ever moves `Active -> Completed`, through [`Experiment::complete`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Lifecycle status of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Trials are being dispatched or awaited
    Active,
    /// Results tallied and champion promoted
    Completed,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        matches!((self, new_status), (Self::Active, Self::Completed))
    }
}

/// Experiment variant label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }

    /// Pick the winner from two win rates. Ties go to A.
    pub fn winner(rate_a: f64, rate_b: f64) -> Self {
        if rate_a >= rate_b {
            Self::A
        } else {
            Self::B
        }
    }
}

/// Wins over total, with an empty side scoring 0.0.
pub fn win_rate(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(total)
    }
}

/// Aggregated outcome of a completed experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub winner: Variant,
    pub variant_a_wins: u32,
    pub variant_a_total: u32,
    pub variant_b_wins: u32,
    pub variant_b_total: u32,
}

impl ExperimentResults {
    /// Build results from raw tallies, deciding the winner.
    pub fn from_tallies(a_wins: u32, a_total: u32, b_wins: u32, b_total: u32) -> Self {
        let winner = Variant::winner(win_rate(a_wins, a_total), win_rate(b_wins, b_total));
        Self {
            winner,
            variant_a_wins: a_wins,
            variant_a_total: a_total,
            variant_b_wins: b_wins,
            variant_b_total: b_total,
        }
    }

    pub fn variant_a_rate(&self) -> f64 {
        win_rate(self.variant_a_wins, self.variant_a_total)
    }

    pub fn variant_b_rate(&self) -> f64 {
        win_rate(self.variant_b_wins, self.variant_b_total)
    }

    pub fn counted_trials(&self) -> u32 {
        self.variant_a_total + self.variant_b_total
    }
}

/// A champion-vs-challenger experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: Uuid,
    pub name: String,
    /// Champion phrase at creation time
    pub variant_a_phrase: String,
    /// Challenger phrase
    pub variant_b_phrase: String,
    pub status: ExperimentStatus,
    pub target_runs: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present once completed
    pub results: Option<ExperimentResults>,
}

impl Experiment {
    /// Create a new active experiment.
    pub fn new(
        name: impl Into<String>,
        variant_a_phrase: impl Into<String>,
        variant_b_phrase: impl Into<String>,
        target_runs: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            variant_a_phrase: variant_a_phrase.into(),
            variant_b_phrase: variant_b_phrase.into(),
            status: ExperimentStatus::Active,
            target_runs,
            created_at: Utc::now(),
            completed_at: None,
            results: None,
        }
    }

    /// Validate the experiment definition.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("experiment name cannot be empty".to_string());
        }
        if self.variant_b_phrase.trim().is_empty() {
            return Err("variant_b_phrase cannot be empty".to_string());
        }
        if self.target_runs == 0 {
            return Err("target_runs must be at least 1".to_string());
        }
        if self.variant_a_phrase == self.variant_b_phrase {
            return Err("variant_b_phrase must differ from the champion phrase".to_string());
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == ExperimentStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExperimentStatus::Completed
    }

    pub fn phrase_for(&self, variant: Variant) -> &str {
        match variant {
            Variant::A => &self.variant_a_phrase,
            Variant::B => &self.variant_b_phrase,
        }
    }

    /// Classify a trial phrase. A is checked first so a phrase is never counted twice.
    pub fn variant_of(&self, phrase: &str) -> Option<Variant> {
        if phrase == self.variant_a_phrase {
            Some(Variant::A)
        } else if phrase == self.variant_b_phrase {
            Some(Variant::B)
        } else {
            None
        }
    }

    /// Phrase of the winning variant, once completed.
    pub fn winning_phrase(&self) -> Option<&str> {
        self.results.map(|r| self.phrase_for(r.winner))
    }

    /// Record results and move to `Completed`.
    pub fn complete(&mut self, results: ExperimentResults) -> DomainResult<()> {
        if !self.status.can_transition_to(ExperimentStatus::Completed) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: ExperimentStatus::Completed.as_str().to_string(),
            });
        }
        self.results = Some(results);
        self.status = ExperimentStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}
