//! Per-iteration outcomes and their persisted learning-store form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ratio of corrected to detected findings, bounded to `[0, 1]`.
///
/// Returns `0.0` when nothing was detected.
pub fn efficiency(findings: u32, corrected: u32) -> f64 {
    if findings == 0 {
        return 0.0;
    }
    (f64::from(corrected.min(findings)) / f64::from(findings)).clamp(0.0, 1.0)
}

/// What happened in one pass of the convergence loop.
///
/// Created once per iteration and never mutated afterwards; the only
/// post-construction change is [`IterationOutcome::mark_committed`], which
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationOutcome {
    /// 1-based iteration index within the run.
    pub iteration: u32,
    /// Findings reported by the check pass.
    pub findings_count: u32,
    /// Findings fixed by the autocorrect pass (never above `findings_count`).
    pub corrected_count: u32,
    /// When the outcome was recorded.
    pub timestamp: DateTime<Utc>,
    /// Whether the iteration's changes were committed.
    pub committed: bool,
    /// `corrected_count / findings_count`.
    pub efficiency: f64,
}

impl IterationOutcome {
    /// Build an uncommitted outcome, clamping the corrected count.
    pub fn new(iteration: u32, findings_count: u32, corrected_count: u32) -> Self {
        Self::at(iteration, findings_count, corrected_count, Utc::now())
    }

    /// Build an outcome with an explicit timestamp.
    pub fn at(
        iteration: u32,
        findings_count: u32,
        corrected_count: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let corrected_count = corrected_count.min(findings_count);
        Self {
            iteration,
            findings_count,
            corrected_count,
            timestamp,
            committed: false,
            efficiency: efficiency(findings_count, corrected_count),
        }
    }

    /// Same outcome, flagged as committed.
    #[must_use]
    pub fn mark_committed(self) -> Self {
        Self {
            committed: true,
            ..self
        }
    }

    /// Learning-store representation of this outcome.
    pub fn to_entry(&self) -> LearningStoreEntry {
        LearningStoreEntry {
            iteration: self.iteration,
            findings_count: self.findings_count,
            corrected_count: self.corrected_count,
            timestamp: self.timestamp,
            efficiency: self.efficiency,
            final_check: false,
        }
    }
}

/// Persisted record of an iteration, kept in a bounded append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStoreEntry {
    pub iteration: u32,
    pub findings_count: u32,
    pub corrected_count: u32,
    pub timestamp: DateTime<Utc>,
    pub efficiency: f64,
    /// Terminal re-check recorded at finalization; no autocorrect ran.
    #[serde(default)]
    pub final_check: bool,
}
