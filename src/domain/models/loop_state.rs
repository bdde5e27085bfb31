//! Loop controller states and the end-of-run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::iteration::IterationOutcome;
use super::recommendation::ConfigRecommendation;

/// Where the convergence loop is.
///
/// `Idle -> Running(n) -> Running(n + 1) | <terminal>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "iteration")]
pub enum LoopState {
    Idle,
    Running(u32),
    /// A check pass reported zero findings.
    Converged,
    /// The iteration budget ran out with findings remaining.
    MaxedOut,
    /// The configured wall-clock budget elapsed.
    BudgetExhausted,
    /// The check output could not be parsed; convergence is unknown.
    Inconclusive,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Converged | Self::MaxedOut | Self::BudgetExhausted | Self::Inconclusive
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running(_) => "running",
            Self::Converged => "converged",
            Self::MaxedOut => "maxed_out",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running(n) => write!(f, "running (iteration {n})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    pub run_id: Uuid,
    pub final_state: LoopState,
    pub outcomes: Vec<IterationOutcome>,
    /// Configuration at the end of the run, after adaptive adjustments.
    pub final_config: ConfigRecommendation,
    /// Findings reported by the terminal re-check, if it parsed.
    pub remaining_findings: Option<u32>,
    /// Commits created, including the closing commit.
    pub commits: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoopReport {
    /// Iterations that recorded an outcome.
    pub fn iterations(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_corrected(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| u64::from(o.corrected_count))
            .sum()
    }

    /// Both convergence and an exhausted budget count as running to completion.
    pub fn completed(&self) -> bool {
        self.final_state.is_terminal()
    }
}
