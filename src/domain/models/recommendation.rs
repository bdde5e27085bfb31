//! Loop operating parameters predicted from history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound for the iteration budget, both predicted and adapted.
pub const MIN_ITERATION_BUDGET: u32 = 5;

/// When the loop commits its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFrequencyMode {
    /// Commit after every iteration that left changes.
    PerIteration,
    /// Only the closing commit at the end of the cycle.
    PerCycle,
    /// Commit after iterations that corrected something.
    Continuous,
}

impl CommitFrequencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerIteration => "per_iteration",
            Self::PerCycle => "per_cycle",
            Self::Continuous => "continuous",
        }
    }
}

impl Default for CommitFrequencyMode {
    fn default() -> Self {
        Self::PerIteration
    }
}

impl fmt::Display for CommitFrequencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitFrequencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_iteration" => Ok(Self::PerIteration),
            "per_cycle" => Ok(Self::PerCycle),
            "continuous" => Ok(Self::Continuous),
            other => Err(format!("unknown commit frequency mode: {other}")),
        }
    }
}

/// How often the documentation section is regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocUpdateStrategy {
    Frequent,
    Moderate,
    Minimal,
}

impl DocUpdateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frequent => "frequent",
            Self::Moderate => "moderate",
            Self::Minimal => "minimal",
        }
    }
}

impl fmt::Display for DocUpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters the loop starts with.
///
/// Produced once by the predictor, then owned by the loop controller as its
/// runtime configuration. The adaptive controller hands back updated copies
/// rather than mutating shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecommendation {
    /// Iteration budget, at least 1.
    pub max_iterations: u32,
    pub commit_frequency_mode: CommitFrequencyMode,
    pub doc_update_strategy: DocUpdateStrategy,
    /// Expected initial offense count for the project. Advisory: reported
    /// by `predict` and `run --json`, never read by the loop itself.
    pub error_threshold: u32,
    /// Weight given to locally learned heuristics, in `[0, 1]`.
    pub learning_rate: f64,
}

impl ConfigRecommendation {
    /// Parameters used when history gives nothing to learn from.
    pub fn fallback() -> Self {
        Self {
            max_iterations: 10,
            commit_frequency_mode: CommitFrequencyMode::PerIteration,
            doc_update_strategy: DocUpdateStrategy::Moderate,
            error_threshold: 10,
            learning_rate: 0.1,
        }
    }
}

impl Default for ConfigRecommendation {
    fn default() -> Self {
        Self::fallback()
    }
}
