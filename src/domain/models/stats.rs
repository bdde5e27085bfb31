//! Statistics derived from commit history.
//!
//! Everything here is recomputed per run and carries no identity of its own.
//! `Default` yields the zero-valued form used when history is unavailable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commit counts bucketed by hour of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistribution {
    /// Hours `[6, 12)`.
    pub morning: usize,
    /// Hours `[12, 18)`.
    pub afternoon: usize,
    /// Hours `[18, 24)`.
    pub evening: usize,
    /// Hours `[0, 6)`.
    pub night: usize,
}

impl TimeDistribution {
    /// Count one commit authored at `hour` (0-23).
    pub fn record(&mut self, hour: u32) {
        match hour {
            0..=5 => self.night += 1,
            6..=11 => self.morning += 1,
            12..=17 => self.afternoon += 1,
            _ => self.evening += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.morning + self.afternoon + self.evening + self.night
    }
}

/// Commit message length summary, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageLengthStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

/// Patterns observed across a window of commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitPatternStats {
    /// Number of commits analyzed.
    pub total_commits: usize,
    /// Commits divided by distinct days that had at least one commit.
    pub average_daily_commits: f64,
    /// Days with more than three commits.
    pub peak_days: Vec<NaiveDate>,
    /// Days with no commits inside the supplied date range.
    pub quiet_days: Vec<NaiveDate>,
    /// Commits per day over the span between oldest and newest commit.
    pub commit_velocity: f64,
    /// Commits mentioning each vocabulary keyword (at most once per commit).
    pub keyword_counts: BTreeMap<String, usize>,
    pub message_length_stats: MessageLengthStats,
    /// Hour of day with the most commits.
    pub peak_hour: u32,
    pub time_distribution: TimeDistribution,
    /// Per-day commit counts; includes zero days when a range was supplied.
    pub daily_counts: BTreeMap<NaiveDate, usize>,
    /// Most frequently changed paths, descending.
    pub top_files: Vec<(String, usize)>,
    /// Maximal runs of consecutive commits that mention the tool keyword.
    pub tool_commit_clusters: usize,
}

impl CommitPatternStats {
    /// Count recorded for `keyword`, zero when absent.
    pub fn keyword_count(&self, keyword: &str) -> usize {
        self.keyword_counts
            .get(&keyword.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Fraction of analyzed commits that mention `keyword`.
    pub fn keyword_ratio(&self, keyword: &str) -> f64 {
        if self.total_commits == 0 {
            return 0.0;
        }
        self.keyword_count(keyword) as f64 / self.total_commits as f64
    }
}

/// How much each reconstructed cycle started with and fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OffenseReductionStats {
    /// Mean findings reported by the first iteration of each cycle.
    pub average_initial_offenses: f64,
    /// Mean total corrections per cycle.
    pub average_corrections: f64,
}

/// Statistics over past convergence-loop runs reconstructed from commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Closed and unclosed cycles.
    pub total_cycles: usize,
    /// Cycles that reached a terminal marker.
    pub closed_cycles: usize,
    /// Mean duration of closed cycles, in seconds.
    pub average_cycle_duration: f64,
    /// Highest iteration number seen in any cycle.
    pub average_iterations_per_cycle: u32,
    pub offense_reduction_stats: OffenseReductionStats,
    /// Corrections per second across closed cycles.
    pub cycle_efficiency: f64,
}

/// Everything the predictor needs from history, bundled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryInsights {
    pub patterns: CommitPatternStats,
    pub cycles: CycleStats,
    /// Recent commits per day; the predictor's external velocity metric.
    pub development_velocity: f64,
    /// False when the history source returned nothing usable.
    pub sufficient: bool,
}

impl HistoryInsights {
    /// Zero-valued insights flagged as insufficient.
    pub fn insufficient() -> Self {
        Self::default()
    }
}
