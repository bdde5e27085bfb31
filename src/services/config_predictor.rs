//! Predicts the loop's starting parameters from history statistics.
//!
//! The thresholds below are fixed design constants, not configuration.

use crate::domain::models::{
    CommitFrequencyMode, CommitPatternStats, ConfigRecommendation, CycleStats, DocUpdateStrategy,
    HistoryInsights, MIN_ITERATION_BUDGET,
};

const MAX_PREDICTED_ITERATIONS: u32 = 15;
const TOOL_ACTIVITY_RATIO: f64 = 0.3;
const TOOL_ACTIVITY_BONUS: u32 = 2;
const PER_ITERATION_MAX_DAILY: f64 = 2.0;
const PER_CYCLE_MAX_DAILY: f64 = 5.0;
const FREQUENT_DOC_RATIO: f64 = 0.1;
const HIGH_VELOCITY: f64 = 5.0;
const HIGH_VELOCITY_THRESHOLD_BONUS: u32 = 5;
const MIN_LEARNING_RATE: f64 = 0.1;
const DEFAULT_CONSISTENCY: f64 = 0.5;
const DOC_KEYWORD: &str = "doc";

/// Stateless predictor; holds only the tool keyword it looks up.
#[derive(Debug, Clone)]
pub struct ConfigPredictor {
    tool_keyword: String,
}

impl ConfigPredictor {
    pub fn new(tool_keyword: impl Into<String>) -> Self {
        Self {
            tool_keyword: tool_keyword.into().to_lowercase(),
        }
    }

    /// Recommendation for the given insights; fallback defaults when
    /// history was insufficient.
    pub fn predict_from(&self, insights: &HistoryInsights) -> ConfigRecommendation {
        if !insights.sufficient || insights.patterns.total_commits == 0 {
            return ConfigRecommendation::fallback();
        }
        self.predict(
            &insights.patterns,
            &insights.cycles,
            insights.development_velocity,
        )
    }

    /// Pure mapping from statistics to parameters.
    ///
    /// `development_velocity` is the externally supplied recent commit rate.
    pub fn predict(
        &self,
        patterns: &CommitPatternStats,
        cycles: &CycleStats,
        development_velocity: f64,
    ) -> ConfigRecommendation {
        if patterns.total_commits == 0 {
            return ConfigRecommendation::fallback();
        }

        let mut max_iterations = cycles
            .average_iterations_per_cycle
            .clamp(MIN_ITERATION_BUDGET, MAX_PREDICTED_ITERATIONS);
        if patterns.keyword_ratio(&self.tool_keyword) > TOOL_ACTIVITY_RATIO {
            max_iterations += TOOL_ACTIVITY_BONUS;
        }

        let commit_frequency_mode = if patterns.average_daily_commits <= PER_ITERATION_MAX_DAILY {
            CommitFrequencyMode::PerIteration
        } else if patterns.average_daily_commits <= PER_CYCLE_MAX_DAILY {
            CommitFrequencyMode::PerCycle
        } else {
            CommitFrequencyMode::Continuous
        };

        let doc_update_strategy = if patterns.keyword_ratio(DOC_KEYWORD) > FREQUENT_DOC_RATIO {
            DocUpdateStrategy::Frequent
        } else {
            DocUpdateStrategy::Minimal
        };

        let mut error_threshold = cycles
            .offense_reduction_stats
            .average_initial_offenses
            .round()
            .max(0.0) as u32;
        if development_velocity > HIGH_VELOCITY {
            error_threshold += HIGH_VELOCITY_THRESHOLD_BONUS;
        }

        let consistency = pattern_consistency(patterns.daily_counts.values().copied());
        let learning_rate = (1.0 - consistency).max(MIN_LEARNING_RATE).clamp(0.0, 1.0);

        ConfigRecommendation {
            max_iterations,
            commit_frequency_mode,
            doc_update_strategy,
            error_threshold,
            learning_rate,
        }
    }
}

/// `max(0, 1 - stddev / mean)` of daily commit counts; 0.5 for an empty
/// series.
pub fn pattern_consistency(daily_counts: impl IntoIterator<Item = usize>) -> f64 {
    let counts: Vec<f64> = daily_counts.into_iter().map(|c| c as f64).collect();
    if counts.is_empty() {
        return DEFAULT_CONSISTENCY;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).max(0.0)
}
