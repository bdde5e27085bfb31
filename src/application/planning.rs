//! Chooses the starting configuration for a run.
//!
//! History prediction first, then the local learning store blend, then
//! explicit overrides from configuration or the command line.

use serde::Serialize;
use tracing::info;

use crate::domain::models::{CommitFrequencyMode, ConfigRecommendation, HistoryInsights};
use crate::domain::ports::{HistoryAnalyzer, LearningStore};
use crate::services::{ConfigPredictor, LearningHeuristics};

/// Explicit settings that win over prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub max_iterations: Option<u32>,
    pub commit_mode: Option<CommitFrequencyMode>,
}

/// How the starting configuration was derived.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub insights: HistoryInsights,
    /// Straight from the predictor (or the fallback when prediction is off).
    pub predicted: ConfigRecommendation,
    pub heuristics: LearningHeuristics,
    /// What the loop starts with.
    pub recommendation: ConfigRecommendation,
}

pub struct Planner<'a> {
    analyzer: &'a dyn HistoryAnalyzer,
    learning: &'a dyn LearningStore,
    predictor: ConfigPredictor,
    iteration_ceiling: u32,
    use_prediction: bool,
}

impl<'a> Planner<'a> {
    pub fn new(
        tool_keyword: &str,
        analyzer: &'a dyn HistoryAnalyzer,
        learning: &'a dyn LearningStore,
        iteration_ceiling: u32,
    ) -> Self {
        Self {
            analyzer,
            learning,
            predictor: ConfigPredictor::new(tool_keyword),
            iteration_ceiling,
            use_prediction: true,
        }
    }

    /// Start from the fallback defaults instead of the history prediction.
    #[must_use]
    pub fn without_prediction(mut self) -> Self {
        self.use_prediction = false;
        self
    }

    pub async fn plan(&self, overrides: Overrides) -> Plan {
        let insights = self.analyzer.insights().await;
        let predicted = if self.use_prediction {
            self.predictor.predict_from(&insights)
        } else {
            ConfigRecommendation::fallback()
        };

        let heuristics = LearningHeuristics::from_entries(&self.learning.load_all().await);
        let mut recommendation = heuristics.apply(&predicted, self.iteration_ceiling);

        if let Some(max) = overrides.max_iterations {
            recommendation.max_iterations = max;
        }
        if let Some(mode) = overrides.commit_mode {
            recommendation.commit_frequency_mode = mode;
        }

        info!(
            sufficient_history = insights.sufficient,
            predicted_max = predicted.max_iterations,
            max_iterations = recommendation.max_iterations,
            commit_mode = %recommendation.commit_frequency_mode,
            doc_strategy = %recommendation.doc_update_strategy,
            past_runs = heuristics.runs,
            "configuration planned"
        );

        Plan {
            insights,
            predicted,
            heuristics,
            recommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::IterationOutcome;
    use crate::services::DefaultsHistoryAnalyzer;
    use crate::testing::InMemoryLearningStore;

    #[tokio::test]
    async fn empty_history_and_store_yield_fallback() {
        let analyzer = DefaultsHistoryAnalyzer::new();
        let store = InMemoryLearningStore::default();
        let plan = Planner::new("rubocop", &analyzer, &store, 30)
            .plan(Overrides::default())
            .await;
        assert_eq!(plan.recommendation, ConfigRecommendation::fallback());
        assert_eq!(plan.heuristics.runs, 0);
    }

    #[tokio::test]
    async fn learning_store_blends_budget() {
        let analyzer = DefaultsHistoryAnalyzer::new();
        // One past run that needed 20 working iterations.
        let entries = (1..=20)
            .map(|i| IterationOutcome::new(i, 10, 5).to_entry())
            .collect();
        let store = InMemoryLearningStore::with_entries(100, entries);
        let plan = Planner::new("rubocop", &analyzer, &store, 30)
            .plan(Overrides::default())
            .await;
        // round(10 + 0.1 * (20 - 10)) = 11
        assert_eq!(plan.recommendation.max_iterations, 11);
        assert_eq!(plan.predicted.max_iterations, 10);
    }

    #[tokio::test]
    async fn overrides_win() {
        let analyzer = DefaultsHistoryAnalyzer::new();
        let store = InMemoryLearningStore::default();
        let plan = Planner::new("rubocop", &analyzer, &store, 30)
            .plan(Overrides {
                max_iterations: Some(3),
                commit_mode: Some(CommitFrequencyMode::PerCycle),
            })
            .await;
        assert_eq!(plan.recommendation.max_iterations, 3);
        assert_eq!(
            plan.recommendation.commit_frequency_mode,
            CommitFrequencyMode::PerCycle
        );
    }
}
