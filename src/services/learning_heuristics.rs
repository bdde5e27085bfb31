//! Local heuristics derived from the learning store.

use serde::Serialize;

use crate::domain::models::{ConfigRecommendation, LearningStoreEntry, MIN_ITERATION_BUDGET};

/// Summary of past runs recorded by this tool on this machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LearningHeuristics {
    /// Runs found in the store.
    pub runs: usize,
    /// Mean number of iterations per run that still had findings.
    pub typical_run_length: Option<f64>,
    /// Mean efficiency of entries that had findings.
    pub average_efficiency: Option<f64>,
}

impl LearningHeuristics {
    /// Segment entries into runs wherever the iteration index stops
    /// increasing. Final-check entries delimit runs but are not counted
    /// as iterations.
    pub fn from_entries(entries: &[LearningStoreEntry]) -> Self {
        let mut run_lengths: Vec<usize> = Vec::new();
        let mut current_len = 0usize;
        let mut previous: Option<u32> = None;

        for entry in entries {
            if previous.is_some_and(|p| entry.iteration <= p) {
                run_lengths.push(current_len);
                current_len = 0;
            }
            if is_working(entry) {
                current_len += 1;
            }
            previous = Some(entry.iteration);
        }
        if previous.is_some() {
            run_lengths.push(current_len);
        }

        let working: Vec<f64> = entries
            .iter()
            .filter(|e| is_working(e))
            .map(|e| e.efficiency)
            .collect();

        Self {
            runs: run_lengths.len(),
            typical_run_length: mean(run_lengths.iter().map(|n| *n as f64)),
            average_efficiency: mean(working.into_iter()),
        }
    }

    /// Move the iteration budget toward the typical run length by
    /// `learning_rate`, staying within `[5, ceiling]`.
    pub fn apply(&self, config: &ConfigRecommendation, ceiling: u32) -> ConfigRecommendation {
        let Some(typical) = self.typical_run_length else {
            return config.clone();
        };
        let current = f64::from(config.max_iterations);
        let blended = config.learning_rate.mul_add(typical - current, current).round();
        let upper = ceiling.max(MIN_ITERATION_BUDGET);
        ConfigRecommendation {
            max_iterations: (blended.max(0.0) as u32).clamp(MIN_ITERATION_BUDGET, upper),
            ..config.clone()
        }
    }
}

fn is_working(entry: &LearningStoreEntry) -> bool {
    entry.findings_count > 0 && !entry.final_check
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
