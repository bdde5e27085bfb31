//! Runtime nudging of the iteration budget from per-iteration efficiency.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::models::{ConfigRecommendation, IterationOutcome, MIN_ITERATION_BUDGET};

const LOW_EFFICIENCY: f64 = 0.3;
const HIGH_EFFICIENCY: f64 = 0.8;
const LOW_EFFICIENCY_BONUS: u32 = 2;
const HEADROOM: u32 = 2;

/// What the controller did to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAdjustment {
    Unchanged,
    Raised { from: u32, to: u32 },
    Lowered { from: u32, to: u32 },
}

/// Result of applying the rule to one outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveDecision {
    pub config: ConfigRecommendation,
    pub adjustment: BudgetAdjustment,
}

/// Applies a single-direction, bounded budget nudge after each iteration.
///
/// - efficiency below 0.3 with more than two iterations of headroom raises
///   the budget by 2 (never above the ceiling);
/// - efficiency above 0.8 lowers it by 1 (never below 5).
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveController {
    ceiling: u32,
}

impl AdaptiveController {
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling: ceiling.max(MIN_ITERATION_BUDGET),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Returns an updated copy of `config`; the input is left untouched.
    pub fn adjust(
        &self,
        config: &ConfigRecommendation,
        outcome: &IterationOutcome,
    ) -> AdaptiveDecision {
        let unchanged = AdaptiveDecision {
            config: config.clone(),
            adjustment: BudgetAdjustment::Unchanged,
        };
        if outcome.findings_count == 0 {
            return unchanged;
        }

        let current = config.max_iterations;
        let efficiency = outcome.efficiency;

        let next = if efficiency < LOW_EFFICIENCY && outcome.iteration + HEADROOM < current {
            (current + LOW_EFFICIENCY_BONUS).min(self.ceiling.max(current))
        } else if efficiency > HIGH_EFFICIENCY && current > MIN_ITERATION_BUDGET {
            (current - 1).max(MIN_ITERATION_BUDGET)
        } else {
            current
        };

        let adjustment = match next.cmp(&current) {
            std::cmp::Ordering::Greater => BudgetAdjustment::Raised {
                from: current,
                to: next,
            },
            std::cmp::Ordering::Less => BudgetAdjustment::Lowered {
                from: current,
                to: next,
            },
            std::cmp::Ordering::Equal => return unchanged,
        };

        debug!(
            iteration = outcome.iteration,
            efficiency,
            from = current,
            to = next,
            "adjusted iteration budget"
        );

        AdaptiveDecision {
            config: ConfigRecommendation {
                max_iterations: next,
                ..config.clone()
            },
            adjustment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(max_iterations: u32) -> ConfigRecommendation {
        ConfigRecommendation {
            max_iterations,
            ..ConfigRecommendation::fallback()
        }
    }

    #[test]
    fn low_efficiency_raises_budget() {
        let controller = AdaptiveController::new(30);
        let decision = controller.adjust(&config(10), &IterationOutcome::new(1, 10, 2));
        assert_eq!(decision.config.max_iterations, 12);
        assert_eq!(
            decision.adjustment,
            BudgetAdjustment::Raised { from: 10, to: 12 }
        );
    }

    #[test]
    fn low_efficiency_near_the_end_is_ignored() {
        let controller = AdaptiveController::new(30);
        // iteration 8 is not < 10 - 2
        let decision = controller.adjust(&config(10), &IterationOutcome::new(8, 10, 2));
        assert_eq!(decision.config.max_iterations, 10);
        assert_eq!(decision.adjustment, BudgetAdjustment::Unchanged);
    }

    #[test]
    fn raise_respects_ceiling() {
        let controller = AdaptiveController::new(11);
        let decision = controller.adjust(&config(10), &IterationOutcome::new(1, 10, 0));
        assert_eq!(decision.config.max_iterations, 11);
        let decision = controller.adjust(&decision.config, &IterationOutcome::new(2, 10, 0));
        assert_eq!(decision.config.max_iterations, 11);
    }

    #[test]
    fn zero_findings_is_skipped() {
        let controller = AdaptiveController::new(30);
        let decision = controller.adjust(&config(10), &IterationOutcome::new(1, 0, 0));
        assert_eq!(decision.adjustment, BudgetAdjustment::Unchanged);
    }

    #[test]
    fn moderate_efficiency_is_unchanged() {
        let controller = AdaptiveController::new(30);
        let decision = controller.adjust(&config(10), &IterationOutcome::new(1, 10, 5));
        assert_eq!(decision.config, config(10));
    }

    #[test]
    fn six_high_efficiency_iterations_settle_at_floor() {
        let controller = AdaptiveController::new(30);
        let mut current = config(10);
        for iteration in 1..=6 {
            let before = current.max_iterations;
            let decision = controller.adjust(&current, &IterationOutcome::new(iteration, 10, 9));
            assert!(before - decision.config.max_iterations <= 1);
            assert!(decision.config.max_iterations >= 5);
            current = decision.config;
        }
        assert_eq!(current.max_iterations, 5);
    }

    #[test]
    fn adjust_does_not_touch_input() {
        let controller = AdaptiveController::new(30);
        let original = config(10);
        let _ = controller.adjust(&original, &IterationOutcome::new(1, 10, 10));
        assert_eq!(original.max_iterations, 10);
    }

    proptest! {
        #[test]
        fn budget_never_below_floor_and_moves_at_most_two(
            start in 1u32..40,
            steps in proptest::collection::vec((1u32..200, 0u32..200), 1..50),
        ) {
            let controller = AdaptiveController::new(30);
            let mut current = config(start.max(MIN_ITERATION_BUDGET));
            for (index, (findings, corrected)) in steps.into_iter().enumerate() {
                let outcome = IterationOutcome::new(index as u32 + 1, findings, corrected);
                let next = controller.adjust(&current, &outcome).config;
                let delta = i64::from(next.max_iterations) - i64::from(current.max_iterations);
                prop_assert!(delta.abs() <= 2);
                prop_assert!(next.max_iterations >= MIN_ITERATION_BUDGET);
                current = next;
            }
        }
    }
}
