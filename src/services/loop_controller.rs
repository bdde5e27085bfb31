//! The convergence loop.
//!
//! Each iteration runs the analysis tool in check mode, stops on zero
//! findings or an exhausted budget, otherwise autocorrects, documents,
//! commits, and feeds the outcome to the adaptive controller and the
//! learning store. Iterations run strictly one after another.

use chrono::Utc;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::LoopResult;
use crate::domain::models::{
    CommitFrequencyMode, ConfigRecommendation, DocUpdateStrategy, IterationOutcome,
    LearningStoreEntry, LoopReport, LoopState, RuntimeDirectives,
};
use crate::domain::ports::{
    AnalysisTool, CommitOutcome, DocumentationSink, LearningStore, ParsedCount, VersionControl,
};
use crate::services::adaptive_controller::{AdaptiveController, BudgetAdjustment};
use crate::services::cycle_analyzer::CommitTemplate;
use crate::services::performance_monitor::IterationMetrics;

/// Run-level limits that are not part of the learned recommendation.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Hard upper bound for the adaptive iteration budget.
    pub iteration_ceiling: u32,
    /// Wall-clock budget, checked at iteration boundaries.
    pub max_duration: Option<Duration>,
    /// Iterations between documentation updates in `moderate` mode.
    pub moderate_interval: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            iteration_ceiling: 30,
            max_duration: None,
            moderate_interval: 3,
        }
    }
}

/// Drives one run of the loop. Consumed by [`LoopController::run`].
pub struct LoopController {
    tool: Arc<dyn AnalysisTool>,
    vcs: Arc<dyn VersionControl>,
    learning: Arc<dyn LearningStore>,
    docs: Option<Arc<dyn DocumentationSink>>,
    directives: Option<watch::Receiver<RuntimeDirectives>>,
    metrics: IterationMetrics,
    template: CommitTemplate,
    adaptive: AdaptiveController,
    settings: LoopSettings,
    config: ConfigRecommendation,
    state: LoopState,
    outcomes: Vec<IterationOutcome>,
    commits: usize,
}

impl LoopController {
    pub fn new(
        tool: Arc<dyn AnalysisTool>,
        vcs: Arc<dyn VersionControl>,
        learning: Arc<dyn LearningStore>,
        config: ConfigRecommendation,
        settings: LoopSettings,
    ) -> Self {
        let template = CommitTemplate::new(tool.name());
        Self {
            tool,
            vcs,
            learning,
            docs: None,
            directives: None,
            metrics: IterationMetrics::new(),
            template,
            adaptive: AdaptiveController::new(settings.iteration_ceiling),
            settings,
            config,
            state: LoopState::Idle,
            outcomes: Vec::new(),
            commits: 0,
        }
    }

    #[must_use]
    pub fn with_documentation(mut self, sink: Arc<dyn DocumentationSink>) -> Self {
        self.docs = Some(sink);
        self
    }

    /// Directives published by the performance monitor.
    #[must_use]
    pub fn with_directives(mut self, directives: watch::Receiver<RuntimeDirectives>) -> Self {
        self.directives = Some(directives);
        self
    }

    /// Buffer iteration durations are recorded into.
    #[must_use]
    pub fn with_metrics(mut self, metrics: IterationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &ConfigRecommendation {
        &self.config
    }

    /// Run until a terminal state. Fails only when the tool cannot be
    /// started.
    pub async fn run(mut self) -> LoopResult<LoopReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            %run_id,
            tool = self.tool.name(),
            max_iterations = self.config.max_iterations,
            commit_mode = %self.config.commit_frequency_mode,
            doc_strategy = %self.config.doc_update_strategy,
            "starting development loop"
        );

        let mut iteration = 1u32;
        let mut last_autocorrected = 0u32;
        let terminal = loop {
            if iteration > 1 && self.budget_elapsed(clock) {
                info!(iteration, "wall-clock budget exhausted");
                break LoopState::BudgetExhausted;
            }

            self.state = LoopState::Running(iteration);
            let iteration_clock = Instant::now();
            let directives = self.current_directives();

            let check = self.tool.check().await?;
            let findings = match check.count {
                ParsedCount::Unparsed => {
                    warn!(
                        iteration,
                        exit_code = ?check.exit_code,
                        "check output has no offense count, stopping"
                    );
                    break LoopState::Inconclusive;
                }
                ParsedCount::Count(n) => n,
            };

            if findings == 0 {
                info!(iteration, "no offenses detected");
                self.outcomes.push(IterationOutcome::new(iteration, 0, 0));
                break LoopState::Converged;
            }

            if iteration > self.config.max_iterations {
                info!(
                    iteration,
                    findings,
                    max_iterations = self.config.max_iterations,
                    "iteration budget exhausted"
                );
                break LoopState::MaxedOut;
            }

            let corrected = match self.tool.autocorrect().await?.count {
                ParsedCount::Count(n) => n,
                ParsedCount::Unparsed => {
                    warn!(iteration, findings, "autocorrect output has no corrected count, assuming 0");
                    0
                }
            };

            let mut outcome = IterationOutcome::new(iteration, findings, corrected);
            last_autocorrected = iteration;

            if self.should_document(iteration, directives) {
                let body = self.render_section(Some(&outcome), None);
                self.write_documentation(iteration, &body).await;
            }

            if self.should_commit_iteration(&outcome) {
                let message = self.template.iteration_message(
                    iteration,
                    outcome.findings_count,
                    outcome.corrected_count,
                );
                if self.commit_changes(iteration, &message).await {
                    outcome = outcome.mark_committed();
                }
            }

            info!(
                iteration,
                findings = outcome.findings_count,
                corrected = outcome.corrected_count,
                efficiency = outcome.efficiency,
                committed = outcome.committed,
                "iteration complete"
            );

            let decision = self.adaptive.adjust(&self.config, &outcome);
            match decision.adjustment {
                BudgetAdjustment::Unchanged => {}
                BudgetAdjustment::Raised { from, to } | BudgetAdjustment::Lowered { from, to } => {
                    info!(iteration, from, to, "iteration budget adjusted");
                }
            }
            self.config = decision.config;

            self.learning.append(outcome.to_entry()).await;
            self.outcomes.push(outcome);
            self.metrics.record(iteration_clock.elapsed());
            iteration += 1;
        };

        self.finish(run_id, terminal, last_autocorrected, started_at).await
    }

    async fn finish(
        mut self,
        run_id: Uuid,
        terminal: LoopState,
        last_autocorrected: u32,
        started_at: chrono::DateTime<Utc>,
    ) -> LoopResult<LoopReport> {
        self.state = terminal;

        let remaining = self.tool.check().await?.count.value();
        if let Some(findings) = remaining {
            self.learning
                .append(LearningStoreEntry {
                    iteration: last_autocorrected + 1,
                    findings_count: findings,
                    corrected_count: 0,
                    timestamp: Utc::now(),
                    efficiency: 0.0,
                    final_check: true,
                })
                .await;
        } else {
            warn!(state = %terminal, "final re-check output has no offense count");
        }

        if self.docs.is_some() {
            let body = self.render_section(None, Some(remaining));
            self.write_documentation(last_autocorrected + 1, &body).await;
        }

        let message = self
            .template
            .terminal_message(terminal, self.outcomes.len(), remaining);
        match self.vcs.commit_all(&message, true).await {
            Ok(CommitOutcome::Committed { hash }) => {
                self.commits += 1;
                debug!(%hash, "closing commit created");
            }
            Ok(CommitOutcome::NothingToCommit) => debug!("closing commit skipped"),
            Err(e) => warn!(error = %e, "closing commit failed"),
        }

        info!(
            %run_id,
            state = %terminal,
            iterations = self.outcomes.len(),
            remaining = ?remaining,
            commits = self.commits,
            max_iterations = self.config.max_iterations,
            "development loop finished"
        );

        Ok(LoopReport {
            run_id,
            final_state: terminal,
            outcomes: self.outcomes,
            final_config: self.config,
            remaining_findings: remaining,
            commits: self.commits,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn budget_elapsed(&self, clock: Instant) -> bool {
        self.settings
            .max_duration
            .is_some_and(|budget| clock.elapsed() >= budget)
    }

    fn current_directives(&self) -> RuntimeDirectives {
        self.directives
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or_default()
    }

    fn should_document(&self, iteration: u32, directives: RuntimeDirectives) -> bool {
        if self.docs.is_none() || directives.is_reduced() {
            return false;
        }
        match self.config.doc_update_strategy {
            DocUpdateStrategy::Frequent => true,
            DocUpdateStrategy::Moderate => iteration % self.settings.moderate_interval.max(1) == 0,
            DocUpdateStrategy::Minimal => false,
        }
    }

    fn should_commit_iteration(&self, outcome: &IterationOutcome) -> bool {
        match self.config.commit_frequency_mode {
            CommitFrequencyMode::PerIteration => true,
            CommitFrequencyMode::Continuous => outcome.corrected_count > 0,
            CommitFrequencyMode::PerCycle => false,
        }
    }

    /// Commit the working tree if it has changes. VCS failures are logged
    /// and reported as "not committed".
    async fn commit_changes(&mut self, iteration: u32, message: &str) -> bool {
        match self.vcs.has_changes().await {
            Ok(false) => {
                debug!(iteration, "working tree clean, nothing to commit");
                return false;
            }
            Ok(true) => {}
            Err(e) => {
                warn!(iteration, error = %e, "could not inspect working tree");
                return false;
            }
        }
        match self.vcs.commit_all(message, false).await {
            Ok(CommitOutcome::Committed { hash }) => {
                self.commits += 1;
                debug!(iteration, %hash, "iteration committed");
                true
            }
            Ok(CommitOutcome::NothingToCommit) => false,
            Err(e) => {
                warn!(iteration, error = %e, "commit failed");
                false
            }
        }
    }

    async fn write_documentation(&self, iteration: u32, body: &str) {
        let Some(docs) = &self.docs else {
            return;
        };
        if let Err(e) = docs.write_section(body).await {
            warn!(iteration, error = %e, "documentation update failed");
        }
    }

    /// Section body for the documentation artifact. Identical state renders
    /// identical bytes.
    fn render_section(
        &self,
        current: Option<&IterationOutcome>,
        remaining: Option<Option<u32>>,
    ) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "- Tool: `{}`", self.tool.name());
        let _ = writeln!(body, "- State: {}", self.state);
        let _ = writeln!(body, "- Max iterations: {}", self.config.max_iterations);
        let _ = writeln!(body, "- Commit mode: {}", self.config.commit_frequency_mode);
        let _ = writeln!(body, "- Documentation: {}", self.config.doc_update_strategy);
        if let Some(remaining) = remaining {
            let remaining = remaining.map_or_else(|| "unknown".to_string(), |n| n.to_string());
            let _ = writeln!(body, "- Remaining offenses: {remaining}");
        }

        let rows: Vec<&IterationOutcome> = self
            .outcomes
            .iter()
            .chain(current)
            .filter(|o| o.findings_count > 0)
            .collect();
        if !rows.is_empty() {
            body.push('\n');
            body.push_str("| Iteration | Offenses | Corrected | Efficiency |\n");
            body.push_str("|---:|---:|---:|---:|\n");
            for o in rows {
                let _ = writeln!(
                    body,
                    "| {} | {} | {} | {:.0}% |",
                    o.iteration,
                    o.findings_count,
                    o.corrected_count,
                    o.efficiency * 100.0
                );
            }
        }
        body
    }
}
