//! Reconstruction of past convergence-loop runs from commit messages.
//!
//! The loop commits every iteration as
//! `"<tool> development loop iteration <n>: <findings> offenses, <corrected> corrected"`
//! and closes a run with `"<tool> development loop complete: ..."`. Scanning
//! history oldest to newest recovers each run ("cycle") and how it went.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::models::{CommitRecord, CycleStats, LoopState, OffenseReductionStats};

/// Counts parsed from an iteration commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationCommit {
    pub iteration: u32,
    pub findings: u32,
    pub corrected: u32,
}

/// Generates and recognizes the loop's own commit messages.
#[derive(Debug, Clone)]
pub struct CommitTemplate {
    tool: String,
    iteration_pattern: Regex,
    terminal_marker: String,
}

impl CommitTemplate {
    pub fn new(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let iteration_pattern = Regex::new(&format!(
            r"(?i){} development loop iteration (\d+): (\d+) offenses?, (\d+) corrected",
            regex::escape(&tool)
        ))
        .expect("escaped tool name always forms a valid pattern");
        let terminal_marker = format!("{tool} development loop complete");
        Self {
            tool,
            iteration_pattern,
            terminal_marker,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Phrase shared by every loop commit, used to query history.
    pub fn search_term(&self) -> String {
        format!("{} development loop", self.tool)
    }

    pub fn iteration_message(&self, iteration: u32, findings: u32, corrected: u32) -> String {
        format!(
            "{} development loop iteration {iteration}: {findings} offenses, {corrected} corrected",
            self.tool
        )
    }

    /// Closing commit message; always begins with the terminal marker.
    pub fn terminal_message(
        &self,
        state: LoopState,
        iterations: usize,
        remaining: Option<u32>,
    ) -> String {
        let remaining = remaining.map_or_else(|| "unknown".to_string(), |n| n.to_string());
        format!(
            "{}: {} after {iterations} iterations, {remaining} offenses remaining",
            self.terminal_marker,
            state.as_str()
        )
    }

    pub fn parse_iteration(&self, message: &str) -> Option<IterationCommit> {
        let caps = self.iteration_pattern.captures(message)?;
        Some(IterationCommit {
            iteration: caps.get(1)?.as_str().parse().ok()?,
            findings: caps.get(2)?.as_str().parse().ok()?,
            corrected: caps.get(3)?.as_str().parse().ok()?,
        })
    }

    pub fn is_terminal(&self, message: &str) -> bool {
        message
            .to_lowercase()
            .contains(&self.terminal_marker.to_lowercase())
    }
}

#[derive(Debug)]
struct CycleAccumulator {
    started_at: DateTime<Utc>,
    first_findings: u32,
    corrected: u64,
    last_iteration: u32,
}

impl CycleAccumulator {
    fn open(commit: &CommitRecord, parsed: IterationCommit) -> Self {
        Self {
            started_at: commit.author_date,
            first_findings: parsed.findings,
            corrected: u64::from(parsed.corrected),
            last_iteration: parsed.iteration,
        }
    }
}

#[derive(Debug)]
struct ClosedCycle {
    cycle: CycleAccumulator,
    duration_secs: f64,
}

/// Computes [`CycleStats`] from loop commits.
#[derive(Debug, Clone)]
pub struct CycleAnalyzer {
    template: CommitTemplate,
}

impl CycleAnalyzer {
    pub fn new(template: CommitTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &CommitTemplate {
        &self.template
    }

    /// Analyze commits listed newest first; non-loop commits are ignored.
    pub fn analyze(&self, commits: &[CommitRecord]) -> CycleStats {
        // Sources list newest first; reversing keeps commits that share a
        // timestamp in commit order under the stable sort.
        let mut chronological: Vec<&CommitRecord> = commits.iter().rev().collect();
        chronological.sort_by_key(|c| c.author_date);

        let mut open: Option<CycleAccumulator> = None;
        let mut unclosed: Vec<CycleAccumulator> = Vec::new();
        let mut closed: Vec<ClosedCycle> = Vec::new();
        let mut max_iteration = 0u32;

        for commit in chronological {
            if let Some(parsed) = self.template.parse_iteration(&commit.message) {
                max_iteration = max_iteration.max(parsed.iteration);
                match open.as_mut() {
                    Some(acc) if parsed.iteration > acc.last_iteration => {
                        acc.corrected += u64::from(parsed.corrected);
                        acc.last_iteration = parsed.iteration;
                    }
                    _ => {
                        // A non-increasing iteration number starts a new run.
                        if let Some(previous) = open.take() {
                            unclosed.push(previous);
                        }
                        open = Some(CycleAccumulator::open(commit, parsed));
                    }
                }
            } else if self.template.is_terminal(&commit.message) {
                if let Some(cycle) = open.take() {
                    let duration = commit.author_date - cycle.started_at;
                    closed.push(ClosedCycle {
                        cycle,
                        duration_secs: duration.num_milliseconds().max(0) as f64 / 1000.0,
                    });
                }
            }
        }
        if let Some(cycle) = open {
            unclosed.push(cycle);
        }

        let total_cycles = closed.len() + unclosed.len();
        if total_cycles == 0 {
            return CycleStats::default();
        }

        let total_duration: f64 = closed.iter().map(|c| c.duration_secs).sum();
        let closed_corrected: u64 = closed.iter().map(|c| c.cycle.corrected).sum();
        let average_cycle_duration = if closed.is_empty() {
            0.0
        } else {
            total_duration / closed.len() as f64
        };

        let all_cycles = closed.iter().map(|c| &c.cycle).chain(unclosed.iter());
        let (initial_sum, corrected_sum) = all_cycles.fold((0u64, 0u64), |(i, c), cycle| {
            (i + u64::from(cycle.first_findings), c + cycle.corrected)
        });

        CycleStats {
            total_cycles,
            closed_cycles: closed.len(),
            average_cycle_duration,
            average_iterations_per_cycle: max_iteration,
            offense_reduction_stats: OffenseReductionStats {
                average_initial_offenses: initial_sum as f64 / total_cycles as f64,
                average_corrections: corrected_sum as f64 / total_cycles as f64,
            },
            cycle_efficiency: if total_duration > 0.0 {
                closed_corrected as f64 / total_duration
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn commit(id: &str, message: String, minutes: i64) -> CommitRecord {
        CommitRecord::new(id, message, at(minutes))
    }

    fn analyzer() -> CycleAnalyzer {
        CycleAnalyzer::new(CommitTemplate::new("rubocop"))
    }

    #[test]
    fn template_round_trip() {
        let template = CommitTemplate::new("rubocop");
        let message = template.iteration_message(3, 41, 17);
        assert_eq!(
            message,
            "rubocop development loop iteration 3: 41 offenses, 17 corrected"
        );
        assert_eq!(
            template.parse_iteration(&message),
            Some(IterationCommit {
                iteration: 3,
                findings: 41,
                corrected: 17
            })
        );
    }

    #[test]
    fn template_escapes_tool_name() {
        let template = CommitTemplate::new("eslint.v8");
        assert!(template
            .parse_iteration("eslintXv8 development loop iteration 1: 2 offenses, 1 corrected")
            .is_none());
        assert!(template
            .parse_iteration("eslint.v8 development loop iteration 1: 2 offenses, 1 corrected")
            .is_some());
    }

    #[test]
    fn terminal_message_carries_marker() {
        let template = CommitTemplate::new("rubocop");
        let message = template.terminal_message(LoopState::Converged, 3, Some(0));
        assert!(template.is_terminal(&message));
        assert!(template.parse_iteration(&message).is_none());
        assert!(message.contains("converged after 3 iterations"));
    }

    #[test]
    fn empty_history_yields_zero_stats() {
        assert_eq!(analyzer().analyze(&[]), CycleStats::default());
    }

    #[test]
    fn closed_cycle_statistics() {
        let t = CommitTemplate::new("rubocop");
        // Newest first, as history sources return them.
        let commits = vec![
            commit("d", t.terminal_message(LoopState::Converged, 3, Some(0)), 30),
            commit("c", t.iteration_message(2, 3, 2), 20),
            commit("b", t.iteration_message(1, 12, 9), 10),
            commit("a", "unrelated change".to_string(), 0),
        ];

        let stats = analyzer().analyze(&commits);
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.closed_cycles, 1);
        assert!((stats.average_cycle_duration - 1200.0).abs() < 1e-9);
        assert_eq!(stats.average_iterations_per_cycle, 2);
        assert!((stats.offense_reduction_stats.average_initial_offenses - 12.0).abs() < 1e-9);
        assert!((stats.offense_reduction_stats.average_corrections - 11.0).abs() < 1e-9);
        assert!((stats.cycle_efficiency - 11.0 / 1200.0).abs() < 1e-12);
    }

    #[test]
    fn unclosed_cycles_count_but_have_no_duration() {
        let t = CommitTemplate::new("rubocop");
        let commits = vec![
            commit("c", t.iteration_message(1, 20, 5), 50),
            commit("b", t.iteration_message(2, 8, 4), 20),
            commit("a", t.iteration_message(1, 10, 2), 10),
        ];

        let stats = analyzer().analyze(&commits);
        assert_eq!(stats.total_cycles, 2);
        assert_eq!(stats.closed_cycles, 0);
        assert_eq!(stats.average_cycle_duration, 0.0);
        assert_eq!(stats.cycle_efficiency, 0.0);
        assert_eq!(stats.average_iterations_per_cycle, 2);
        assert!((stats.offense_reduction_stats.average_initial_offenses - 15.0).abs() < 1e-9);
        assert!((stats.offense_reduction_stats.average_corrections - 5.5).abs() < 1e-9);
    }

    #[test]
    fn same_second_commits_keep_commit_order() {
        let t = CommitTemplate::new("rubocop");
        let commits = vec![
            commit("c", t.terminal_message(LoopState::Converged, 3, Some(0)), 0),
            commit("b", t.iteration_message(2, 3, 3), 0),
            commit("a", t.iteration_message(1, 12, 9), 0),
        ];

        let stats = analyzer().analyze(&commits);
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.closed_cycles, 1);
        assert_eq!(stats.average_iterations_per_cycle, 2);
        assert!((stats.offense_reduction_stats.average_initial_offenses - 12.0).abs() < 1e-9);
    }

    #[test]
    fn terminal_without_open_cycle_is_ignored() {
        let t = CommitTemplate::new("rubocop");
        let commits = vec![commit(
            "a",
            t.terminal_message(LoopState::MaxedOut, 10, Some(4)),
            0,
        )];
        assert_eq!(analyzer().analyze(&commits).total_cycles, 0);
    }

    #[test]
    fn mixed_closed_and_unclosed() {
        let t = CommitTemplate::new("rubocop");
        let commits = vec![
            commit("e", t.iteration_message(1, 6, 6), 200),
            commit("d", t.terminal_message(LoopState::Converged, 2, Some(0)), 100),
            commit("c", t.iteration_message(2, 2, 2), 60),
            commit("b", t.iteration_message(1, 4, 2), 40),
        ];

        let stats = analyzer().analyze(&commits);
        assert_eq!(stats.total_cycles, 2);
        assert_eq!(stats.closed_cycles, 1);
        assert!((stats.average_cycle_duration - 3600.0).abs() < 1e-9);
        assert!((stats.cycle_efficiency - 4.0 / 3600.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn iteration_message_round_trips(
            iteration in 1u32..10_000,
            findings in 0u32..100_000,
            corrected in 0u32..100_000,
        ) {
            let template = CommitTemplate::new("rubocop");
            let message = template.iteration_message(iteration, findings, corrected);
            prop_assert_eq!(
                template.parse_iteration(&message),
                Some(IterationCommit { iteration, findings, corrected })
            );
        }
    }
}
