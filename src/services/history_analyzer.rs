//! History analyzers feeding the configuration predictor.
//!
//! [`CachingHistoryAnalyzer`] reads version-control history through a
//! [`CachedHistoryReader`]; [`DefaultsHistoryAnalyzer`] is the no-op variant
//! used when history is disabled. Which one runs is decided at construction.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{CommitRecord, HistoryConfig, HistoryInsights};
use crate::domain::ports::HistoryAnalyzer;
use crate::infrastructure::history::CachedHistoryReader;
use crate::services::cycle_analyzer::{CommitTemplate, CycleAnalyzer};
use crate::services::pattern_analyzer::{DateRange, PatternAnalyzer};

/// Days used for the recent development-velocity metric.
const VELOCITY_WINDOW_DAYS: i64 = 7;

/// Always reports insufficient history, so the predictor falls back to its
/// documented defaults.
#[derive(Debug, Clone, Default)]
pub struct DefaultsHistoryAnalyzer;

impl DefaultsHistoryAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HistoryAnalyzer for DefaultsHistoryAnalyzer {
    async fn insights(&self) -> HistoryInsights {
        debug!("history analysis disabled, using defaults");
        HistoryInsights::insufficient()
    }
}

/// Limits for the history queries.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    pub commit_limit: usize,
    pub cycle_commit_limit: usize,
    pub window_days: u32,
}

impl From<&HistoryConfig> for HistoryWindow {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            commit_limit: config.commit_limit,
            cycle_commit_limit: config.cycle_commit_limit,
            window_days: config.window_days,
        }
    }
}

/// History-backed analyzer.
pub struct CachingHistoryAnalyzer {
    reader: Arc<CachedHistoryReader>,
    patterns: PatternAnalyzer,
    cycles: CycleAnalyzer,
    window: HistoryWindow,
    reference_time: Option<DateTime<Utc>>,
}

impl CachingHistoryAnalyzer {
    pub fn new(
        reader: Arc<CachedHistoryReader>,
        patterns: PatternAnalyzer,
        template: CommitTemplate,
        window: HistoryWindow,
    ) -> Self {
        Self {
            reader,
            patterns,
            cycles: CycleAnalyzer::new(template),
            window,
            reference_time: None,
        }
    }

    /// Pin "now" for date ranges and velocity.
    #[must_use]
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    async fn enrich_with_files(&self, commits: &mut [CommitRecord]) {
        let missing: Vec<String> = commits
            .iter()
            .filter(|c| c.changed_files.is_empty())
            .map(|c| c.hash.clone())
            .collect();
        if missing.is_empty() {
            return;
        }
        let mut files = self.reader.fetch_file_changes(&missing).await;
        for commit in commits.iter_mut() {
            if commit.changed_files.is_empty() {
                if let Some(paths) = files.remove(&commit.hash) {
                    commit.changed_files = paths;
                }
            }
        }
    }
}

/// Commits per day authored in the week before `now`.
pub fn development_velocity(commits: &[CommitRecord], now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(VELOCITY_WINDOW_DAYS);
    let recent = commits
        .iter()
        .filter(|c| c.author_date > since && c.author_date <= now)
        .count();
    recent as f64 / VELOCITY_WINDOW_DAYS as f64
}

#[async_trait]
impl HistoryAnalyzer for CachingHistoryAnalyzer {
    async fn insights(&self) -> HistoryInsights {
        let now = self.reference_time.unwrap_or_else(Utc::now);

        let mut commits = self.reader.fetch_commits(self.window.commit_limit).await;
        if commits.is_empty() {
            warn!(
                last_error = ?self.reader.last_error(),
                "no commit history available, predictor will use defaults"
            );
            return HistoryInsights::insufficient();
        }
        self.enrich_with_files(&mut commits).await;

        let range = DateRange::ending_at(now.date_naive(), self.window.window_days);
        let patterns = self.patterns.analyze(&commits, Some(range));

        let loop_commits = self
            .reader
            .fetch_commits_matching(
                &self.cycles.template().search_term(),
                self.window.cycle_commit_limit,
            )
            .await;
        let cycles = self.cycles.analyze(&loop_commits);
        let development_velocity = development_velocity(&commits, now);

        info!(
            commits = patterns.total_commits,
            average_daily = patterns.average_daily_commits,
            cycles = cycles.total_cycles,
            closed_cycles = cycles.closed_cycles,
            velocity = development_velocity,
            "history analyzed"
        );

        HistoryInsights {
            patterns,
            cycles,
            development_velocity,
            sufficient: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config_predictor::ConfigPredictor;
    use crate::domain::models::ConfigRecommendation;
    use crate::domain::models::LoopState;
    use crate::testing::FakeHistorySource;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn window() -> HistoryWindow {
        HistoryWindow {
            commit_limit: 100,
            cycle_commit_limit: 100,
            window_days: 14,
        }
    }

    fn analyzer(source: Arc<FakeHistorySource>) -> CachingHistoryAnalyzer {
        CachingHistoryAnalyzer::new(
            Arc::new(CachedHistoryReader::new(source)),
            PatternAnalyzer::new("rubocop", &["doc".to_string()]),
            CommitTemplate::new("rubocop"),
            window(),
        )
        .with_reference_time(now())
    }

    #[tokio::test]
    async fn defaults_analyzer_is_insufficient() {
        let insights = DefaultsHistoryAnalyzer::new().insights().await;
        assert!(!insights.sufficient);
        assert_eq!(
            ConfigPredictor::new("rubocop").predict_from(&insights),
            ConfigRecommendation::fallback()
        );
    }

    #[tokio::test]
    async fn empty_history_yields_fallback_defaults() {
        let insights = analyzer(Arc::new(FakeHistorySource::new(Vec::new())))
            .insights()
            .await;
        assert!(!insights.sufficient);
        assert_eq!(
            ConfigPredictor::new("rubocop").predict_from(&insights),
            ConfigRecommendation::fallback()
        );
    }

    #[tokio::test]
    async fn unavailable_history_is_insufficient() {
        let insights = analyzer(Arc::new(FakeHistorySource::failing("boom")))
            .insights()
            .await;
        assert!(!insights.sufficient);
    }

    #[tokio::test]
    async fn combines_patterns_cycles_and_velocity() {
        let template = CommitTemplate::new("rubocop");
        let commits = vec![
            CommitRecord::new(
                "c3",
                template.terminal_message(LoopState::Converged, 2, Some(0)),
                now() - Duration::hours(1),
            ),
            CommitRecord::new(
                "c2",
                template.iteration_message(2, 4, 4),
                now() - Duration::hours(2),
            ),
            CommitRecord::new(
                "c1",
                template.iteration_message(1, 9, 5),
                now() - Duration::hours(3),
            ),
            CommitRecord::new("c0", "Update docs", now() - Duration::days(10)),
        ];
        let mut files = HashMap::new();
        files.insert("c0".to_string(), vec!["README.md".to_string()]);
        let source = Arc::new(FakeHistorySource::new(commits).with_files(files));

        let insights = analyzer(source).insights().await;
        assert!(insights.sufficient);
        assert_eq!(insights.patterns.total_commits, 4);
        assert_eq!(insights.patterns.keyword_count("rubocop"), 3);
        assert_eq!(insights.patterns.daily_counts.len(), 14);
        assert_eq!(insights.patterns.top_files, vec![("README.md".to_string(), 1)]);
        assert_eq!(insights.cycles.total_cycles, 1);
        assert_eq!(insights.cycles.closed_cycles, 1);
        assert_eq!(insights.cycles.average_iterations_per_cycle, 2);
        assert!((insights.development_velocity - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn velocity_excludes_future_and_old_commits() {
        let commits = vec![
            CommitRecord::new("a", "x", now() + Duration::hours(1)),
            CommitRecord::new("b", "x", now() - Duration::days(8)),
            CommitRecord::new("c", "x", now() - Duration::days(1)),
        ];
        assert!((development_velocity(&commits, now()) - 1.0 / 7.0).abs() < 1e-9);
    }
}
