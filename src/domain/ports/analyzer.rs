use async_trait::async_trait;

use crate::domain::models::HistoryInsights;

/// Produces the history-derived inputs of the configuration predictor.
///
/// Selected at construction: a caching implementation backed by a
/// [`CommitHistorySource`](super::CommitHistorySource), or a defaults-only
/// implementation when history is disabled.
#[async_trait]
pub trait HistoryAnalyzer: Send + Sync {
    async fn insights(&self) -> HistoryInsights;
}
