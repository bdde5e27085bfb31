use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::HistoryError;
use crate::domain::models::CommitRecord;

/// Source of version-control commit records.
///
/// May be served by running git locally or by a remote gateway; callers
/// only rely on these three operations.
#[async_trait]
pub trait CommitHistorySource: Send + Sync {
    /// Most recent commits, newest first.
    async fn list_commits(&self, limit: usize) -> Result<Vec<CommitRecord>, HistoryError>;

    /// Most recent commits whose message contains `term` (case-insensitive).
    async fn list_commits_matching(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CommitRecord>, HistoryError>;

    /// Changed paths for each requested hash.
    async fn file_changes_for(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, HistoryError>;
}

/// Something holding cached data that can be dropped on request.
#[async_trait]
pub trait CacheControl: Send + Sync {
    async fn clear(&self);
}
