//! Read-through cache in front of a [`CommitHistorySource`].
//!
//! Results are cached for the lifetime of the process under a composite key
//! of operation and arguments. Failures are never cached: they are logged,
//! remembered as the last error, and surface as an empty result that callers
//! must read as "insufficient data".

use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::domain::errors::HistoryError;
use crate::domain::models::CommitRecord;
use crate::domain::ports::{CacheControl, CommitHistorySource};

/// Upper bound on distinct cached queries.
const HISTORY_CACHE_MAX_CAPACITY: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Commits { limit: usize },
    Matching { term: String, limit: usize },
    FileChanges { hashes: Vec<String> },
}

#[derive(Debug, Clone)]
enum CachedValue {
    Commits(Arc<Vec<CommitRecord>>),
    FileChanges(Arc<HashMap<String, Vec<String>>>),
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Caching decorator for any history source.
pub struct CachedHistoryReader {
    source: Arc<dyn CommitHistorySource>,
    cache: Cache<CacheKey, CachedValue>,
    last_error: Mutex<Option<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedHistoryReader {
    pub fn new(source: Arc<dyn CommitHistorySource>) -> Self {
        Self {
            source,
            cache: Cache::builder()
                .max_capacity(HISTORY_CACHE_MAX_CAPACITY)
                .build(),
            last_error: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Most recent commits, newest first.
    pub async fn fetch_commits(&self, limit: usize) -> Vec<CommitRecord> {
        let key = CacheKey::Commits { limit };
        if let Some(CachedValue::Commits(records)) = self.lookup(&key).await {
            return records.as_ref().clone();
        }
        let result = self.source.list_commits(limit).await;
        self.store_commits(key, "list_commits", result).await
    }

    /// Most recent commits whose message contains `term`.
    pub async fn fetch_commits_matching(&self, term: &str, limit: usize) -> Vec<CommitRecord> {
        let key = CacheKey::Matching {
            term: term.to_string(),
            limit,
        };
        if let Some(CachedValue::Commits(records)) = self.lookup(&key).await {
            return records.as_ref().clone();
        }
        let result = self.source.list_commits_matching(term, limit).await;
        self.store_commits(key, "list_commits_matching", result).await
    }

    /// Changed paths per hash.
    pub async fn fetch_file_changes(&self, hashes: &[String]) -> HashMap<String, Vec<String>> {
        if hashes.is_empty() {
            return HashMap::new();
        }
        let key = CacheKey::FileChanges {
            hashes: hashes.to_vec(),
        };
        if let Some(CachedValue::FileChanges(files)) = self.lookup(&key).await {
            return files.as_ref().clone();
        }
        match self.source.file_changes_for(hashes).await {
            Ok(files) => {
                let files = Arc::new(files);
                self.cache
                    .insert(key, CachedValue::FileChanges(Arc::clone(&files)))
                    .await;
                files.as_ref().clone()
            }
            Err(err) => {
                self.record_failure("file_changes_for", &err);
                HashMap::new()
            }
        }
    }

    /// Message of the most recent source failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CachedValue> {
        let value = self.cache.get(key).await;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(?key, "history cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    async fn store_commits(
        &self,
        key: CacheKey,
        operation: &'static str,
        result: Result<Vec<CommitRecord>, HistoryError>,
    ) -> Vec<CommitRecord> {
        match result {
            Ok(records) => {
                let records = Arc::new(records);
                // Whole-value replacement; concurrent duplicate fetches just
                // overwrite each other with equivalent data.
                self.cache
                    .insert(key, CachedValue::Commits(Arc::clone(&records)))
                    .await;
                records.as_ref().clone()
            }
            Err(err) => {
                self.record_failure(operation, &err);
                Vec::new()
            }
        }
    }

    fn record_failure(&self, operation: &'static str, err: &HistoryError) {
        warn!(operation, error = %err, "history source unavailable, treating as insufficient data");
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(err.to_string());
        }
    }
}

#[async_trait]
impl CacheControl for CachedHistoryReader {
    async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("history cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHistorySource;
    use chrono::Utc;

    fn records(n: usize) -> Vec<CommitRecord> {
        (0..n)
            .map(|i| CommitRecord::new(format!("h{i}"), format!("commit {i}"), Utc::now()))
            .collect()
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let source = Arc::new(FakeHistorySource::new(records(3)));
        let reader = CachedHistoryReader::new(source.clone());

        assert_eq!(reader.fetch_commits(10).await.len(), 3);
        assert_eq!(reader.fetch_commits(10).await.len(), 3);
        assert_eq!(source.calls(), 1);
        assert_eq!(reader.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn different_arguments_use_different_keys() {
        let source = Arc::new(FakeHistorySource::new(records(5)));
        let reader = CachedHistoryReader::new(source.clone());

        assert_eq!(reader.fetch_commits(2).await.len(), 2);
        assert_eq!(reader.fetch_commits(5).await.len(), 5);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_empty_and_not_cached() {
        let source = Arc::new(FakeHistorySource::failing("connection refused"));
        let reader = CachedHistoryReader::new(source.clone());

        assert!(reader.fetch_commits(10).await.is_empty());
        assert!(reader.fetch_commits_matching("rubocop", 10).await.is_empty());
        assert!(reader.last_error().unwrap().contains("connection refused"));
        assert!(reader.fetch_commits(10).await.is_empty());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let source = Arc::new(FakeHistorySource::new(records(1)));
        let reader = CachedHistoryReader::new(source.clone());

        reader.fetch_commits(10).await;
        reader.clear().await;
        reader.fetch_commits(10).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn file_changes_are_cached_per_hash_set() {
        let mut files = HashMap::new();
        files.insert("h0".to_string(), vec!["lib/a.rb".to_string()]);
        let source = Arc::new(FakeHistorySource::new(records(1)).with_files(files));
        let reader = CachedHistoryReader::new(source.clone());

        let hashes = vec!["h0".to_string()];
        assert_eq!(reader.fetch_file_changes(&hashes).await["h0"], vec!["lib/a.rb"]);
        reader.fetch_file_changes(&hashes).await;
        assert!(reader.fetch_file_changes(&[]).await.is_empty());
        assert_eq!(source.calls(), 1);
    }
}
