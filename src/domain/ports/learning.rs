use async_trait::async_trait;

use crate::domain::models::LearningStoreEntry;

/// Bounded, append-only log of iteration outcomes.
///
/// Implementations absorb their own failures: a missing or corrupt backing
/// file reads as empty and a failed write is logged, never raised.
#[async_trait]
pub trait LearningStore: Send + Sync {
    async fn append(&self, entry: LearningStoreEntry);

    /// Retained entries, oldest first.
    async fn load_all(&self) -> Vec<LearningStoreEntry>;
}
