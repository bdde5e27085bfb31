use async_trait::async_trait;

use crate::domain::errors::VcsError;

/// Result of a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { hash: String },
    /// Working tree was clean and an empty commit was not allowed.
    NothingToCommit,
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Stages and commits working-tree changes.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn has_changes(&self) -> Result<bool, VcsError>;

    /// Stage everything and commit with `message`.
    ///
    /// A clean tree yields [`CommitOutcome::NothingToCommit`] unless
    /// `allow_empty` is set.
    async fn commit_all(&self, message: &str, allow_empty: bool)
        -> Result<CommitOutcome, VcsError>;
}
