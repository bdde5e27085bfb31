//! Version-control commit records as seen by the history analyzers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single commit pulled from the project's history.
///
/// Records are immutable once fetched; identity is the commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Commit subject line.
    pub message: String,
    /// Author timestamp.
    pub author_date: DateTime<Utc>,
    /// Paths touched by the commit (may be empty until enriched).
    #[serde(default)]
    pub changed_files: Vec<String>,
}

impl CommitRecord {
    /// Create a record without file information.
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        author_date: DateTime<Utc>,
    ) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            author_date,
            changed_files: Vec::new(),
        }
    }

    /// Attach changed file paths.
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.changed_files = files;
        self
    }
}
