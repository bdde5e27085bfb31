//! History read directly from the local git repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::HistoryError;
use crate::domain::models::CommitRecord;
use crate::domain::ports::CommitHistorySource;

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';
const LOG_FORMAT: &str = "--pretty=format:%H%x1f%aI%x1f%s%x1e";
/// Hashes passed to a single `git show` invocation.
const SHOW_BATCH: usize = 100;

/// `CommitHistorySource` backed by `git log` / `git show`.
#[derive(Debug, Clone)]
pub struct GitHistorySource {
    repo_dir: PathBuf,
}

impl GitHistorySource {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    async fn git(&self, args: &[String]) -> Result<String, HistoryError> {
        debug!(args = ?args, "running git");
        let output = Command::new("git")
            .current_dir(&self.repo_dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // An empty repository has no HEAD; that is simply no history.
            if stderr.contains("does not have any commits") {
                return Ok(String::new());
            }
            return Err(HistoryError::CommandFailed(format!(
                "git {}: {}",
                args.first().map_or("", String::as_str),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `git log` output produced with [`LOG_FORMAT`].
pub fn parse_log(output: &str) -> Result<Vec<CommitRecord>, HistoryError> {
    output
        .split(RECORD_SEP)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let mut fields = chunk.splitn(3, FIELD_SEP);
            let (Some(hash), Some(date), Some(subject)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(HistoryError::Malformed(format!("log record: {chunk:?}")));
            };
            let date = DateTime::parse_from_rfc3339(date)
                .map_err(|e| HistoryError::Malformed(format!("author date {date:?}: {e}")))?
                .with_timezone(&Utc);
            Ok(CommitRecord::new(hash, subject, date))
        })
        .collect()
}

/// Parse `git show --name-only --pretty=format:%x1e%H` output.
pub fn parse_name_only(output: &str) -> HashMap<String, Vec<String>> {
    output
        .split(RECORD_SEP)
        .filter_map(|chunk| {
            let mut lines = chunk.lines().map(str::trim).filter(|l| !l.is_empty());
            let hash = lines.next()?;
            Some((hash.to_string(), lines.map(str::to_string).collect()))
        })
        .collect()
}

#[async_trait]
impl CommitHistorySource for GitHistorySource {
    async fn list_commits(&self, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        let args = vec![
            "log".to_string(),
            "-n".to_string(),
            limit.to_string(),
            LOG_FORMAT.to_string(),
        ];
        parse_log(&self.git(&args).await?)
    }

    async fn list_commits_matching(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CommitRecord>, HistoryError> {
        let args = vec![
            "log".to_string(),
            "-n".to_string(),
            limit.to_string(),
            "--regexp-ignore-case".to_string(),
            "--fixed-strings".to_string(),
            format!("--grep={term}"),
            LOG_FORMAT.to_string(),
        ];
        parse_log(&self.git(&args).await?)
    }

    async fn file_changes_for(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, HistoryError> {
        let mut files = HashMap::with_capacity(hashes.len());
        for batch in hashes.chunks(SHOW_BATCH) {
            let mut args = vec![
                "show".to_string(),
                "--name-only".to_string(),
                "--pretty=format:%x1e%H".to_string(),
            ];
            args.extend(batch.iter().cloned());
            match self.git(&args).await {
                Ok(output) => files.extend(parse_name_only(&output)),
                Err(e) => {
                    warn!(error = %e, batch = batch.len(), "could not read changed files");
                    return Err(e);
                }
            }
        }
        Ok(files)
    }
}
