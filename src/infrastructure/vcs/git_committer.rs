//! Stages and commits the working tree with the `git` CLI.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::VcsError;
use crate::domain::ports::{CommitOutcome, VersionControl};

#[derive(Debug, Clone)]
pub struct GitCommitter {
    repo_dir: PathBuf,
    excluded: Vec<String>,
}

impl GitCommitter {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            excluded: Vec::new(),
        }
    }

    /// Paths (relative to the repository directory) that are neither
    /// reported as changes nor staged.
    #[must_use]
    pub fn with_excluded<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Whole-tree pathspec minus the excluded paths; empty when nothing is
    /// excluded.
    fn pathspec(&self) -> Vec<String> {
        if self.excluded.is_empty() {
            return Vec::new();
        }
        let mut spec = vec!["--".to_string(), ":/".to_string()];
        spec.extend(self.excluded.iter().map(|p| format!(":(exclude){p}")));
        spec
    }

    async fn git_with_pathspec(&self, args: &[&str]) -> Result<Output, VcsError> {
        let pathspec = self.pathspec();
        let mut full: Vec<&str> = args.to_vec();
        full.extend(pathspec.iter().map(String::as_str));
        self.git(&full).await
    }

    async fn git(&self, args: &[&str]) -> Result<Output, VcsError> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .current_dir(&self.repo_dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl VersionControl for GitCommitter {
    async fn has_changes(&self) -> Result<bool, VcsError> {
        let output = self.git_with_pathspec(&["status", "--porcelain"]).await?;
        Ok(!output.stdout.iter().all(u8::is_ascii_whitespace))
    }

    async fn commit_all(
        &self,
        message: &str,
        allow_empty: bool,
    ) -> Result<CommitOutcome, VcsError> {
        if !allow_empty && !self.has_changes().await? {
            return Ok(CommitOutcome::NothingToCommit);
        }

        self.git_with_pathspec(&["add", "-A"]).await?;
        let mut args = vec!["commit", "--quiet", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.git(&args).await?;

        let head = self.git(&["rev-parse", "HEAD"]).await?;
        let hash = String::from_utf8_lossy(&head.stdout).trim().to_string();
        info!(%hash, message, "created commit");
        Ok(CommitOutcome::Committed { hash })
    }
}
