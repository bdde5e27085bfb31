//! Error taxonomy for the convergence loop.
//!
//! Only [`LoopError::ToolInvocation`] is fatal to a run. Every other error
//! is absorbed by its caller with degraded but defined behavior and logged
//! with iteration context.

use thiserror::Error;

/// Which pass of the analysis tool was being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Check,
    Autocorrect,
}

impl ToolMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Autocorrect => "autocorrect",
        }
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the external analysis tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all (missing binary, permissions).
    #[error("Failed to invoke {program} ({mode}): {source}")]
    Invocation {
        program: String,
        mode: ToolMode,
        #[source]
        source: std::io::Error,
    },
}

/// Version-control history could not be read.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History command failed: {0}")]
    CommandFailed(String),

    #[error("History gateway request failed: {0}")]
    Gateway(String),

    #[error("Malformed history data: {0}")]
    Malformed(String),

    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Learning store read or write failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Learning store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Learning store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Staging or committing failed.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("git I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The documentation artifact could not be updated.
#[derive(Debug, Error)]
pub enum DocumentationError {
    #[error("Documentation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a loop run.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    ToolInvocation(#[from] ToolError),
}

pub type LoopResult<T> = Result<T, LoopError>;
