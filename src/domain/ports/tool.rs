use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::ToolError;

/// A count read from tool output.
///
/// `Unparsed` is kept distinct from `Count(0)` so that output the parser does
/// not understand is never mistaken for convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCount {
    Count(u32),
    Unparsed,
}

impl ParsedCount {
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Unparsed => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Count(_))
    }
}

/// Result of one tool pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub count: ParsedCount,
    /// Process exit code; `None` when terminated by a signal or faked.
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl ToolReport {
    pub fn new(count: ParsedCount) -> Self {
        Self {
            count,
            exit_code: None,
            duration: Duration::ZERO,
        }
    }
}

/// External static-analysis tool with a read-only check pass and a
/// mutating autocorrect pass.
///
/// A non-zero finding count or exit status is normal operation; only a
/// failure to start the process is an error.
#[async_trait]
pub trait AnalysisTool: Send + Sync {
    /// Tool name used in commit messages.
    fn name(&self) -> &str;

    async fn check(&self) -> Result<ToolReport, ToolError>;

    async fn autocorrect(&self) -> Result<ToolReport, ToolError>;
}
