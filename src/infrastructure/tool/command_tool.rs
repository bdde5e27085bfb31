//! Analysis tool run as a subprocess.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

use super::count_parser::CountParser;
use crate::domain::errors::{ToolError, ToolMode};
use crate::domain::models::ToolConfig;
use crate::domain::ports::{AnalysisTool, ParsedCount, ToolReport};

/// Runs the configured program once per pass and parses its stdout.
///
/// A non-zero exit status is expected whenever findings exist and is not an
/// error; only a failure to start the process is.
#[derive(Debug, Clone)]
pub struct CommandAnalysisTool {
    name: String,
    program: String,
    check_args: Vec<String>,
    autocorrect_args: Vec<String>,
    working_dir: PathBuf,
    parser: CountParser,
}

impl CommandAnalysisTool {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            name: config.name.clone(),
            program: config.program.clone(),
            check_args: config.check_args.clone(),
            autocorrect_args: config.autocorrect_args.clone(),
            working_dir: config.working_dir.clone(),
            parser: CountParser::new(),
        }
    }

    async fn invoke(&self, mode: ToolMode) -> Result<ToolReport, ToolError> {
        let args = match mode {
            ToolMode::Check => &self.check_args,
            ToolMode::Autocorrect => &self.autocorrect_args,
        };
        debug!(program = %self.program, ?args, %mode, "invoking analysis tool");

        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Invocation {
                program: self.program.clone(),
                mode,
                source,
            })?;
        let duration = started.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let count = match mode {
            ToolMode::Check => self.parser.detected(&stdout),
            ToolMode::Autocorrect => self.parser.corrected(&stdout),
        };
        if count == ParsedCount::Unparsed {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                program = %self.program,
                %mode,
                exit_code = ?output.status.code(),
                stderr = %stderr.trim(),
                "no offense count in tool output"
            );
        }
        debug!(%mode, ?count, duration_ms = duration.as_millis() as u64, "analysis tool finished");

        Ok(ToolReport {
            count,
            exit_code: output.status.code(),
            duration,
        })
    }
}

#[async_trait]
impl AnalysisTool for CommandAnalysisTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ToolReport, ToolError> {
        self.invoke(ToolMode::Check).await
    }

    async fn autocorrect(&self) -> Result<ToolReport, ToolError> {
        self.invoke(ToolMode::Autocorrect).await
    }
}
