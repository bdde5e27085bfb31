//! Implementation of the `lintloop run` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::{Components, RunOptions, RunOutcome};
use crate::cli::output::{create_spinner, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::domain::models::{Config, LoopState};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Fixed iteration budget instead of the predicted one
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Stop at the next iteration boundary after this many seconds
    #[arg(long)]
    pub max_duration_secs: Option<u64>,

    /// Skip history analysis and start from the default configuration
    #[arg(long)]
    pub no_history: bool,
}

impl From<&RunArgs> for RunOptions {
    fn from(args: &RunArgs) -> Self {
        Self {
            max_iterations: args.max_iterations,
            max_duration_secs: args.max_duration_secs,
            no_history: args.no_history,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let report = &self.outcome.report;
        let formatter = TableFormatter::new();
        let remaining = report
            .remaining_findings
            .map_or_else(|| "unknown".to_string(), |n| n.to_string());

        let mut lines = vec![
            format!(
                "Development loop {} after {} iteration(s)",
                report.final_state,
                report.iterations()
            ),
            format!("Remaining offenses: {remaining}"),
            format!("Offenses corrected: {}", report.total_corrected()),
            format!("Commits created: {}", report.commits),
            format!(
                "Iteration budget: {} (started at {})",
                report.final_config.max_iterations,
                self.outcome.plan.recommendation.max_iterations
            ),
        ];
        if !report.outcomes.is_empty() {
            lines.push(String::new());
            lines.push(formatter.format_iterations(&report.outcomes));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let components = Components::from_config(config, args.no_history)?;

    let spinner = create_spinner(
        format!("Running {} until clean...", config.tool.name),
        json_mode,
    );
    let result = components.run(config, RunOptions::from(&args)).await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.finish_error("Development loop aborted");
            return Err(e);
        }
    };

    let summary = format!("{}", outcome.report.final_state);
    if outcome.report.final_state == LoopState::Converged {
        spinner.finish_success(summary);
    } else {
        spinner.finish_warning(summary);
    }

    output(&RunOutput { outcome }, json_mode);
    Ok(())
}
