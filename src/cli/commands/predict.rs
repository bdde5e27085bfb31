//! Implementation of the `lintloop predict` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::{Components, Overrides, Plan};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::Config;

#[derive(Args, Debug, Default)]
pub struct PredictArgs {
    /// Ignore history and show what the defaults would produce
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictOutput {
    #[serde(flatten)]
    pub plan: Plan,
}

impl CommandOutput for PredictOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let plan = &self.plan;
        let mut lines = Vec::new();

        if plan.insights.sufficient {
            lines.push(format!(
                "Based on {} commit(s), {} past loop cycle(s), {:.2} commits/day this week",
                plan.insights.patterns.total_commits,
                plan.insights.cycles.total_cycles,
                plan.insights.development_velocity
            ));
        } else {
            lines.push("No usable history; using default configuration".to_string());
        }
        if let Some(typical) = plan.heuristics.typical_run_length {
            lines.push(format!(
                "Learning store: {} run(s), typically {typical:.1} working iteration(s)",
                plan.heuristics.runs
            ));
        }
        lines.push(String::new());
        lines.push(formatter.format_recommendation(&plan.recommendation));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PredictArgs, config: &Config, json_mode: bool) -> Result<()> {
    let components = Components::from_config(config, args.no_history)?;
    let overrides = Overrides {
        max_iterations: config.convergence.max_iterations,
        commit_mode: config.convergence.commit_mode,
    };
    let plan = components.plan(config, overrides).await;
    output(&PredictOutput { plan }, json_mode);
    Ok(())
}
