//! Implementation of the `lintloop history` command.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::application::build_history_analyzer;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, HistoryInsights};

#[derive(Args, Debug, Default)]
pub struct HistoryArgs {
    /// Number of recent commits to analyze
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,

    /// Days covered by the daily statistics
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    #[serde(flatten)]
    pub insights: HistoryInsights,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if !self.insights.sufficient {
            return "No commit history available.".to_string();
        }
        let formatter = TableFormatter::new();
        let patterns = &self.insights.patterns;
        let mut lines = vec![
            "Commit patterns:".to_string(),
            formatter.format_patterns(patterns),
            String::new(),
            "Keywords:".to_string(),
            formatter.format_keywords(&patterns.keyword_counts, patterns.total_commits),
            String::new(),
            "Time of day:".to_string(),
            formatter.format_time_distribution(&patterns.time_distribution),
        ];
        if !patterns.top_files.is_empty() {
            lines.push(String::new());
            lines.push("Most changed files:".to_string());
            lines.push(formatter.format_top_files(&patterns.top_files));
        }
        lines.push(String::new());
        lines.push("Development loop cycles:".to_string());
        lines.push(formatter.format_cycles(&self.insights.cycles));
        lines.push(format!(
            "\nRecent velocity: {:.2} commits/day",
            self.insights.development_velocity
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: HistoryArgs, config: &Config, json_mode: bool) -> Result<()> {
    if !config.history.enabled {
        bail!("History analysis is disabled (history.enabled = false)");
    }
    let mut config = config.clone();
    if let Some(limit) = args.limit {
        config.history.commit_limit = usize::try_from(limit)?;
    }
    if let Some(days) = args.days {
        config.history.window_days = days;
    }

    let (analyzer, _) = build_history_analyzer(&config, false)?;
    let insights = analyzer.insights().await;
    output(&HistoryOutput { insights }, json_mode);
    Ok(())
}
