//! Table output formatting for CLI commands
//!
//! Tables for iteration outcomes, recommendations and history statistics
//! using comfy-table. Colors are dropped when `NO_COLOR` is set or the
//! terminal is dumb.

use crate::domain::models::{
    CommitPatternStats, ConfigRecommendation, CycleStats, IterationOutcome, TimeDistribution,
};
use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per iteration.
    pub fn format_iterations(&self, outcomes: &[IterationOutcome]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Iteration",
            "Offenses",
            "Corrected",
            "Efficiency",
            "Committed",
        ]));

        for outcome in outcomes {
            let efficiency = format!("{:.0}%", outcome.efficiency * 100.0);
            let efficiency_cell = if self.use_colors && outcome.findings_count > 0 {
                Cell::new(efficiency).fg(efficiency_color(outcome.efficiency))
            } else {
                Cell::new(efficiency)
            };
            table.add_row(vec![
                right(outcome.iteration),
                right(outcome.findings_count),
                right(outcome.corrected_count),
                efficiency_cell.set_alignment(CellAlignment::Right),
                Cell::new(if outcome.committed { "yes" } else { "no" }),
            ]);
        }

        table.to_string()
    }

    pub fn format_recommendation(&self, recommendation: &ConfigRecommendation) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Setting", "Value"]));
        table.add_row(vec![
            Cell::new("Max iterations"),
            right(recommendation.max_iterations),
        ]);
        table.add_row(vec![
            Cell::new("Commit mode"),
            Cell::new(recommendation.commit_frequency_mode),
        ]);
        table.add_row(vec![
            Cell::new("Documentation"),
            Cell::new(recommendation.doc_update_strategy),
        ]);
        table.add_row(vec![
            Cell::new("Error threshold"),
            right(recommendation.error_threshold),
        ]);
        table.add_row(vec![
            Cell::new("Learning rate"),
            right(format!("{:.2}", recommendation.learning_rate)),
        ]);
        table.to_string()
    }

    /// Headline commit pattern metrics.
    pub fn format_patterns(&self, patterns: &CommitPatternStats) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Metric", "Value"]));
        let rows: Vec<(&str, String)> = vec![
            ("Commits", patterns.total_commits.to_string()),
            (
                "Average per day",
                format!("{:.2}", patterns.average_daily_commits),
            ),
            ("Velocity", format!("{:.2}", patterns.commit_velocity)),
            ("Peak days", patterns.peak_days.len().to_string()),
            ("Quiet days", patterns.quiet_days.len().to_string()),
            ("Peak hour", format!("{:02}:00", patterns.peak_hour)),
            (
                "Message length (min/mean/max)",
                format!(
                    "{}/{:.1}/{}",
                    patterns.message_length_stats.min,
                    patterns.message_length_stats.mean,
                    patterns.message_length_stats.max
                ),
            ),
            (
                "Tool commit clusters",
                patterns.tool_commit_clusters.to_string(),
            ),
        ];
        for (metric, value) in rows {
            table.add_row(vec![Cell::new(metric), right(value)]);
        }
        table.to_string()
    }

    /// Keyword hit counts with their share of all commits.
    pub fn format_keywords(&self, keywords: &BTreeMap<String, usize>, total: usize) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Keyword", "Commits", "Share"]));
        for (keyword, count) in keywords {
            let share = if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64 * 100.0
            };
            table.add_row(vec![
                Cell::new(keyword),
                right(count),
                right(format!("{share:.1}%")),
            ]);
        }
        table.to_string()
    }

    pub fn format_time_distribution(&self, distribution: &TimeDistribution) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Morning", "Afternoon", "Evening", "Night"]));
        table.add_row(vec![
            right(distribution.morning),
            right(distribution.afternoon),
            right(distribution.evening),
            right(distribution.night),
        ]);
        table.to_string()
    }

    pub fn format_top_files(&self, files: &[(String, usize)]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["File", "Changes"]));
        for (path, count) in files {
            table.add_row(vec![Cell::new(truncate_text(path, 60)), right(count)]);
        }
        table.to_string()
    }

    pub fn format_cycles(&self, cycles: &CycleStats) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Metric", "Value"]));
        let rows: Vec<(&str, String)> = vec![
            ("Cycles", cycles.total_cycles.to_string()),
            ("Completed cycles", cycles.closed_cycles.to_string()),
            (
                "Average duration (s)",
                format!("{:.0}", cycles.average_cycle_duration),
            ),
            (
                "Average iterations",
                cycles.average_iterations_per_cycle.to_string(),
            ),
            (
                "Average initial offenses",
                format!("{:.1}", cycles.offense_reduction_stats.average_initial_offenses),
            ),
            (
                "Average corrections",
                format!("{:.1}", cycles.offense_reduction_stats.average_corrections),
            ),
            (
                "Corrections per second",
                format!("{:.3}", cycles.cycle_efficiency),
            ),
        ];
        for (metric, value) in rows {
            table.add_row(vec![Cell::new(metric), right(value)]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }
        if !self.use_colors {
            table.force_no_tty();
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn right(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

/// Check if terminal supports colors
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }
    true
}

fn efficiency_color(efficiency: f64) -> Color {
    if efficiency > 0.8 {
        Color::Green
    } else if efficiency >= 0.3 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Truncate text to max length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
