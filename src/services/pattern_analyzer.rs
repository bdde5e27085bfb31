//! Statistics over a window of commit records.

use chrono::{Duration, NaiveDate, Timelike};
use std::collections::{BTreeMap, HashMap};

use crate::domain::models::{
    CommitPatternStats, CommitRecord, MessageLengthStats, TimeDistribution,
};

/// Days with more commits than this are peak days.
const PEAK_DAY_THRESHOLD: usize = 3;

/// Number of paths reported in `top_files`.
const TOP_FILES: usize = 10;

/// Inclusive calendar range used for zero-commit (quiet) days.
///
/// Quiet days only make sense over a contiguous range, so callers supply one
/// explicitly instead of inferring it from sparse commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// The `days` calendar days ending at (and including) `end`.
    pub fn ending_at(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self::new(end - Duration::days(span), end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Computes [`CommitPatternStats`] against a keyword vocabulary.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    tool_keyword: String,
    keywords: Vec<String>,
}

impl PatternAnalyzer {
    /// Vocabulary is `tool` plus `keywords`, lowercased and deduplicated.
    pub fn new(tool: &str, keywords: &[String]) -> Self {
        let tool_keyword = tool.to_lowercase();
        let mut vocabulary = vec![tool_keyword.clone()];
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !vocabulary.contains(&keyword) {
                vocabulary.push(keyword);
            }
        }
        Self {
            tool_keyword,
            keywords: vocabulary,
        }
    }

    pub fn tool_keyword(&self) -> &str {
        &self.tool_keyword
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn analyze(&self, records: &[CommitRecord], range: Option<DateRange>) -> CommitPatternStats {
        if records.is_empty() {
            return CommitPatternStats::default();
        }

        let total = records.len();
        let lowered: Vec<String> = records.iter().map(|r| r.message.to_lowercase()).collect();

        let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut hours = [0usize; 24];
        let mut time_distribution = TimeDistribution::default();
        for record in records {
            *by_day.entry(record.author_date.date_naive()).or_default() += 1;
            let hour = record.author_date.hour();
            hours[hour as usize] += 1;
            time_distribution.record(hour);
        }

        let daily_counts = match range {
            Some(range) => range
                .days()
                .map(|day| (day, by_day.get(&day).copied().unwrap_or(0)))
                .collect(),
            None => by_day.clone(),
        };
        let quiet_days = match range {
            Some(_) => daily_counts
                .iter()
                .filter(|(_, count)| **count == 0)
                .map(|(day, _)| *day)
                .collect(),
            None => Vec::new(),
        };
        let peak_days = by_day
            .iter()
            .filter(|(_, count)| **count > PEAK_DAY_THRESHOLD)
            .map(|(day, _)| *day)
            .collect();

        let keyword_counts = self
            .keywords
            .iter()
            .map(|keyword| {
                let count = lowered.iter().filter(|m| m.contains(keyword.as_str())).count();
                (keyword.clone(), count)
            })
            .collect();

        CommitPatternStats {
            total_commits: total,
            average_daily_commits: total as f64 / by_day.len() as f64,
            peak_days,
            quiet_days,
            commit_velocity: commit_velocity(records),
            keyword_counts,
            message_length_stats: message_length_stats(records),
            peak_hour: peak_hour(&hours),
            time_distribution,
            daily_counts,
            top_files: top_files(records),
            tool_commit_clusters: self.tool_clusters(records),
        }
    }

    /// Maximal runs of chronologically consecutive tool-related commits.
    fn tool_clusters(&self, records: &[CommitRecord]) -> usize {
        let mut chronological: Vec<&CommitRecord> = records.iter().rev().collect();
        chronological.sort_by_key(|r| r.author_date);

        let mut clusters = 0;
        let mut in_cluster = false;
        for record in chronological {
            let mentions_tool = record.message.to_lowercase().contains(&self.tool_keyword);
            if mentions_tool && !in_cluster {
                clusters += 1;
            }
            in_cluster = mentions_tool;
        }
        clusters
    }
}

/// Commits per day between the oldest and newest record.
///
/// Spans shorter than a day count as one day.
fn commit_velocity(records: &[CommitRecord]) -> f64 {
    let (Some(oldest), Some(newest)) = (
        records.iter().map(|r| r.author_date).min(),
        records.iter().map(|r| r.author_date).max(),
    ) else {
        return 0.0;
    };
    let span_days = (newest - oldest).num_seconds() as f64 / 86_400.0;
    records.len() as f64 / span_days.max(1.0)
}

fn message_length_stats(records: &[CommitRecord]) -> MessageLengthStats {
    let lengths: Vec<usize> = records.iter().map(|r| r.message.chars().count()).collect();
    let Some(min) = lengths.iter().min().copied() else {
        return MessageLengthStats::default();
    };
    let max = lengths.iter().max().copied().unwrap_or(min);
    MessageLengthStats {
        min,
        max,
        mean: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
    }
}

/// Busiest hour; ties go to the earliest hour.
fn peak_hour(hours: &[usize; 24]) -> u32 {
    let mut best = 0usize;
    for (hour, count) in hours.iter().enumerate() {
        if *count > hours[best] {
            best = hour;
        }
    }
    best as u32
}

fn top_files(records: &[CommitRecord]) -> Vec<(String, usize)> {
    let mut churn: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for file in &record.changed_files {
            *churn.entry(file.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = churn
        .into_iter()
        .map(|(path, count)| (path.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_FILES);
    ranked
}
