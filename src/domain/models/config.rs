use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::recommendation::CommitFrequencyMode;

/// Main configuration structure for lintloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// External analysis tool
    #[serde(default)]
    pub tool: ToolConfig,

    /// Loop budget and overrides
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Version-control history source and analysis window
    #[serde(default)]
    pub history: HistoryConfig,

    /// Learning store location and bound
    #[serde(default)]
    pub learning: LearningConfig,

    /// Documentation artifact
    #[serde(default)]
    pub documentation: DocumentationConfig,

    /// Background performance monitor
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolConfig {
    /// Name used in commit messages and keyword statistics
    #[serde(default = "default_tool_name")]
    pub name: String,

    /// Executable to run
    #[serde(default = "default_tool_program")]
    pub program: String,

    /// Arguments for the read-only check pass
    #[serde(default)]
    pub check_args: Vec<String>,

    /// Arguments for the autocorrect pass
    #[serde(default = "default_autocorrect_args")]
    pub autocorrect_args: Vec<String>,

    /// Directory the tool and git run in
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

fn default_tool_name() -> String {
    "rubocop".to_string()
}

fn default_tool_program() -> String {
    "rubocop".to_string()
}

fn default_autocorrect_args() -> Vec<String> {
    vec!["-a".to_string()]
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            program: default_tool_program(),
            check_args: Vec::new(),
            autocorrect_args: default_autocorrect_args(),
            working_dir: default_working_dir(),
        }
    }
}

/// Loop budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Fixed starting budget; skips the history prediction for this field
    #[serde(default)]
    pub max_iterations: Option<u32>,

    /// Hard ceiling the adaptive budget can never exceed
    #[serde(default = "default_iteration_ceiling")]
    pub iteration_ceiling: u32,

    /// Wall-clock budget for the whole run, checked at iteration boundaries
    #[serde(default)]
    pub max_duration_secs: Option<u64>,

    /// Force a commit mode instead of the predicted one
    #[serde(default)]
    pub commit_mode: Option<CommitFrequencyMode>,

    /// Use history to predict starting parameters
    #[serde(default = "default_true")]
    pub use_prediction: bool,
}

const fn default_iteration_ceiling() -> u32 {
    30
}

const fn default_true() -> bool {
    true
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            iteration_ceiling: default_iteration_ceiling(),
            max_duration_secs: None,
            commit_mode: None,
            use_prediction: true,
        }
    }
}

/// Where commit history comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySourceKind {
    /// Run git in the working directory
    #[default]
    Local,
    /// Query a remote history gateway over HTTP
    Gateway,
}

/// History analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryConfig {
    /// Learn from history at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub source: HistorySourceKind,

    /// Base URL of the history gateway (required for `gateway`)
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Gateway request timeout in seconds
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    /// Commits fetched for pattern statistics
    #[serde(default = "default_commit_limit")]
    pub commit_limit: usize,

    /// Loop commits fetched for cycle reconstruction
    #[serde(default = "default_cycle_commit_limit")]
    pub cycle_commit_limit: usize,

    /// Calendar window for daily statistics
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Keyword vocabulary; the tool name is always included
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

const fn default_gateway_timeout_secs() -> u64 {
    10
}

const fn default_commit_limit() -> usize {
    200
}

const fn default_cycle_commit_limit() -> usize {
    500
}

const fn default_window_days() -> u32 {
    30
}

fn default_keywords() -> Vec<String> {
    ["fix", "refactor", "test", "doc"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: HistorySourceKind::Local,
            gateway_url: None,
            gateway_timeout_secs: default_gateway_timeout_secs(),
            commit_limit: default_commit_limit(),
            cycle_commit_limit: default_cycle_commit_limit(),
            window_days: default_window_days(),
            keywords: default_keywords(),
        }
    }
}

/// Learning store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearningConfig {
    /// JSON file holding recent iteration outcomes
    #[serde(default = "default_learning_path")]
    pub path: PathBuf,

    /// Number of most recent entries retained
    #[serde(default = "default_learning_capacity")]
    pub capacity: usize,
}

fn default_learning_path() -> PathBuf {
    PathBuf::from(".lintloop/learning.json")
}

const fn default_learning_capacity() -> usize {
    100
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            path: default_learning_path(),
            capacity: default_learning_capacity(),
        }
    }
}

/// Documentation artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DocumentationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Markdown document containing the loop section
    #[serde(default = "default_doc_path")]
    pub path: PathBuf,

    /// Header line marking the section
    #[serde(default = "default_doc_header")]
    pub header: String,

    /// Iterations between updates under the `moderate` strategy
    #[serde(default = "default_moderate_interval")]
    pub moderate_interval: u32,
}

fn default_doc_path() -> PathBuf {
    PathBuf::from("DEVELOPMENT_LOOP.md")
}

fn default_doc_header() -> String {
    "## Development Loop Status".to_string()
}

const fn default_moderate_interval() -> u32 {
    3
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_doc_path(),
            header: default_doc_header(),
            moderate_interval: default_moderate_interval(),
        }
    }
}

/// Background performance monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonitorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between samples
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,

    /// Mean iteration latency above which the monitor switches to reduced mode
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,

    /// Number of recent iterations sampled
    #[serde(default = "default_monitor_window")]
    pub window: usize,
}

const fn default_monitor_interval_secs() -> u64 {
    300
}

const fn default_latency_threshold_ms() -> u64 {
    120_000
}

const fn default_monitor_window() -> usize {
    5
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_monitor_interval_secs(),
            latency_threshold_ms: default_latency_threshold_ms(),
            window: default_monitor_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
