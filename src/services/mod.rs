//! Core services: history analysis, prediction, and the convergence loop.

pub mod adaptive_controller;
pub mod config_predictor;
pub mod cycle_analyzer;
pub mod history_analyzer;
pub mod learning_heuristics;
pub mod loop_controller;
pub mod pattern_analyzer;
pub mod performance_monitor;

pub use adaptive_controller::{AdaptiveController, AdaptiveDecision, BudgetAdjustment};
pub use config_predictor::{pattern_consistency, ConfigPredictor};
pub use cycle_analyzer::{CommitTemplate, CycleAnalyzer, IterationCommit};
pub use history_analyzer::{
    development_velocity, CachingHistoryAnalyzer, DefaultsHistoryAnalyzer, HistoryWindow,
};
pub use learning_heuristics::LearningHeuristics;
pub use loop_controller::{LoopController, LoopSettings};
pub use pattern_analyzer::{DateRange, PatternAnalyzer};
pub use performance_monitor::{
    IterationMetrics, MonitorEvent, MonitorHandle, MonitorSettings, MonitorStatus,
    PerformanceMonitor,
};
