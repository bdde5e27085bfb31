//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - CommitHistorySource: version-control history (local git or remote gateway)
//! - AnalysisTool: the external check/autocorrect tool
//! - VersionControl: staging and committing the working tree
//! - DocumentationSink: the named section of the documentation artifact
//! - LearningStore: bounded log of past iteration outcomes
//! - HistoryAnalyzer: history-derived insights for the predictor
//!
//! These traits keep the loop controller independent of subprocesses and
//! files so tests can substitute deterministic fakes.

pub mod analyzer;
pub mod documentation;
pub mod history;
pub mod learning;
pub mod tool;
pub mod vcs;

pub use analyzer::HistoryAnalyzer;
pub use documentation::DocumentationSink;
pub use history::{CacheControl, CommitHistorySource};
pub use learning::LearningStore;
pub use tool::{AnalysisTool, ParsedCount, ToolReport};
pub use vcs::{CommitOutcome, VersionControl};
