//! Lintloop - self-tuning lint convergence loop
//!
//! Lintloop repeatedly runs a static-analysis tool in check and autocorrect
//! mode until the codebase is clean or an iteration budget runs out. The
//! budget, commit cadence and documentation cadence are predicted from the
//! project's version-control history and adjusted while the loop runs.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, error taxonomy and port traits
//! - **Service Layer** (`services`): analyzers, predictor, adaptive control,
//!   the loop controller and the performance monitor
//! - **Infrastructure Layer** (`infrastructure`): git, HTTP, subprocess and
//!   filesystem adapters, configuration and logging
//! - **Application Layer** (`application`): wiring and run planning
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use lintloop::application::{Components, RunOptions};
//! use lintloop::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let outcome = Components::from_config(&config, false)?
//!         .run(&config, RunOptions::default())
//!         .await?;
//!     println!("{}", outcome.report.final_state);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod testing;

pub use domain::models::{
    CommitFrequencyMode, CommitRecord, Config, ConfigRecommendation, DocUpdateStrategy,
    HistoryInsights, IterationOutcome, LearningStoreEntry, LoopReport, LoopState,
};
pub use services::{LoopController, LoopSettings};
