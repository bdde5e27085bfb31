//! Infrastructure layer module
//!
//! Adapters for the outside world, implementing the port traits defined in
//! the domain layer:
//! - Configuration loading (figment)
//! - Logging (tracing)
//! - Git and gateway history sources, plus the history cache
//! - The analysis tool subprocess
//! - Git commits
//! - The learning store file and the documentation artifact

pub mod config;
pub mod documentation;
pub mod history;
pub mod learning_store;
pub mod logging;
pub mod tool;
pub mod vcs;

pub use documentation::MarkdownSectionWriter;
pub use learning_store::JsonFileLearningStore;
