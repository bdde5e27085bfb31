//! CLI command implementations

pub mod history;
pub mod predict;
pub mod run;
