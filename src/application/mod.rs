//! Application layer: wires configuration, adapters, and services together.

pub mod bootstrap;
pub mod planning;

pub use bootstrap::{
    build_history_analyzer, build_history_source, Components, RunOptions, RunOutcome,
};
pub use planning::{Overrides, Plan, Planner};
