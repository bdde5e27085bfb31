//! Domain layer for lintloop
//!
//! This module contains the core models, the error taxonomy and the port
//! traits the services are written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    DocumentationError, HistoryError, LoopError, LoopResult, PersistenceError, ToolError,
    ToolMode, VcsError,
};
