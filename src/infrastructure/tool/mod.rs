//! Subprocess-backed analysis tool.

pub mod command_tool;
pub mod count_parser;

pub use command_tool::CommandAnalysisTool;
pub use count_parser::CountParser;
