//! Version-control writes.

pub mod git_committer;

pub use git_committer::GitCommitter;
