//! Version-control history sources and the read-through cache in front of them.

pub mod cached;
pub mod gateway;
pub mod git_source;

pub use cached::{CacheStats, CachedHistoryReader};
pub use gateway::{GatewayHistorySource, GatewaySettings};
pub use git_source::GitHistorySource;
