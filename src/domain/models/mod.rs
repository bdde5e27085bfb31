//! Domain models.

pub mod commit;
pub mod config;
pub mod iteration;
pub mod loop_state;
pub mod recommendation;
pub mod runtime;
pub mod stats;

pub use commit::CommitRecord;
pub use config::{
    Config, ConvergenceConfig, DocumentationConfig, HistoryConfig, HistorySourceKind,
    LearningConfig, LoggingConfig, MonitorConfig, ToolConfig,
};
pub use iteration::{efficiency, IterationOutcome, LearningStoreEntry};
pub use loop_state::{LoopReport, LoopState};
pub use recommendation::{
    CommitFrequencyMode, ConfigRecommendation, DocUpdateStrategy, MIN_ITERATION_BUDGET,
};
pub use runtime::{PerformanceMode, RuntimeDirectives};
pub use stats::{
    CommitPatternStats, CycleStats, HistoryInsights, MessageLengthStats, OffenseReductionStats,
    TimeDistribution,
};
