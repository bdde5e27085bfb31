//! Builds the concrete adapters for a configuration and runs the loop.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::planning::{Overrides, Plan, Planner};
use crate::domain::models::{Config, HistorySourceKind, LoopReport};
use crate::domain::ports::{
    AnalysisTool, CacheControl, CommitHistorySource, DocumentationSink, HistoryAnalyzer,
    LearningStore, VersionControl,
};
use crate::infrastructure::config::PROJECT_DIR;
use crate::infrastructure::history::{
    CachedHistoryReader, GatewayHistorySource, GatewaySettings, GitHistorySource,
};
use crate::infrastructure::tool::CommandAnalysisTool;
use crate::infrastructure::vcs::GitCommitter;
use crate::infrastructure::{JsonFileLearningStore, MarkdownSectionWriter};
use crate::services::{
    CachingHistoryAnalyzer, CommitTemplate, DefaultsHistoryAnalyzer, HistoryWindow,
    IterationMetrics, LoopController, LoopSettings, MonitorSettings, PatternAnalyzer,
    PerformanceMonitor,
};

/// Per-invocation options from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub max_iterations: Option<u32>,
    pub max_duration_secs: Option<u64>,
    pub no_history: bool,
}

/// Everything the loop and the planner talk to.
pub struct Components {
    pub tool: Arc<dyn AnalysisTool>,
    pub vcs: Arc<dyn VersionControl>,
    pub learning: Arc<dyn LearningStore>,
    pub docs: Option<Arc<dyn DocumentationSink>>,
    pub analyzer: Arc<dyn HistoryAnalyzer>,
    /// Present when history is read through the cache.
    pub history_cache: Option<Arc<CachedHistoryReader>>,
}

/// Result of a `run`: the plan the loop started from and how it ended.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub plan: Plan,
    pub report: LoopReport,
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Loop-owned files that must never be staged: the project directory and
/// a learning store placed elsewhere in the tree.
fn bookkeeping_paths(config: &Config) -> Vec<String> {
    let mut paths = vec![PROJECT_DIR.to_string()];
    let learning = &config.learning.path;
    if learning.is_relative() && !learning.starts_with(PROJECT_DIR) {
        paths.push(learning.to_string_lossy().into_owned());
    }
    paths
}

/// Pick the history source named by the configuration.
pub fn build_history_source(config: &Config) -> Result<Arc<dyn CommitHistorySource>> {
    match config.history.source {
        HistorySourceKind::Local => Ok(Arc::new(GitHistorySource::new(
            config.tool.working_dir.clone(),
        ))),
        HistorySourceKind::Gateway => {
            let url = config
                .history
                .gateway_url
                .clone()
                .context("history.gateway_url is required for the gateway source")?;
            let settings = GatewaySettings {
                timeout: Duration::from_secs(config.history.gateway_timeout_secs),
                ..GatewaySettings::new(url)
            };
            Ok(Arc::new(
                GatewayHistorySource::new(settings).context("Failed to create gateway client")?,
            ))
        }
    }
}

/// Caching analyzer over the configured source, or the defaults-only
/// analyzer when history is disabled.
pub fn build_history_analyzer(
    config: &Config,
    no_history: bool,
) -> Result<(Arc<dyn HistoryAnalyzer>, Option<Arc<CachedHistoryReader>>)> {
    if no_history || !config.history.enabled {
        debug!("history analysis disabled");
        return Ok((Arc::new(DefaultsHistoryAnalyzer::new()), None));
    }
    let reader = Arc::new(CachedHistoryReader::new(build_history_source(config)?));
    let analyzer = CachingHistoryAnalyzer::new(
        reader.clone(),
        PatternAnalyzer::new(&config.tool.name, &config.history.keywords),
        CommitTemplate::new(config.tool.name.clone()),
        HistoryWindow::from(&config.history),
    );
    Ok((Arc::new(analyzer), Some(reader)))
}

impl Components {
    pub fn from_config(config: &Config, no_history: bool) -> Result<Self> {
        let root = config.tool.working_dir.clone();
        let (analyzer, history_cache) = build_history_analyzer(config, no_history)?;
        let docs: Option<Arc<dyn DocumentationSink>> = config.documentation.enabled.then(|| {
            Arc::new(MarkdownSectionWriter::new(
                resolve(&root, &config.documentation.path),
                config.documentation.header.clone(),
            )) as Arc<dyn DocumentationSink>
        });

        Ok(Self {
            tool: Arc::new(CommandAnalysisTool::new(&config.tool)),
            vcs: Arc::new(
                GitCommitter::new(root.clone()).with_excluded(bookkeeping_paths(config)),
            ),
            learning: Arc::new(JsonFileLearningStore::new(
                resolve(&root, &config.learning.path),
                config.learning.capacity,
            )),
            docs,
            analyzer,
            history_cache,
        })
    }

    /// Plan the starting configuration.
    pub async fn plan(&self, config: &Config, overrides: Overrides) -> Plan {
        let planner = Planner::new(
            &config.tool.name,
            self.analyzer.as_ref(),
            self.learning.as_ref(),
            config.convergence.iteration_ceiling,
        );
        let planner = if config.convergence.use_prediction {
            planner
        } else {
            planner.without_prediction()
        };
        planner.plan(overrides).await
    }

    /// Plan, then run the loop to a terminal state. The monitor runs
    /// alongside when enabled.
    pub async fn run(self, config: &Config, options: RunOptions) -> Result<RunOutcome> {
        let overrides = Overrides {
            max_iterations: options.max_iterations.or(config.convergence.max_iterations),
            commit_mode: config.convergence.commit_mode,
        };
        let plan = self.plan(config, overrides).await;

        let settings = LoopSettings {
            iteration_ceiling: config.convergence.iteration_ceiling,
            max_duration: options
                .max_duration_secs
                .or(config.convergence.max_duration_secs)
                .map(Duration::from_secs),
            moderate_interval: config.documentation.moderate_interval,
        };

        let metrics = IterationMetrics::new();
        let mut controller = LoopController::new(
            self.tool.clone(),
            self.vcs.clone(),
            self.learning.clone(),
            plan.recommendation.clone(),
            settings,
        )
        .with_metrics(metrics.clone());
        if let Some(docs) = &self.docs {
            controller = controller.with_documentation(docs.clone());
        }

        let monitor_handle = if config.monitor.enabled {
            let mut monitor =
                PerformanceMonitor::new(MonitorSettings::from(&config.monitor), metrics);
            if let Some(cache) = &self.history_cache {
                monitor = monitor.with_cache(cache.clone() as Arc<dyn CacheControl>);
            }
            controller = controller.with_directives(monitor.directives());
            let handle = monitor.handle();
            let mut events = monitor.run();
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    debug!(?event, "monitor event");
                }
            });
            info!("performance monitor enabled");
            Some(handle)
        } else {
            None
        };

        let result = controller.run().await;
        if let Some(handle) = monitor_handle {
            handle.stop();
        }
        let report = result.context("Development loop aborted")?;

        Ok(RunOutcome { plan, report })
    }
}
