use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, HistorySourceKind};
use crate::domain::models::MIN_ITERATION_BUDGET;

/// Project directory holding configuration and the learning store.
pub const PROJECT_DIR: &str = ".lintloop";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Tool program cannot be empty")]
    EmptyToolProgram,

    #[error("Invalid iteration_ceiling: {0}. Must be at least 5")]
    InvalidIterationCeiling(u32),

    #[error("Invalid max_iterations override: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid commit_limit: {0}. Must be at least 1")]
    InvalidCommitLimit(usize),

    #[error("Invalid learning store capacity: {0}. Must be at least 1")]
    InvalidLearningCapacity(usize),

    #[error("Invalid monitor interval_secs: {0}. Must be at least 1")]
    InvalidMonitorInterval(u64),

    #[error("Documentation header cannot be empty")]
    EmptyDocumentationHeader,

    #[error("history.source is gateway but history.gateway_url is not set")]
    MissingGatewayUrl,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project in the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .lintloop/config.yaml
    /// 3. .lintloop/local.yaml
    /// 4. Environment variables (LINTLOOP_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] for a project rooted at `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let project = root.as_ref().join(PROJECT_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(project.join("config.yaml")))
            .merge(Yaml::file(project.join("local.yaml")))
            .merge(Env::prefixed("LINTLOOP_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load an explicit file in place of the project files. Environment
    /// variables still take precedence.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LINTLOOP_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.tool.program.trim().is_empty() {
            return Err(ConfigError::EmptyToolProgram);
        }

        let convergence = &config.convergence;
        if convergence.iteration_ceiling < MIN_ITERATION_BUDGET {
            return Err(ConfigError::InvalidIterationCeiling(
                convergence.iteration_ceiling,
            ));
        }
        if let Some(max) = convergence.max_iterations.filter(|m| *m < 1) {
            return Err(ConfigError::InvalidMaxIterations(max));
        }

        if config.history.commit_limit == 0 {
            return Err(ConfigError::InvalidCommitLimit(config.history.commit_limit));
        }
        if config.history.source == HistorySourceKind::Gateway
            && config
                .history
                .gateway_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingGatewayUrl);
        }

        if config.learning.capacity == 0 {
            return Err(ConfigError::InvalidLearningCapacity(config.learning.capacity));
        }

        if config.monitor.interval_secs == 0 {
            return Err(ConfigError::InvalidMonitorInterval(config.monitor.interval_secs));
        }

        if config.documentation.header.trim().is_empty() {
            return Err(ConfigError::EmptyDocumentationHeader);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CommitFrequencyMode;
    use tempfile::TempDir;

    fn project_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&project).unwrap();
        for (name, contents) in files {
            std::fs::write(project.join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tool.program, "rubocop");
        assert_eq!(config.convergence.iteration_ceiling, 30);
        assert_eq!(config.history.commit_limit, 200);
        assert_eq!(config.learning.capacity, 100);
        assert_eq!(config.monitor.interval_secs, 300);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
tool:
  name: standardrb
  program: bundle
  check_args: [exec, standardrb]
  autocorrect_args: [exec, standardrb, --fix]
convergence:
  max_iterations: 8
  commit_mode: per_cycle
history:
  source: gateway
  gateway_url: http://localhost:9000
logging:
  level: debug
  format: json
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.tool.name, "standardrb");
        assert_eq!(config.tool.check_args, vec!["exec", "standardrb"]);
        assert_eq!(config.convergence.max_iterations, Some(8));
        assert_eq!(
            config.convergence.commit_mode,
            Some(CommitFrequencyMode::PerCycle)
        );
        assert_eq!(config.history.source, HistorySourceKind::Gateway);
        assert_eq!(config.history.window_days, 30);
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_local_overrides_project_config() {
        let dir = project_with(&[
            ("config.yaml", "convergence:\n  iteration_ceiling: 20\nlearning:\n  capacity: 50\n"),
            ("local.yaml", "convergence:\n  iteration_ceiling: 12\n"),
        ]);
        let config = temp_env::with_vars_unset(
            ["LINTLOOP_CONVERGENCE__ITERATION_CEILING", "LINTLOOP_LEARNING__CAPACITY"],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );
        assert_eq!(config.convergence.iteration_ceiling, 12);
        assert_eq!(config.learning.capacity, 50);
    }

    #[test]
    fn test_env_override() {
        let dir = project_with(&[("config.yaml", "logging:\n  level: warn\n")]);
        let config = temp_env::with_vars(
            [
                ("LINTLOOP_LOGGING__LEVEL", Some("debug")),
                ("LINTLOOP_MONITOR__ENABLED", Some("true")),
                ("LINTLOOP_HISTORY__COMMIT_LIMIT", Some("50")),
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.monitor.enabled);
        assert_eq!(config.history.commit_limit, 50);
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        let dir = project_with(&[]);
        let result = temp_env::with_var("LINTLOOP_LOGGING__FORMAT", Some("xml"), || {
            ConfigLoader::load_from_dir(dir.path())
        });
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidLogFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "documentation:\n  enabled: false\n").unwrap();

        let config = temp_env::with_vars_unset(["LINTLOOP_DOCUMENTATION__ENABLED"], || {
            ConfigLoader::load_from_file(&path).unwrap()
        });
        assert!(!config.documentation.enabled);
        assert!(ConfigLoader::load_from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_validate_empty_program() {
        let mut config = Config::default();
        config.tool.program = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyToolProgram)
        ));
    }

    #[test]
    fn test_validate_low_ceiling() {
        let mut config = Config::default();
        config.convergence.iteration_ceiling = 4;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidIterationCeiling(4))
        ));
    }

    #[test]
    fn test_validate_zero_max_iterations() {
        let mut config = Config::default();
        config.convergence.max_iterations = Some(0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(0))
        ));
    }

    #[test]
    fn test_validate_zero_commit_limit() {
        let mut config = Config::default();
        config.history.commit_limit = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCommitLimit(0))
        ));
    }

    #[test]
    fn test_validate_gateway_without_url() {
        let mut config = Config::default();
        config.history.source = HistorySourceKind::Gateway;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingGatewayUrl)
        ));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.learning.capacity = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLearningCapacity(0))
        ));
    }

    #[test]
    fn test_validate_zero_monitor_interval() {
        let mut config = Config::default();
        config.monitor.interval_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMonitorInterval(0))
        ));
    }

    #[test]
    fn test_validate_empty_header() {
        let mut config = Config::default();
        config.documentation.header = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDocumentationHeader)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }
}
