use std::fs;
use std::path::{Path, PathBuf};

use blockrand_alloc::RetryPolicy;
use blockrand_core::{ErrorInfo, RandError};
use blockrand_web::ReportConfig;
use serde::{Deserialize, Serialize};

/// YAML-configurable session settings. Trial design constants are not part of
/// this file and cannot be changed at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// SQLite database holding the assignment log.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Append retry schedule.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// HTML report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("randomization_log.db")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            retry: RetryPolicy::default(),
            report: ReportConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, RandError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            RandError::Config(
                ErrorInfo::new("blockrand_cli.config_read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            RandError::Config(
                ErrorInfo::new("blockrand_cli.config_parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads `path` when given, otherwise defaults; `log_override` wins over both.
    pub fn resolve(path: Option<&Path>, log_override: Option<&Path>) -> Result<Self, RandError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(log_path) = log_override {
            config.log_path = log_path.to_path_buf();
        }
        Ok(config)
    }
}
