//! Pipeline configuration.
//!
//! Built once at process start: TOML file (or defaults), then `MEDALLION_*`
//! environment overrides, then validation. Stages receive the pieces they
//! need through their constructors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use medallion_core::engine::EngineBackend;
use medallion_core::storage::keys::validate_segment;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var}={value}: {reason}")]
    Env {
        var: String,
        value: String,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub orchestrator: OrchestratorConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the local object store.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("lake"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: EngineBackend,
    /// Time-contiguous partitions per series (parallel backend only).
    pub partitions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::Sequential,
            partitions: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on tickers processed concurrently.
    pub max_workers: usize,
    pub data_type: String,
    /// Run the Silver stage. When off, Gold aggregates the Bronze object.
    pub calculate_indicators: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            data_type: "prices".to_string(),
            calculate_indicators: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "medallion".to_string(),
            environment: "dev".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// File (or defaults) + process environment, validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MEDALLION_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MEDALLION_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("MEDALLION_ENGINE_BACKEND") {
            self.engine.backend = v.parse().map_err(|reason| ConfigError::Env {
                var: "MEDALLION_ENGINE_BACKEND".to_string(),
                value: v.clone(),
                reason,
            })?;
        }
        if let Some(v) = lookup("MEDALLION_ENGINE_PARTITIONS") {
            self.engine.partitions = parse_env("MEDALLION_ENGINE_PARTITIONS", &v)?;
        }
        if let Some(v) = lookup("MEDALLION_MAX_WORKERS") {
            self.orchestrator.max_workers = parse_env("MEDALLION_MAX_WORKERS", &v)?;
        }
        if let Some(v) = lookup("MEDALLION_DATA_TYPE") {
            self.orchestrator.data_type = v;
        }
        if let Some(v) = lookup("MEDALLION_CALCULATE_INDICATORS") {
            self.orchestrator.calculate_indicators = parse_env("MEDALLION_CALCULATE_INDICATORS", &v)?;
        }
        if let Some(v) = lookup("MEDALLION_SERVICE_NAME") {
            self.observability.service_name = v;
        }
        if let Some(v) = lookup("MEDALLION_ENVIRONMENT") {
            self.observability.environment = v;
        }
        if let Some(v) = lookup("MEDALLION_LOG_LEVEL") {
            self.observability.log_level = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.max_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "orchestrator.max_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.engine.partitions == 0 {
            return Err(ConfigError::Invalid {
                field: "engine.partitions",
                reason: "must be at least 1".to_string(),
            });
        }
        validate_segment("data type", &self.orchestrator.data_type).map_err(|e| {
            ConfigError::Invalid {
                field: "orchestrator.data_type",
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

fn parse_env<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
