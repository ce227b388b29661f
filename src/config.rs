//! Service and adapter configuration.
//!
//! Configuration is plain serde data. The JSON shape uses camelCase keys:
//!
//! ```json
//! {
//!   "environment": "production",
//!   "metricsAdapters": [
//!     { "name": "googleAnalytics", "config": { "id": "UA-1" }, "environments": ["production"] },
//!     { "name": "mixpanel", "config": { "token": "abc" } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::Options;
use crate::environment::DEFAULT_ENVIRONMENT;
use crate::error::{ConfigError, ConfigResult};

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

/// Top-level configuration for a [`MetricsService`](crate::MetricsService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    /// Current application environment, fixed for the service's lifetime.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Adapters to activate at construction.
    #[serde(default)]
    pub metrics_adapters: Vec<AdapterConfig>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            metrics_adapters: Vec::new(),
        }
    }
}

impl MetricsConfig {
    /// Create an empty configuration for the default environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Add an adapter entry.
    pub fn with_adapter(mut self, adapter: AdapterConfig) -> Self {
        self.metrics_adapters.push(adapter);
        self
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.environment.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "environment cannot be empty".to_string(),
            ));
        }
        ensure_unique_names(&self.metrics_adapters)
    }
}

/// Configuration for one tracking backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Adapter name, resolved through the registry.
    pub name: String,
    /// Adapter-specific options, passed to the factory verbatim.
    #[serde(default)]
    pub config: Options,
    /// Environments this adapter runs in. Empty means all.
    #[serde(default)]
    pub environments: Vec<String>,
}

impl AdapterConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Options::new(),
            environments: Vec::new(),
        }
    }

    /// Replace the adapter-specific options.
    pub fn with_config(mut self, config: Options) -> Self {
        self.config = config;
        self
    }

    /// Set a single adapter-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Restrict the adapter to the given environments.
    pub fn with_environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = environments.into_iter().map(Into::into).collect();
        self
    }
}

/// Fails on the first adapter name that appears twice.
pub(crate) fn ensure_unique_names(adapters: &[AdapterConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for adapter in adapters {
        if !seen.insert(adapter.name.as_str()) {
            return Err(ConfigError::DuplicateAdapter(adapter.name.clone()));
        }
    }
    Ok(())
}

/// Trait for configurations that support file-based loading.
pub trait FileConfig: Sized {
    /// Load configuration from a file path.
    fn from_file(path: &Path) -> ConfigResult<Self>;

    /// Save configuration to a file path.
    fn to_file(&self, path: &Path) -> ConfigResult<()>;
}

impl FileConfig for MetricsConfig {
    fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    fn to_file(&self, path: &Path) -> ConfigResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_camel_case_document() {
        let config = MetricsConfig::from_json_str(
            r#"{
                "environment": "production",
                "metricsAdapters": [
                    { "name": "ga", "config": { "id": "UA-1" }, "environments": ["production"] },
                    { "name": "mixpanel" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.environment, "production");
        assert_eq!(config.metrics_adapters.len(), 2);
        assert_eq!(config.metrics_adapters[0].config["id"], json!("UA-1"));
        assert!(config.metrics_adapters[1].environments.is_empty());
        assert!(config.metrics_adapters[1].config.is_empty());
    }

    #[test]
    fn test_environment_defaults_to_development() {
        let config = MetricsConfig::from_json_str("{}").unwrap();
        assert_eq!(config.environment, "development");
        assert!(config.metrics_adapters.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = MetricsConfig::from_json_str(
            r#"{ "metricsAdapters": [ { "name": "ga" }, { "name": "ga" } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateAdapter(ref n)) if n == "ga"));
    }

    #[test]
    fn test_blank_environment_rejected() {
        let config = MetricsConfig::new().with_environment("  ");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_name_is_parse_error() {
        let result = MetricsConfig::from_json_str(r#"{ "metricsAdapters": [ {} ] }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "adapter-metrics-config-{}.json",
            std::process::id()
        ));
        let config = MetricsConfig::new()
            .with_environment("test")
            .with_adapter(
                AdapterConfig::new("ga")
                    .with_option("id", "UA-1")
                    .with_environments(["test"]),
            );

        config.to_file(&path).unwrap();
        let loaded = MetricsConfig::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = MetricsConfig::from_file(Path::new("/nonexistent/metrics.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
