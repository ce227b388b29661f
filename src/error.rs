//! Error types for the metrics dispatch layer.

use std::fmt;

use thiserror::Error;

use crate::adapter::Method;

/// Root error type for metrics service operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Adapter lookup errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An adapter factory failed while activating the adapter
    #[error("Failed to activate metrics adapter {adapter}: {source}")]
    Activation {
        adapter: String,
        #[source]
        source: AdapterError,
    },

    /// An adapter failed while handling a dispatched call
    #[error("Metrics adapter {adapter} failed on {method}: {source}")]
    Adapter {
        adapter: String,
        method: Method,
        #[source]
        source: AdapterError,
    },

    /// An adapter failed while being destroyed
    #[error("Failed to destroy metrics adapter {adapter}: {source}")]
    Destroy {
        adapter: String,
        #[source]
        source: AdapterError,
    },

    /// One or more adapters failed under the isolating failure policy
    #[error("{} metrics adapter(s) failed during dispatch", .0.len())]
    PartialDispatch(Vec<AdapterFailure>),

    /// The method name does not map to an adapter operation
    #[error("Unknown metrics method: {0}")]
    UnknownMethod(String),
}

/// Errors raised while resolving an adapter name to a factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A name is required but none was given
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Neither the host nor the built-in table has a matching adapter
    #[error("Could not find metrics adapter {0}")]
    AdapterNotFound(String),
}

/// Errors reported by adapter implementations.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The adapter could not carry out the call
    #[error("{0}")]
    Failed(String),

    /// The adapter rejected its configuration
    #[error("Adapter configuration error: {0}")]
    Configuration(String),

    /// Any other error raised by third-party adapter code
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Two adapter entries share a name
    #[error("Metrics adapter {0} is configured more than once")]
    DuplicateAdapter(String),
}

/// A single adapter failure collected under [`FailurePolicy::Isolate`].
///
/// [`FailurePolicy::Isolate`]: crate::FailurePolicy::Isolate
#[derive(Debug)]
pub struct AdapterFailure {
    pub adapter: String,
    pub method: Method,
    pub error: AdapterError,
}

impl fmt::Display for AdapterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed on {}: {}", self.adapter, self.method, self.error)
    }
}

impl From<String> for AdapterError {
    fn from(msg: String) -> Self {
        AdapterError::Failed(msg)
    }
}

impl From<&str> for AdapterError {
    fn from(msg: &str) -> Self {
        AdapterError::Failed(msg.to_string())
    }
}

/// Result type alias for metrics service operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Result type alias for registry lookups.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;
