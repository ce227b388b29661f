//! Prelude module for convenient imports.
//!
//! ```rust
//! use adapter_metrics::prelude::*;
//! ```

// Configuration
pub use crate::config::{AdapterConfig, FileConfig, MetricsConfig};

// Adapter contract
pub use crate::adapter::{Adapter, AdapterContext, AdapterExt, AdapterFactory, Method, Options};

// Lookup
pub use crate::registry::{AdapterLookup, AdapterRegistry, RegistryBuilder};

// Service
pub use crate::cache::{ActivatedAdapter, AdapterCache};
pub use crate::environment::ExecutionMode;
pub use crate::service::{FailurePolicy, MetricsService, Target};

// Events
pub use crate::events::{EventSender, EventStream, ServiceEvent, SkipReason, StreamBuilder};

// Errors
pub use crate::error::{
    AdapterError, AdapterResult, ConfigError, MetricsError, MetricsResult, RegistryError,
    RegistryResult,
};
