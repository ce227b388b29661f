//! # adapter-metrics
//!
//! A dispatch layer that forwards analytics calls (`identify`, `alias`,
//! `trackEvent`, `trackPage`) to any number of tracking backends, called
//! adapters, picking which adapters run from the application environment.
//!
//! ## Overview
//!
//! ```text
//! MetricsConfig ──► MetricsService::activate_adapters
//!                      │  environment filter
//!                      │  AdapterLookup::resolve ──► AdapterFactory::create
//!                      │  headless gate
//!                      ▼
//!                   AdapterCache ◄── identify / alias / track_event / track_page
//!                      │
//!                      ▼
//!                   destroy() / Drop
//! ```
//!
//! - Adapters implement [`Adapter`]; factories implement [`AdapterFactory`]
//!   (closures work too).
//! - Factories are found through an [`AdapterLookup`] passed to the service.
//!   [`AdapterRegistry`] resolves host-application factories before built-ins.
//! - An adapter runs when its `environments` list is empty, contains `"all"`,
//!   or contains the application environment.
//! - Every call merges the service context with the call options.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adapter_metrics::prelude::*;
//!
//! let registry = RegistryBuilder::new()
//!     .with("mixpanel", MixpanelFactory::new())
//!     .build();
//!
//! let config = MetricsConfig::from_json_str(r#"{
//!     "environment": "production",
//!     "metricsAdapters": [{ "name": "mixpanel", "config": { "token": "abc" } }]
//! }"#)?;
//!
//! let metrics = MetricsService::new(config, registry)?;
//! metrics.track_page(options)?;
//! ```

mod adapter;
mod cache;
mod config;
mod environment;
mod error;
pub mod events;
mod registry;
mod service;

pub mod prelude;

pub use adapter::{Adapter, AdapterContext, AdapterExt, AdapterFactory, Method, Options};
pub use cache::{ActivatedAdapter, AdapterCache};
pub use config::{AdapterConfig, FileConfig, MetricsConfig};
pub use environment::{
    resolved_environments, should_activate, ExecutionMode, ALL_ENVIRONMENTS, DEFAULT_ENVIRONMENT,
};
pub use error::{
    AdapterError, AdapterFailure, AdapterResult, ConfigError, ConfigResult, MetricsError,
    MetricsResult, RegistryError, RegistryResult,
};
pub use events::{EventSender, EventStream, ServiceEvent, SkipReason, StreamBuilder};
pub use registry::{dasherize, AdapterLookup, AdapterRegistry, RegistryBuilder};
pub use service::{FailurePolicy, MetricsService, MetricsServiceBuilder, Target};
