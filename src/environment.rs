//! Environment gating for adapter activation.

use crate::config::AdapterConfig;

/// Environment token that matches every application environment.
pub const ALL_ENVIRONMENTS: &str = "all";

/// Application environment used when the configuration does not name one.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// How the host is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// A live, browser-like environment. Every adapter may run.
    #[default]
    Interactive,
    /// Server-side rendering. Only adapters that declare headless support run.
    Headless,
}

impl ExecutionMode {
    pub fn is_headless(&self) -> bool {
        matches!(self, ExecutionMode::Headless)
    }
}

/// Returns whether an adapter configured with `config` should run in
/// `app_environment`.
///
/// Matching is exact and case-sensitive. An empty environment list behaves
/// like `["all"]`.
pub fn should_activate(config: &AdapterConfig, app_environment: &str) -> bool {
    let environments = &config.environments;
    if environments.is_empty() {
        return true;
    }
    environments
        .iter()
        .any(|env| env == ALL_ENVIRONMENTS || env == app_environment)
}

/// The environment list an adapter is effectively activated for.
pub fn resolved_environments(config: &AdapterConfig) -> Vec<String> {
    if config.environments.is_empty() {
        vec![ALL_ENVIRONMENTS.to_string()]
    } else {
        config.environments.clone()
    }
}
