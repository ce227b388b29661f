//! The metrics service: adapter activation, dispatch and teardown.
//!
//! A [`MetricsService`] owns a cache of live adapters. Activation builds that
//! cache from [`AdapterConfig`] entries, filtering by environment and
//! execution mode. Every tracking call is fanned out to the cached adapters
//! with the service context merged into the call options.

use std::fmt;

use tracing::{debug, error, info, trace, warn};

use crate::adapter::{AdapterContext, Method, Options};
use crate::cache::{ActivatedAdapter, AdapterCache};
use crate::config::{ensure_unique_names, AdapterConfig, MetricsConfig};
use crate::environment::{resolved_environments, should_activate, ExecutionMode};
use crate::error::{AdapterFailure, MetricsError, MetricsResult};
use crate::events::{EventSender, EventStream, ServiceEvent, SkipReason, StreamBuilder};
use crate::registry::AdapterLookup;

/// Which adapters a dispatched call goes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// Every active adapter, in activation order.
    #[default]
    All,
    /// Only the named adapters, in the given order. Unknown names are ignored.
    Named(Vec<String>),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Named(vec![name.to_string()])
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Named(vec![name])
    }
}

impl From<Vec<String>> for Target {
    fn from(names: Vec<String>) -> Self {
        Target::Named(names)
    }
}

impl From<Vec<&str>> for Target {
    fn from(names: Vec<&str>) -> Self {
        Target::Named(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Target {
    fn from(names: &[&str]) -> Self {
        Target::Named(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Target {
    fn from(names: [&str; N]) -> Self {
        Target::Named(names.iter().map(|n| n.to_string()).collect())
    }
}

/// What dispatch does when an adapter returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing adapter and return its error.
    #[default]
    Propagate,
    /// Deliver to every selected adapter, then report all failures together.
    Isolate,
}

/// Fans analytics calls out to the adapters active in this environment.
///
/// # Example
///
/// ```rust,ignore
/// let mut metrics = MetricsService::new(config, registry)?;
/// metrics.context_mut().insert("userId".into(), "42".into());
/// metrics.track_page(options)?;
/// metrics.track_event_for("mixpanel", options)?;
/// metrics.destroy()?;
/// ```
pub struct MetricsService {
    lookup: Box<dyn AdapterLookup>,
    environment: String,
    execution_mode: ExecutionMode,
    failure_policy: FailurePolicy,
    adapters: AdapterCache,
    context: Options,
    enabled: bool,
    events: Option<EventSender<ServiceEvent>>,
}

impl MetricsService {
    /// Create a service and activate the configured adapters.
    pub fn new(config: MetricsConfig, lookup: impl AdapterLookup + 'static) -> MetricsResult<Self> {
        Self::builder(lookup).config(config).build()
    }

    /// Start building a service around `lookup`.
    pub fn builder(lookup: impl AdapterLookup + 'static) -> MetricsServiceBuilder {
        MetricsServiceBuilder::new(lookup)
    }

    /// Rebuild the adapter cache from `configs`.
    ///
    /// Adapters already active under the same name are kept rather than
    /// rebuilt. Adapters that were active but are not in `configs` (or no
    /// longer pass the environment or headless checks) are destroyed.
    ///
    /// A lookup or factory failure aborts activation. Adapters activated
    /// before the failure stay cached, as do previously active adapters that
    /// had not been reached yet.
    ///
    /// A failure while destroying a dropped adapter is returned after the new
    /// set is already active; the remaining dropped adapters are still
    /// destroyed.
    pub fn activate_adapters(&mut self, configs: &[AdapterConfig]) -> MetricsResult<&AdapterCache> {
        ensure_unique_names(configs)?;

        let mut previous = std::mem::take(&mut self.adapters);
        let mut activated = AdapterCache::new();

        for config in configs {
            match self.activate_adapter(config, &mut previous) {
                Ok(Some(adapter)) => {
                    activated.insert(adapter);
                }
                Ok(None) => {}
                Err(err) => {
                    activated.absorb(previous);
                    self.adapters = activated;
                    return Err(err);
                }
            }
        }

        self.adapters = activated;
        self.destroy_dropped(previous)?;
        Ok(&self.adapters)
    }

    fn activate_adapter(
        &self,
        config: &AdapterConfig,
        previous: &mut AdapterCache,
    ) -> MetricsResult<Option<ActivatedAdapter>> {
        let name = config.name.as_str();

        if !should_activate(config, &self.environment) {
            debug!(
                adapter = %name,
                environment = %self.environment,
                "Metrics adapter not enabled for this environment"
            );
            self.emit(ServiceEvent::AdapterSkipped {
                adapter: name.to_string(),
                reason: SkipReason::Environment,
            });
            return Ok(None);
        }

        let factory = self.lookup.resolve(name)?;

        if self.execution_mode.is_headless() && !factory.supports_headless_execution() {
            debug!(adapter = %name, "Metrics adapter does not support headless execution");
            self.emit(ServiceEvent::AdapterSkipped {
                adapter: name.to_string(),
                reason: SkipReason::Headless,
            });
            return Ok(None);
        }

        if let Some(existing) = previous.remove(name) {
            warn!(adapter = %name, "Metrics adapter {} has already been activated", name);
            self.emit(ServiceEvent::AdapterReused {
                adapter: name.to_string(),
            });
            return Ok(Some(existing));
        }

        let environments = resolved_environments(config);
        let instance = factory
            .create(AdapterContext {
                name,
                config: &config.config,
                environments: &environments,
                app_environment: &self.environment,
            })
            .map_err(|source| MetricsError::Activation {
                adapter: name.to_string(),
                source,
            })?;

        info!(adapter = %name, environments = ?environments, "Activated metrics adapter");
        self.emit(ServiceEvent::AdapterActivated {
            adapter: name.to_string(),
        });
        Ok(Some(ActivatedAdapter::new(name, instance, environments)))
    }

    /// Destroy adapters left out of a re-activation. Every one is attempted;
    /// the first failure is returned.
    fn destroy_dropped(&self, mut dropped: AdapterCache) -> MetricsResult<()> {
        let mut first_error = None;
        while let Some(mut adapter) = dropped.pop_front() {
            let name = adapter.name().to_string();
            match adapter.instance_mut().destroy() {
                Ok(()) => {
                    debug!(adapter = %name, "Destroyed metrics adapter dropped on re-activation");
                    self.emit(ServiceEvent::AdapterDropped { adapter: name });
                }
                Err(source) => {
                    error!(adapter = %name, error = %source, "Failed to destroy dropped metrics adapter");
                    first_error.get_or_insert(MetricsError::Destroy {
                        adapter: name,
                        source,
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Send `method` to the adapters selected by `target`.
    ///
    /// Does nothing while the service is disabled. The call options are laid
    /// over a copy of the service context; call keys win.
    pub fn invoke(
        &self,
        method: Method,
        target: impl Into<Target>,
        options: Options,
    ) -> MetricsResult<()> {
        if !self.enabled {
            trace!(method = %method, "Metrics service disabled; skipping dispatch");
            return Ok(());
        }

        let target = target.into();
        let selected: Vec<&ActivatedAdapter> = match &target {
            Target::All => self.adapters.iter().collect(),
            Target::Named(names) => names
                .iter()
                .filter_map(|name| {
                    let adapter = self.adapters.get(name);
                    if adapter.is_none() {
                        trace!(adapter = %name, method = %method, "No active metrics adapter by this name");
                    }
                    adapter
                })
                .collect(),
        };
        if selected.is_empty() {
            return Ok(());
        }

        let merged = self.merged_options(options);
        let mut failures = Vec::new();

        for adapter in selected {
            match method.call(adapter.instance(), &merged) {
                Ok(()) => {
                    trace!(adapter = %adapter.name(), method = %method, "Dispatched metrics call");
                    self.emit(ServiceEvent::Dispatched {
                        method,
                        adapter: adapter.name().to_string(),
                    });
                }
                Err(source) => match self.failure_policy {
                    FailurePolicy::Propagate => {
                        return Err(MetricsError::Adapter {
                            adapter: adapter.name().to_string(),
                            method,
                            source,
                        });
                    }
                    FailurePolicy::Isolate => {
                        error!(
                            adapter = %adapter.name(),
                            method = %method,
                            error = %source,
                            "Metrics adapter failed; continuing with remaining adapters"
                        );
                        failures.push(AdapterFailure {
                            adapter: adapter.name().to_string(),
                            method,
                            error: source,
                        });
                    }
                },
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MetricsError::PartialDispatch(failures))
        }
    }

    /// Send `method` to every active adapter.
    pub fn invoke_all(&self, method: Method, options: Options) -> MetricsResult<()> {
        self.invoke(method, Target::All, options)
    }

    /// Send `method` only to the named adapters.
    pub fn invoke_named<I, S>(&self, method: Method, names: I, options: Options) -> MetricsResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        self.invoke(method, Target::Named(names), options)
    }

    /// Like [`invoke`](Self::invoke), with the method given by name
    /// (`"trackEvent"` or `"track_event"`).
    pub fn invoke_by_name(
        &self,
        method: &str,
        target: impl Into<Target>,
        options: Options,
    ) -> MetricsResult<()> {
        self.invoke(method.parse()?, target, options)
    }

    /// Send `identify` to every active adapter.
    pub fn identify(&self, options: Options) -> MetricsResult<()> {
        self.invoke(Method::Identify, Target::All, options)
    }

    /// Send `identify` to the adapters named by `target`.
    pub fn identify_for(&self, target: impl Into<Target>, options: Options) -> MetricsResult<()> {
        self.invoke(Method::Identify, target, options)
    }

    /// Send `alias` to every active adapter.
    pub fn alias(&self, options: Options) -> MetricsResult<()> {
        self.invoke(Method::Alias, Target::All, options)
    }

    /// Send `alias` to the adapters named by `target`.
    pub fn alias_for(&self, target: impl Into<Target>, options: Options) -> MetricsResult<()> {
        self.invoke(Method::Alias, target, options)
    }

    /// Send `trackEvent` to every active adapter.
    pub fn track_event(&self, options: Options) -> MetricsResult<()> {
        self.invoke(Method::TrackEvent, Target::All, options)
    }

    /// Send `trackEvent` to the adapters named by `target`.
    pub fn track_event_for(&self, target: impl Into<Target>, options: Options) -> MetricsResult<()> {
        self.invoke(Method::TrackEvent, target, options)
    }

    /// Send `trackPage` to every active adapter.
    pub fn track_page(&self, options: Options) -> MetricsResult<()> {
        self.invoke(Method::TrackPage, Target::All, options)
    }

    /// Send `trackPage` to the adapters named by `target`.
    pub fn track_page_for(&self, target: impl Into<Target>, options: Options) -> MetricsResult<()> {
        self.invoke(Method::TrackPage, target, options)
    }

    fn merged_options(&self, options: Options) -> Options {
        let mut merged = self.context.clone();
        merged.extend(options);
        merged
    }

    /// Destroy every active adapter.
    ///
    /// Each adapter is removed from the cache before its `destroy` runs, so
    /// no adapter is destroyed twice. If one fails the error is returned and
    /// the adapters after it stay active until the next call.
    pub fn destroy(&mut self) -> MetricsResult<()> {
        while let Some(mut adapter) = self.adapters.pop_front() {
            let name = adapter.name().to_string();
            adapter
                .instance_mut()
                .destroy()
                .map_err(|source| MetricsError::Destroy {
                    adapter: name.clone(),
                    source,
                })?;
            debug!(adapter = %name, "Destroyed metrics adapter");
            self.emit(ServiceEvent::AdapterDestroyed { adapter: name });
        }
        Ok(())
    }

    /// Stream of lifecycle events from now on. Replaces any earlier
    /// subscription.
    pub fn subscribe(&mut self) -> EventStream<ServiceEvent> {
        let (sender, stream) = StreamBuilder::new().build();
        self.events = Some(sender);
        stream
    }

    fn emit(&self, event: ServiceEvent) {
        if let Some(events) = &self.events {
            if events.is_closed() {
                trace!("No listener for metrics service events");
                return;
            }
            if let Err(event) = events.try_send(event) {
                debug!(?event, "Dropping metrics service event");
            }
        }
    }

    /// The currently active adapters.
    pub fn adapters(&self) -> &AdapterCache {
        &self.adapters
    }

    /// Application environment fixed at construction.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Execution mode fixed at construction.
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// Context merged into every dispatched call.
    pub fn context(&self) -> &Options {
        &self.context
    }

    /// Mutable access to the dispatch context.
    pub fn context_mut(&mut self) -> &mut Options {
        &mut self.context
    }

    /// Replace the dispatch context.
    pub fn set_context(&mut self, context: Options) {
        self.context = context;
    }

    /// Whether dispatch is currently enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable dispatch for every adapter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// How dispatch reacts to adapter errors.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Change how dispatch reacts to adapter errors.
    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.failure_policy = policy;
    }
}

impl Drop for MetricsService {
    fn drop(&mut self) {
        while !self.adapters.is_empty() {
            if let Err(err) = self.destroy() {
                error!(error = %err, "Metrics adapter teardown failed");
            }
        }
    }
}

impl fmt::Debug for MetricsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsService")
            .field("environment", &self.environment)
            .field("execution_mode", &self.execution_mode)
            .field("failure_policy", &self.failure_policy)
            .field("adapters", &self.adapters.names())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MetricsService`].
pub struct MetricsServiceBuilder {
    lookup: Box<dyn AdapterLookup>,
    config: MetricsConfig,
    execution_mode: ExecutionMode,
    failure_policy: FailurePolicy,
    context: Options,
    enabled: bool,
    events: Option<EventSender<ServiceEvent>>,
}

impl MetricsServiceBuilder {
    /// Create a builder with default settings.
    pub fn new(lookup: impl AdapterLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            config: MetricsConfig::default(),
            execution_mode: ExecutionMode::default(),
            failure_policy: FailurePolicy::default(),
            context: Options::new(),
            enabled: true,
            events: None,
        }
    }

    /// Set the configuration to build from.
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the execution mode used for headless gating.
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    /// Set how dispatch reacts to adapter errors.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Initial context merged into every call.
    pub fn context(mut self, context: Options) -> Self {
        self.context = context;
        self
    }

    /// Start the service enabled or disabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Report lifecycle events, including those from the initial activation.
    pub fn events(mut self, sender: EventSender<ServiceEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Validate the configuration, create the service and activate its
    /// adapters.
    pub fn build(self) -> MetricsResult<MetricsService> {
        self.config.validate()?;
        let MetricsConfig {
            environment,
            metrics_adapters,
        } = self.config;

        let mut service = MetricsService {
            lookup: self.lookup,
            environment,
            execution_mode: self.execution_mode,
            failure_policy: self.failure_policy,
            adapters: AdapterCache::new(),
            context: self.context,
            enabled: self.enabled,
            events: self.events,
        };
        service.activate_adapters(&metrics_adapters)?;
        Ok(service)
    }
}
