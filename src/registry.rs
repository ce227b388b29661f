//! Name-based lookup of adapter factories.
//!
//! The service never discovers adapters on its own. It is handed an
//! [`AdapterLookup`] at construction and asks it to resolve each configured
//! adapter name. [`AdapterRegistry`] is the stock implementation: it keeps a
//! table of host-application factories and a table of built-in factories, and
//! prefers the host's when both define the same name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::AdapterFactory;
use crate::error::{RegistryError, RegistryResult};

/// Resolves an adapter name to the factory that builds it.
pub trait AdapterLookup: Send + Sync {
    fn resolve(&self, name: &str) -> RegistryResult<Arc<dyn AdapterFactory>>;
}

impl<F> AdapterLookup for F
where
    F: Fn(&str) -> RegistryResult<Arc<dyn AdapterFactory>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> RegistryResult<Arc<dyn AdapterFactory>> {
        self(name)
    }
}

/// Canonical dash-separated form of an adapter name.
///
/// camelCase boundaries, spaces and underscores become dashes and the result
/// is lower-cased: `googleAnalytics`, `GoogleAnalytics` and
/// `google_analytics` all map to `google-analytics`.
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.trim().chars() {
        if ch.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('-');
        }
        match ch {
            ' ' | '_' => out.push('-'),
            c => out.extend(c.to_lowercase()),
        }
        prev = Some(ch);
    }
    out
}

#[derive(Default)]
struct FactoryTable {
    factories: HashMap<String, Arc<dyn AdapterFactory>>,
    ordered: Vec<String>,
}

impl FactoryTable {
    fn insert(&mut self, name: String, factory: Arc<dyn AdapterFactory>) {
        if !self.factories.contains_key(&name) {
            self.ordered.push(name.clone());
        }
        self.factories.insert(name, factory);
    }

    fn remove(&mut self, name: &str) -> Option<Arc<dyn AdapterFactory>> {
        self.ordered.retain(|n| n != name);
        self.factories.remove(name)
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn AdapterFactory>> {
        self.factories.get(name)
    }
}

/// A registry of adapter factories keyed by normalized name.
///
/// # Example
///
/// ```rust
/// use adapter_metrics::{Adapter, AdapterContext, AdapterLookup, AdapterRegistry, AdapterResult};
///
/// fn build_noop(_ctx: AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>> {
///     Err("not wired in this example".into())
/// }
///
/// let mut registry = AdapterRegistry::new();
/// registry.register_builtin("googleAnalytics", build_noop);
///
/// assert!(registry.resolve("google_analytics").is_ok());
/// assert!(registry.resolve("mixpanel").is_err());
/// ```
#[derive(Default)]
pub struct AdapterRegistry {
    host: FactoryTable,
    builtin: FactoryTable,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host-application factory. Host factories shadow built-ins
    /// of the same name. An existing host factory of that name is replaced.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: AdapterFactory + 'static,
    {
        self.register_arc(name, Arc::new(factory));
    }

    /// Register a shared host-application factory.
    pub fn register_arc(&mut self, name: &str, factory: Arc<dyn AdapterFactory>) {
        self.host.insert(dasherize(name), factory);
    }

    /// Register a built-in factory.
    pub fn register_builtin<F>(&mut self, name: &str, factory: F)
    where
        F: AdapterFactory + 'static,
    {
        self.builtin.insert(dasherize(name), Arc::new(factory));
    }

    /// Remove the host factory for `name`, uncovering any built-in one.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn AdapterFactory>> {
        self.host.remove(&dasherize(name))
    }

    /// Check if any factory answers to `name`.
    pub fn contains(&self, name: &str) -> bool {
        let key = dasherize(name);
        self.host.get(&key).is_some() || self.builtin.get(&key).is_some()
    }

    /// Normalized names of all resolvable adapters: host registrations first,
    /// then built-ins that are not shadowed.
    pub fn names(&self) -> Vec<&str> {
        self.host
            .ordered
            .iter()
            .chain(
                self.builtin
                    .ordered
                    .iter()
                    .filter(|name| self.host.get(name).is_none()),
            )
            .map(|s| s.as_str())
            .collect()
    }

    /// Number of distinct resolvable names.
    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.host.ordered.is_empty() && self.builtin.ordered.is_empty()
    }
}

impl AdapterLookup for AdapterRegistry {
    fn resolve(&self, name: &str) -> RegistryResult<Arc<dyn AdapterFactory>> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "an adapter name is required".to_string(),
            ));
        }
        let key = dasherize(name);
        self.host
            .get(&key)
            .or_else(|| self.builtin.get(&key))
            .cloned()
            .ok_or_else(|| RegistryError::AdapterNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("host", &self.host.ordered)
            .field("builtin", &self.builtin.ordered)
            .finish()
    }
}

/// Builder for creating registries with fluent API.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: AdapterRegistry,
}

impl RegistryBuilder {
    /// Create a new registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host-application factory.
    pub fn with<F>(mut self, name: &str, factory: F) -> Self
    where
        F: AdapterFactory + 'static,
    {
        self.registry.register(name, factory);
        self
    }

    /// Add a built-in factory.
    pub fn with_builtin<F>(mut self, name: &str, factory: F) -> Self
    where
        F: AdapterFactory + 'static,
    {
        self.registry.register_builtin(name, factory);
        self
    }

    /// Build the registry.
    pub fn build(self) -> AdapterRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Adapter, AdapterContext, Options};
    use crate::error::AdapterResult;
    use std::any::Any;

    #[derive(Debug)]
    struct Tagged(&'static str);

    impl Adapter for Tagged {
        fn identify(&self, _options: &Options) -> AdapterResult<()> {
            Ok(())
        }
        fn alias(&self, _options: &Options) -> AdapterResult<()> {
            Ok(())
        }
        fn track_event(&self, _options: &Options) -> AdapterResult<()> {
            Ok(())
        }
        fn track_page(&self, _options: &Options) -> AdapterResult<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct TaggedFactory(&'static str);

    impl AdapterFactory for TaggedFactory {
        fn create(&self, _ctx: AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>> {
            Ok(Box::new(Tagged(self.0)))
        }
    }

    fn build_tag(registry: &AdapterRegistry, name: &str) -> &'static str {
        let factory = registry.resolve(name).unwrap();
        let config = Options::new();
        let adapter = factory
            .create(AdapterContext {
                name,
                config: &config,
                environments: &[],
                app_environment: "test",
            })
            .unwrap();
        adapter.as_any().downcast_ref::<Tagged>().unwrap().0
    }

    #[test]
    fn test_dasherize() {
        assert_eq!(dasherize("googleAnalytics"), "google-analytics");
        assert_eq!(dasherize("GoogleAnalytics"), "google-analytics");
        assert_eq!(dasherize("google_analytics"), "google-analytics");
        assert_eq!(dasherize("Google Analytics"), "google-analytics");
        assert_eq!(dasherize("google-analytics"), "google-analytics");
        assert_eq!(dasherize("piwik2Tracker"), "piwik2-tracker");
        assert_eq!(dasherize("mixpanel"), "mixpanel");
    }

    #[test]
    fn test_host_factory_wins_over_builtin() {
        let registry = RegistryBuilder::new()
            .with_builtin("mixpanel", TaggedFactory("builtin"))
            .with("mixpanel", TaggedFactory("host"))
            .build();

        assert_eq!(build_tag(&registry, "mixpanel"), "host");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_used_when_no_host_factory() {
        let mut registry = AdapterRegistry::new();
        registry.register_builtin("googleAnalytics", TaggedFactory("builtin"));
        registry.register("googleAnalytics", TaggedFactory("host"));
        registry.unregister("google-analytics");

        assert_eq!(build_tag(&registry, "GoogleAnalytics"), "builtin");
    }

    #[test]
    fn test_lookup_normalizes_name() {
        let registry = RegistryBuilder::new()
            .with("google-analytics", TaggedFactory("ga"))
            .build();

        assert!(registry.contains("googleAnalytics"));
        assert_eq!(build_tag(&registry, "google_analytics"), "ga");
    }

    #[test]
    fn test_missing_adapter() {
        let registry = AdapterRegistry::new();
        assert_eq!(
            registry.resolve("segment").err(),
            Some(RegistryError::AdapterNotFound("segment".to_string()))
        );
    }

    #[test]
    fn test_empty_name_is_invalid_argument() {
        let registry = RegistryBuilder::new()
            .with("ga", TaggedFactory("ga"))
            .build();
        assert!(matches!(
            registry.resolve(""),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.resolve("   "),
            Err(RegistryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_names_order() {
        let registry = RegistryBuilder::new()
            .with_builtin("a", TaggedFactory("a"))
            .with_builtin("b", TaggedFactory("b"))
            .with("c", TaggedFactory("c"))
            .with("b", TaggedFactory("b2"))
            .build();

        assert_eq!(registry.names(), vec!["c", "b", "a"]);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_closure_lookup() {
        let lookup = |name: &str| -> RegistryResult<Arc<dyn AdapterFactory>> {
            match name {
                "ga" => Ok(Arc::new(TaggedFactory("ga"))),
                other => Err(RegistryError::AdapterNotFound(other.to_string())),
            }
        };
        assert!(lookup.resolve("ga").is_ok());
        assert!(lookup.resolve("mixpanel").is_err());
    }
}
