//! The set of live adapter instances owned by a service.

use std::collections::HashMap;

use crate::adapter::Adapter;

/// A constructed adapter together with the name and environments it was
/// activated under.
#[derive(Debug)]
pub struct ActivatedAdapter {
    name: String,
    instance: Box<dyn Adapter>,
    environments: Vec<String>,
}

impl ActivatedAdapter {
    pub fn new(
        name: impl Into<String>,
        instance: Box<dyn Adapter>,
        environments: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instance,
            environments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> &dyn Adapter {
        self.instance.as_ref()
    }

    pub(crate) fn instance_mut(&mut self) -> &mut dyn Adapter {
        self.instance.as_mut()
    }

    /// Effective environments; `["all"]` when the configuration named none.
    pub fn environments(&self) -> &[String] {
        &self.environments
    }
}

/// Activated adapters keyed by name, iterated in activation order.
///
/// Only fully constructed instances are ever inserted.
#[derive(Debug, Default)]
pub struct AdapterCache {
    adapters: HashMap<String, ActivatedAdapter>,
    ordered: Vec<String>,
}

impl AdapterCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an adapter, replacing any entry with the same name.
    pub(crate) fn insert(&mut self, adapter: ActivatedAdapter) -> Option<ActivatedAdapter> {
        let name = adapter.name.clone();
        if !self.adapters.contains_key(&name) {
            self.ordered.push(name.clone());
        }
        self.adapters.insert(name, adapter)
    }

    /// Get an activated adapter by name.
    pub fn get(&self, name: &str) -> Option<&ActivatedAdapter> {
        self.adapters.get(name)
    }

    /// Check if an adapter with the given name is active.
    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Remove an adapter by name.
    pub(crate) fn remove(&mut self, name: &str) -> Option<ActivatedAdapter> {
        self.ordered.retain(|n| n != name);
        self.adapters.remove(name)
    }

    /// Remove and return the earliest-activated adapter.
    pub(crate) fn pop_front(&mut self) -> Option<ActivatedAdapter> {
        if self.ordered.is_empty() {
            return None;
        }
        let name = self.ordered.remove(0);
        self.adapters.remove(&name)
    }

    /// Move every entry of `other` to the end of this cache.
    pub(crate) fn absorb(&mut self, mut other: AdapterCache) {
        while let Some(adapter) = other.pop_front() {
            self.insert(adapter);
        }
    }

    /// Names of all active adapters, in activation order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|s| s.as_str()).collect()
    }

    /// Get the number of active adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Check if no adapter is active.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Iterate over all active adapters in activation order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivatedAdapter> {
        self.ordered
            .iter()
            .filter_map(move |name| self.adapters.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Options;
    use crate::error::AdapterResult;
    use std::any::Any;

    #[derive(Debug)]
    struct Nop;

    impl Adapter for Nop {
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

    fn activated(name: &str) -> ActivatedAdapter {
        ActivatedAdapter::new(name, Box::new(Nop), vec!["all".to_string()])
    }

    #[test]
    fn test_cache_keeps_activation_order() {
        let mut cache = AdapterCache::new();
        cache.insert(activated("mixpanel"));
        cache.insert(activated("ga"));
        cache.insert(activated("segment"));

        assert_eq!(cache.names(), vec!["mixpanel", "ga", "segment"]);
        let iterated: Vec<&str> = cache.iter().map(|a| a.name()).collect();
        assert_eq!(iterated, vec!["mixpanel", "ga", "segment"]);
    }

    #[test]
    fn test_insert_replaces_without_reordering() {
        let mut cache = AdapterCache::new();
        cache.insert(activated("a"));
        cache.insert(activated("b"));

        let previous = cache.insert(activated("a"));
        assert!(previous.is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_and_pop_front() {
        let mut cache = AdapterCache::new();
        cache.insert(activated("a"));
        cache.insert(activated("b"));
        cache.insert(activated("c"));

        assert!(cache.remove("b").is_some());
        assert!(!cache.contains("b"));
        assert_eq!(cache.pop_front().map(|a| a.name().to_string()), Some("a".to_string()));
        assert_eq!(cache.names(), vec!["c"]);
        assert!(cache.pop_front().is_some());
        assert!(cache.pop_front().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_absorb_appends_entries() {
        let mut first = AdapterCache::new();
        first.insert(activated("a"));
        let mut second = AdapterCache::new();
        second.insert(activated("b"));
        second.insert(activated("c"));

        first.absorb(second);
        assert_eq!(first.names(), vec!["a", "b", "c"]);
        assert_eq!(first.get("b").unwrap().environments(), &["all".to_string()]);
    }
}
