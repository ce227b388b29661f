//! Adapter capability trait and factory contract.
//!
//! An [`Adapter`] is a live tracking backend that receives dispatched calls.
//! Adapters are built by an [`AdapterFactory`], which the service resolves
//! by name through an [`AdapterLookup`](crate::AdapterLookup).

use std::any::Any;
use std::fmt::{self, Debug};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{AdapterResult, MetricsError};

/// Key/value payload passed to adapter calls.
pub type Options = Map<String, Value>;

/// A tracking backend that receives dispatched analytics calls.
///
/// Every call receives the service context merged with the call options.
///
/// # Example
///
/// ```rust
/// use adapter_metrics::{Adapter, AdapterResult, Options};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Silent;
///
/// impl Adapter for Silent {
///     fn identify(&self, _options: &Options) -> AdapterResult<()> { Ok(()) }
///     fn alias(&self, _options: &Options) -> AdapterResult<()> { Ok(()) }
///     fn track_event(&self, _options: &Options) -> AdapterResult<()> { Ok(()) }
///     fn track_page(&self, _options: &Options) -> AdapterResult<()> { Ok(()) }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Adapter: Send + Sync + Debug {
    /// Associates the current visitor with a known identity.
    fn identify(&self, options: &Options) -> AdapterResult<()>;

    /// Links a new identity to an existing one.
    fn alias(&self, options: &Options) -> AdapterResult<()>;

    /// Records a custom event.
    fn track_event(&self, options: &Options) -> AdapterResult<()>;

    /// Records a page view.
    fn track_page(&self, options: &Options) -> AdapterResult<()>;

    /// Releases resources held by the adapter.
    ///
    /// Called exactly once by the service, either at teardown or when the
    /// adapter is dropped from the active set.
    fn destroy(&mut self) -> AdapterResult<()> {
        Ok(())
    }

    /// Downcast to concrete type for advanced usage.
    fn as_any(&self) -> &dyn Any;
}

/// Extension trait for adapter type checking.
pub trait AdapterExt: Adapter {
    /// Check if this adapter is of type T.
    fn is<T: Adapter + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to type T.
    fn downcast_ref<T: Adapter + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl<A: Adapter + ?Sized> AdapterExt for A {}

/// Everything a factory gets to build an adapter instance.
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext<'a> {
    /// Name the adapter was configured under.
    pub name: &'a str,
    /// Adapter-specific options, passed through verbatim.
    pub config: &'a Options,
    /// Effective environments the adapter was activated for.
    pub environments: &'a [String],
    /// Environment of the owning service.
    pub app_environment: &'a str,
}

/// Builds adapter instances; the registry hands these out by name.
pub trait AdapterFactory: Send + Sync {
    /// Construct a new adapter instance.
    fn create(&self, ctx: AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>>;

    /// Whether instances may run in headless (server-rendered) mode.
    fn supports_headless_execution(&self) -> bool {
        false
    }
}

impl<F> AdapterFactory for F
where
    F: Fn(AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>> + Send + Sync,
{
    fn create(&self, ctx: AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>> {
        self(ctx)
    }
}

/// The tracking operations an adapter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Identify,
    Alias,
    TrackEvent,
    TrackPage,
}

impl Method {
    /// All dispatchable methods.
    pub const ALL: [Method; 4] = [
        Method::Identify,
        Method::Alias,
        Method::TrackEvent,
        Method::TrackPage,
    ];

    /// Canonical camelCase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Identify => "identify",
            Method::Alias => "alias",
            Method::TrackEvent => "trackEvent",
            Method::TrackPage => "trackPage",
        }
    }

    /// Invoke this method on an adapter.
    pub fn call(self, adapter: &dyn Adapter, options: &Options) -> AdapterResult<()> {
        match self {
            Method::Identify => adapter.identify(options),
            Method::Alias => adapter.alias(options),
            Method::TrackEvent => adapter.track_event(options),
            Method::TrackPage => adapter.track_page(options),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identify" => Ok(Method::Identify),
            "alias" => Ok(Method::Alias),
            "trackEvent" | "track_event" => Ok(Method::TrackEvent),
            "trackPage" | "track_page" => Ok(Method::TrackPage),
            other => Err(MetricsError::UnknownMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Recorder {
        fn push(&self, call: &'static str) -> AdapterResult<()> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl Adapter for Recorder {
        fn identify(&self, _options: &Options) -> AdapterResult<()> {
            self.push("identify")
        }

        fn alias(&self, _options: &Options) -> AdapterResult<()> {
            self.push("alias")
        }

        fn track_event(&self, _options: &Options) -> AdapterResult<()> {
            self.push("trackEvent")
        }

        fn track_page(&self, _options: &Options) -> AdapterResult<()> {
            self.push("trackPage")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("trackEvent".parse::<Method>().unwrap(), Method::TrackEvent);
        assert_eq!("track_page".parse::<Method>().unwrap(), Method::TrackPage);
        assert!(matches!(
            "trackScroll".parse::<Method>(),
            Err(MetricsError::UnknownMethod(ref m)) if m == "trackScroll"
        ));
    }

    #[test]
    fn test_method_call_routes_to_adapter() {
        let recorder = Recorder::default();
        for method in Method::ALL {
            method.call(&recorder, &Options::new()).unwrap();
        }
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["identify", "alias", "trackEvent", "trackPage"]
        );
    }

    #[test]
    fn test_adapter_downcast() {
        let boxed: Box<dyn Adapter> = Box::new(Recorder::default());
        assert!(boxed.is::<Recorder>());
        assert!(boxed.downcast_ref::<Recorder>().is_some());
    }

    #[test]
    fn test_closure_factory() {
        let factory = |ctx: AdapterContext<'_>| -> AdapterResult<Box<dyn Adapter>> {
            assert_eq!(ctx.name, "recorder");
            Ok(Box::new(Recorder::default()))
        };
        let config = Options::new();
        let envs = vec!["all".to_string()];
        let adapter = factory
            .create(AdapterContext {
                name: "recorder",
                config: &config,
                environments: &envs,
                app_environment: "test",
            })
            .unwrap();
        assert!(adapter.is::<Recorder>());
        assert!(!factory.supports_headless_execution());
    }
}
