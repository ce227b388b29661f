//! Example: wiring adapters into a metrics service
//!
//! Two console-backed adapters stand in for real analytics backends. Run with
//! `RUST_LOG=debug` to see the service's own diagnostics.

use adapter_metrics::prelude::*;
use serde_json::json;
use std::any::Any;
use tracing_subscriber::EnvFilter;

/// Prints every call it receives, prefixed with its configured label.
#[derive(Debug)]
struct ConsoleAdapter {
    label: String,
}

impl ConsoleAdapter {
    fn print(&self, method: Method, options: &Options) -> AdapterResult<()> {
        let payload = serde_json::to_string(options).map_err(|e| AdapterError::Failed(e.to_string()))?;
        println!("[{}] {} {}", self.label, method, payload);
        Ok(())
    }
}

impl Adapter for ConsoleAdapter {
    fn identify(&self, options: &Options) -> AdapterResult<()> {
        self.print(Method::Identify, options)
    }

    fn alias(&self, options: &Options) -> AdapterResult<()> {
        self.print(Method::Alias, options)
    }

    fn track_event(&self, options: &Options) -> AdapterResult<()> {
        self.print(Method::TrackEvent, options)
    }

    fn track_page(&self, options: &Options) -> AdapterResult<()> {
        self.print(Method::TrackPage, options)
    }

    fn destroy(&mut self) -> AdapterResult<()> {
        println!("[{}] destroyed", self.label);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn console_factory(ctx: AdapterContext<'_>) -> AdapterResult<Box<dyn Adapter>> {
    let label = ctx
        .config
        .get("label")
        .and_then(|v| v.as_str())
        .unwrap_or(ctx.name)
        .to_string();
    Ok(Box::new(ConsoleAdapter { label }))
}

fn options(value: serde_json::Value) -> Options {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Options::new(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = RegistryBuilder::new()
        .with_builtin("googleAnalytics", console_factory)
        .with("mixpanel", console_factory)
        .build();

    let config = MetricsConfig::from_json_str(
        r#"{
            "environment": "development",
            "metricsAdapters": [
                { "name": "googleAnalytics", "config": { "label": "GA" }, "environments": ["production"] },
                { "name": "mixpanel", "config": { "label": "MP" } },
                { "name": "GoogleAnalytics", "config": { "label": "GA-dev" }, "environments": ["development"] }
            ]
        }"#,
    )?;

    let mut metrics = MetricsService::new(config, registry)?;
    println!("active adapters: {:?}", metrics.adapters().names());

    metrics
        .context_mut()
        .insert("appVersion".to_string(), json!("1.4.0"));

    metrics.identify(options(json!({ "distinctId": "user-42" })))?;
    metrics.track_page(options(json!({ "page": "/home", "title": "Home" })))?;
    metrics.track_event_for(
        "mixpanel",
        options(json!({ "category": "signup", "action": "click" })),
    )?;

    metrics.set_enabled(false);
    metrics.track_event(options(json!({ "category": "ignored" })))?;
    metrics.set_enabled(true);

    metrics.destroy()?;
    Ok(())
}
