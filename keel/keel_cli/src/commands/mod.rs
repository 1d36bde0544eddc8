//! Commands of the `keel` binary
//!
//! Both commands build an [`Application`] from the `[[observers]]` entries of
//! the configuration, registering one [`RecordingObserver`] per entry.

pub mod plan;
pub mod run;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use futures::FutureExt;
use keel_core::{
    init_logging, Application, KeelConfig, LifeCycleEvent, LifeCycleObserver, ObserverConfig,
    ObserverFuture, SharedObserver,
};
use tracing::debug;

/// Namespace of the observer bindings created from configuration
const OBSERVER_NAMESPACE: &str = "observers";

/// Load the configuration and initialize logging from it
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<KeelConfig> {
    let config = KeelConfig::load(path)
        .await
        .context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    Ok(config)
}

/// Observer printing each notification it receives to stdout
pub struct RecordingObserver {
    config: ObserverConfig,
}

impl RecordingObserver {
    /// Create an observer for the declared entry
    pub fn new(config: ObserverConfig) -> Self {
        Self { config }
    }

    fn notify(&self, event: LifeCycleEvent) -> Option<ObserverFuture<'_>> {
        if !self.config.handles(event) {
            return None;
        }
        Some(
            async move {
                println!("{} {}", event, self.config.name);
                if self.config.fail_on == Some(event) {
                    anyhow::bail!("{} is configured to fail on {}", self.config.name, event);
                }
                Ok(())
            }
            .boxed(),
        )
    }
}

impl LifeCycleObserver for RecordingObserver {
    fn start(&self) -> Option<ObserverFuture<'_>> {
        self.notify(LifeCycleEvent::Start)
    }

    fn stop(&self) -> Option<ObserverFuture<'_>> {
        self.notify(LifeCycleEvent::Stop)
    }
}

/// Build an application with one recording observer per declared observer
pub fn build_application(config: &KeelConfig) -> anyhow::Result<Application> {
    let app = Application::new(config.lifecycle.clone())?;

    for declared in &config.observers {
        let key = format!("{}.{}", OBSERVER_NAMESPACE, declared.name);
        let observer: SharedObserver = Arc::new(RecordingObserver::new(declared.clone()));
        let binding = app.life_cycle_observer_value(&key, declared.group.as_deref(), observer)?;
        for tag in &declared.tags {
            binding.tag(tag.as_str());
        }
        debug!("Declared observer {:?}", binding);
    }

    Ok(app)
}

/// Display name of an observer binding key
pub fn observer_name(key: &str) -> &str {
    key.strip_prefix(OBSERVER_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(key)
}
