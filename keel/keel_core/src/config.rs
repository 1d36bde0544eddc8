//! Configuration for Keel
//!
//! Handles loading and validating the TOML configuration that controls observer
//! ordering, logging and the observer plans used by the `keel` binary.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::lifecycle::LifeCycleEvent;

/// Groups notified first on start, and last on stop, by default
pub const DEFAULT_ORDERED_GROUPS: &[&str] = &["server"];

fn default_ordered_groups() -> Vec<String> {
    DEFAULT_ORDERED_GROUPS
        .iter()
        .map(|g| g.to_string())
        .collect()
}

fn default_parallel() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Options of the life-cycle observer registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeCycleObserverOptions {
    /// Order of observer groups for `start`. With `["datasource", "server"]`,
    /// observers in `datasource` are started before those in `server`.
    /// Observers are stopped in the reverse order.
    #[serde(default = "default_ordered_groups")]
    pub ordered_groups: Vec<String>,

    /// Notify observers of the same group concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for LifeCycleObserverOptions {
    fn default() -> Self {
        Self {
            ordered_groups: default_ordered_groups(),
            parallel: default_parallel(),
        }
    }
}

impl LifeCycleObserverOptions {
    /// Options with the given group order and parallel notification
    pub fn with_ordered_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ordered_groups: groups.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Switch between parallel and sequential notification
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for group in &self.ordered_groups {
            if group.is_empty() {
                return Err(ConfigError::Invalid(
                    "Ordered group names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(group.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Ordered group listed more than once: {}",
                    group
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit ANSI colors
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: false,
        }
    }
}

/// An observer declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Observer name, also used as its binding key suffix
    pub name: String,

    /// Explicit observer group
    #[serde(default)]
    pub group: Option<String>,

    /// Name-only tags attached to the binding
    #[serde(default)]
    pub tags: Vec<String>,

    /// Events the observer implements; all events when omitted
    #[serde(default = "ObserverConfig::all_events")]
    pub events: Vec<LifeCycleEvent>,

    /// Event on which the observer reports a failure
    #[serde(default)]
    pub fail_on: Option<LifeCycleEvent>,
}

impl ObserverConfig {
    fn all_events() -> Vec<LifeCycleEvent> {
        vec![LifeCycleEvent::Start, LifeCycleEvent::Stop]
    }

    /// Check whether the observer implements the event
    pub fn handles(&self, event: LifeCycleEvent) -> bool {
        self.events.contains(&event)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeelConfig {
    /// Observer registry options
    #[serde(default)]
    pub lifecycle: LifeCycleObserverOptions,

    /// Logging options
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared observers
    #[serde(default)]
    pub observers: Vec<ObserverConfig>,
}

impl KeelConfig {
    /// Load configuration from a file, or defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => {
                info!("No configuration file specified, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lifecycle.validate()?;

        let mut names = HashSet::new();
        for observer in &self.observers {
            if observer.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "Observer name cannot be empty".to_string(),
                ));
            }
            if !names.insert(observer.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Observer declared more than once: {}",
                    observer.name
                )));
            }
            if let Some(event) = observer.fail_on {
                if !observer.handles(event) {
                    warn!(
                        "Observer {} fails on {} but does not handle it",
                        observer.name, event
                    );
                }
            }
        }

        Ok(())
    }
}
