//! Error types for the Keel core.
//!
//! The root [`Error`] wraps the registry errors from `keel_context` together
//! with the life-cycle and configuration errors raised here, so callers of
//! `start`/`stop` can handle every failure through one type.

use std::path::PathBuf;

use keel_context::ContextError;
use thiserror::Error;

use crate::lifecycle::LifeCycleEvent;

/// Root error type for the core.
#[derive(Debug, Error)]
pub enum Error {
    /// Registry errors
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Life-cycle notification errors
    #[error("Life-cycle error: {0}")]
    LifeCycle(#[from] LifeCycleError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while notifying life-cycle observers.
#[derive(Debug, Error)]
pub enum LifeCycleError {
    /// An observer returned an error for the event
    #[error("Observer {key} failed to {event}: {source}")]
    ObserverFailed {
        /// Key of the observer binding
        key: String,

        /// Event being delivered
        event: LifeCycleEvent,

        /// Error returned by the observer
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl LifeCycleError {
    /// Key of the binding whose observer failed
    pub fn key(&self) -> &str {
        match self {
            Self::ObserverFailed { key, .. } => key,
        }
    }
}

/// Errors related to configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        /// Path of the file
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the schema
    #[error("Failed to parse configuration file {path:?}: {source}")]
    Parse {
        /// Path of the file
        path: PathBuf,

        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// The configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
