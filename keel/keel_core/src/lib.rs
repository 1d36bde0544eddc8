//! Keel Core - extension points and life-cycle orchestration
//!
//! This crate builds on the `keel_context` registry to provide:
//!
//! - **extension_point**: named slots that consumers read lazily and that
//!   other components contribute to by tag
//! - **lifecycle**: the observer contract for startup and shutdown
//! - **lifecycle_registry**: grouping, ordering and notification of observers
//! - **application**: a facade owning a context and its observers
//! - **config**, **logging**, **error**: the ambient pieces

pub mod application;
pub mod config;
pub mod error;
pub mod extension_point;
pub mod keys;
pub mod lifecycle;
pub mod lifecycle_registry;
pub mod logging;

pub use application::{Application, ApplicationState};
pub use config::{KeelConfig, LifeCycleObserverOptions, LoggingConfig, ObserverConfig};
pub use error::{ConfigError, Error, LifeCycleError, Result};
pub use extension_point::{
    add_extension, add_extension_binding, extension_for, extension_point, extensions,
};
pub use keys::{ContextTags, CoreBindings, CoreTags};
pub use lifecycle::{
    as_life_cycle_observer, LifeCycleEvent, LifeCycleObserver, ObserverFuture, SharedObserver,
};
pub use lifecycle_registry::{LifeCycleObserverGroup, LifeCycleObserverRegistry};
pub use logging::init_logging;
