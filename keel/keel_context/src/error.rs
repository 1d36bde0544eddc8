//! Error types for registry operations.

use thiserror::Error;

/// Errors raised while registering or resolving bindings.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Binding keys must be non-empty
    #[error("Binding key must not be empty")]
    InvalidKey,

    /// No binding is registered under the key
    #[error("Binding not found: {0}")]
    NotFound(String),

    /// The binding exists but nothing produces its value yet
    #[error("No value is bound for key: {0}")]
    ValueNotBound(String),

    /// The bound value is not of the requested type
    #[error("Value of binding {key} is not of type {expected}")]
    TypeMismatch {
        /// Key of the binding being resolved
        key: String,

        /// Requested type name
        expected: &'static str,
    },

    /// A binding depends on itself, directly or transitively
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// A factory failed to produce the value
    #[error("Failed to resolve binding {key}: {source}")]
    Resolution {
        /// Key of the binding being resolved
        key: String,

        /// Error returned by the factory
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, ContextError>;
