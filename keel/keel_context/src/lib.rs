//! # Keel Context
//!
//! `keel_context` is the component registry that the Keel runtime orchestrates.
//! Components are registered as [`Binding`]s: uniquely keyed entries carrying a
//! map of string tags and a source that produces the component value.
//!
//! The registry is queried, never walked by reflection. Consumers describe what
//! they are interested in with a [`BindingFilter`] and receive either a
//! snapshot of matching bindings or a live [`ContextView`] that re-evaluates the
//! filter every time it is read.
//!
//! ## Crate Structure
//!
//! - **binding**: Bindings, scopes, templates and the [`Component`] trait
//! - **context**: The insertion-ordered binding registry
//! - **session**: Per-resolution state (binding stack, cycle detection)
//! - **view**: Filters, live views and typed getters
//! - **keys**: Well-known tag names
//! - **error**: Error types for registry operations

pub mod binding;
pub mod context;
pub mod error;
pub mod keys;
pub mod session;
pub mod view;

// Re-export key types for convenience
pub use binding::{
    create_binding_from_class, short_type_name, Binding, BindingFromClassOptions, BindingScope,
    BindingTemplate, BoxedValue, Component,
};
pub use context::Context;
pub use error::{ContextError, Result};
pub use keys::ContextTags;
pub use session::ResolutionSession;
pub use view::{
    filter_by_key, filter_by_tag, filter_by_tag_value, BindingFilter, ContextView, Getter,
};
