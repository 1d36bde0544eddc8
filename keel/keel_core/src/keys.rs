//! Well-known tag names and binding keys used by the core.

pub use keel_context::ContextTags;

/// Tags understood by the core
pub struct CoreTags;

impl CoreTags {
    /// Marks a binding as an extension of the named extension point
    pub const EXTENSION_POINT: &'static str = "extensionPoint";

    /// Alias of [`CoreTags::EXTENSION_POINT`] kept for readability at call sites
    pub const EXTENSION_FOR: &'static str = Self::EXTENSION_POINT;

    /// Marks a binding as a life-cycle observer
    pub const LIFE_CYCLE_OBSERVER: &'static str = "lifeCycleObserver";

    /// Explicit group of a life-cycle observer
    pub const LIFE_CYCLE_OBSERVER_GROUP: &'static str = "lifeCycleObserverGroup";
}

/// Binding keys owned by the core
pub struct CoreBindings;

impl CoreBindings {
    /// Key of the life-cycle observer registry
    pub const LIFE_CYCLE_OBSERVER_REGISTRY: &'static str = "lifeCycleObserver.registry";

    /// Key of the optional [`LifeCycleObserverOptions`](crate::config::LifeCycleObserverOptions)
    pub const LIFE_CYCLE_OBSERVER_OPTIONS: &'static str = "lifeCycleObserver.options";
}
