//! Life-cycle observers
//!
//! A life-cycle observer is any registered component that wants to take part
//! in application startup and shutdown. Both operations are optional: an
//! observer returns `None` for an event it does not handle and is skipped.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use keel_context::{filter_by_tag, Binding, BindingFilter, BindingTemplate};
use serde::{Deserialize, Serialize};

use crate::keys::CoreTags;

/// Future returned by an observer operation.
pub type ObserverFuture<'a> = BoxFuture<'a, anyhow::Result<()>>;

/// Shared handle to an observer, the value type of observer bindings.
pub type SharedObserver = Arc<dyn LifeCycleObserver>;

/// Events delivered to life-cycle observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeCycleEvent {
    /// Application startup
    Start,

    /// Application shutdown
    Stop,
}

impl LifeCycleEvent {
    /// Name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// Ask the observer for its operation for this event
    pub fn notify<'a>(&self, observer: &'a dyn LifeCycleObserver) -> Option<ObserverFuture<'a>> {
        match self {
            Self::Start => observer.start(),
            Self::Stop => observer.stop(),
        }
    }
}

impl fmt::Display for LifeCycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component taking part in startup and shutdown.
///
/// Implement only the operations you need. The default implementations
/// return `None`, which the registry treats as "not implemented" rather than
/// as a successful no-op.
///
/// ```
/// use futures::FutureExt;
/// use keel_core::lifecycle::{LifeCycleObserver, ObserverFuture};
///
/// struct Cache;
///
/// impl LifeCycleObserver for Cache {
///     fn start(&self) -> Option<ObserverFuture<'_>> {
///         Some(async { Ok(()) }.boxed())
///     }
/// }
/// ```
pub trait LifeCycleObserver: Send + Sync {
    /// Operation run on startup
    fn start(&self) -> Option<ObserverFuture<'_>> {
        None
    }

    /// Operation run on shutdown
    fn stop(&self) -> Option<ObserverFuture<'_>> {
        None
    }
}

/// Template marking a binding as a life-cycle observer, optionally in a group
pub fn as_life_cycle_observer(group: Option<&str>) -> BindingTemplate {
    let group = group.filter(|g| !g.is_empty()).map(str::to_string);
    Box::new(move |binding: &Binding| {
        binding.tag(CoreTags::LIFE_CYCLE_OBSERVER);
        if let Some(group) = &group {
            binding.tag_value(CoreTags::LIFE_CYCLE_OBSERVER_GROUP, group.as_str());
        }
    })
}

/// Filter matching life-cycle observer bindings
pub fn life_cycle_observer_filter() -> BindingFilter {
    filter_by_tag(CoreTags::LIFE_CYCLE_OBSERVER)
}

/// Check whether a binding is marked as a life-cycle observer
pub fn is_life_cycle_observer(binding: &Binding) -> bool {
    binding.has_tag(CoreTags::LIFE_CYCLE_OBSERVER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    struct StartOnly;

    impl LifeCycleObserver for StartOnly {
        fn start(&self) -> Option<ObserverFuture<'_>> {
            Some(async { Ok(()) }.boxed())
        }
    }

    #[test]
    fn test_default_operations_are_absent() {
        let observer = StartOnly;
        assert!(LifeCycleEvent::Start.notify(&observer).is_some());
        assert!(LifeCycleEvent::Stop.notify(&observer).is_none());
    }

    #[test]
    fn test_template_tags_group() {
        let binding = Binding::new("db");
        binding.apply(as_life_cycle_observer(Some("datasource")));

        assert!(is_life_cycle_observer(&binding));
        assert!(life_cycle_observer_filter().matches(&binding));
        assert_eq!(
            binding
                .tag_value_of(CoreTags::LIFE_CYCLE_OBSERVER_GROUP)
                .as_deref(),
            Some("datasource")
        );
    }

    #[test]
    fn test_template_without_group() {
        let binding = Binding::new("cache");
        binding.apply(as_life_cycle_observer(None));

        assert!(is_life_cycle_observer(&binding));
        assert!(!binding.has_tag(CoreTags::LIFE_CYCLE_OBSERVER_GROUP));
    }

    #[test]
    fn test_event_serde_names() {
        assert_eq!(LifeCycleEvent::Start.to_string(), "start");
        #[derive(Deserialize)]
        struct Wrapper {
            event: LifeCycleEvent,
        }

        let parsed: Wrapper = toml::from_str("event = \"stop\"").unwrap();
        assert_eq!(parsed.event, LifeCycleEvent::Stop);
    }
}
