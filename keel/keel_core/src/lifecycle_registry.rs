//! Life-Cycle Observer Registry
//!
//! Collects the life-cycle observers registered in a context, partitions them
//! into groups and drives `start`/`stop` notifications group by group.
//!
//! Groups are ordered by the configured `ordered_groups` first, then
//! alphabetically. `stop` walks the groups in exactly the reverse order of
//! `start`, and also reverses the observers within each group. Each group
//! finishes its notification pass before the next group begins.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use indexmap::IndexMap;
use keel_context::{Binding, Context, ContextView, ResolutionSession};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace};

use crate::config::LifeCycleObserverOptions;
use crate::error::{LifeCycleError, Result};
use crate::keys::{CoreBindings, CoreTags};
use crate::lifecycle::{
    life_cycle_observer_filter, LifeCycleEvent, LifeCycleObserver, ObserverFuture, SharedObserver,
};

/// A group of life-cycle observers
#[derive(Debug, Clone)]
pub struct LifeCycleObserverGroup {
    /// Group name, empty for the default group
    pub group: String,

    /// Observer bindings in the group, in registration order
    pub bindings: Vec<Arc<Binding>>,
}

impl LifeCycleObserverGroup {
    /// Keys of the observer bindings in the group
    pub fn keys(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|binding| binding.key().to_string())
            .collect()
    }
}

/// Observers of one group resolved for a notification pass
struct ResolvedGroup {
    group: String,
    observers: Vec<(Arc<Binding>, SharedObserver)>,
}

/// Context-based registry for life-cycle observers
pub struct LifeCycleObserverRegistry {
    /// Live view over observer bindings
    observers_view: ContextView,

    /// Group order and notification mode
    options: RwLock<LifeCycleObserverOptions>,
}

impl LifeCycleObserverRegistry {
    /// Create a registry over the observers registered in the context
    pub fn new(context: &Context, options: LifeCycleObserverOptions) -> Self {
        Self {
            observers_view: context.create_view(life_cycle_observer_filter()),
            options: RwLock::new(options),
        }
    }

    /// Create a registry using the options bound in the context, if any
    pub fn from_context(context: &Context) -> Result<Self> {
        let options = context
            .get_optional::<LifeCycleObserverOptions>(CoreBindings::LIFE_CYCLE_OBSERVER_OPTIONS)?
            .unwrap_or_default();
        Ok(Self::new(context, options))
    }

    /// Replace the configured group order
    pub fn set_ordered_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.write().ordered_groups = groups.into_iter().map(Into::into).collect();
    }

    /// Current options
    pub fn options(&self) -> LifeCycleObserverOptions {
        self.options.read().clone()
    }

    /// Get observer groups ordered for `start`
    pub fn get_observer_groups_by_order(&self) -> Vec<LifeCycleObserverGroup> {
        let bindings = self.observers_view.bindings();
        let groups = self.sort_observer_bindings_by_group(bindings);
        debug!(
            "Observer groups: {:?}",
            groups
                .iter()
                .map(|g| (g.group.as_str(), g.keys()))
                .collect::<Vec<_>>()
        );
        groups
    }

    /// Get the group of an observer binding.
    ///
    /// An explicit group tag wins. Otherwise the first configured group the
    /// binding is tagged with (as `group = group`) is used, falling back to the
    /// default group `""`.
    pub fn observer_group(&self, binding: &Binding) -> String {
        let group = binding
            .tag_value_of(CoreTags::LIFE_CYCLE_OBSERVER_GROUP)
            .filter(|group| !group.is_empty())
            .or_else(|| {
                self.options
                    .read()
                    .ordered_groups
                    .iter()
                    .find(|g| binding.tag_value_of(g).as_deref() == Some(g.as_str()))
                    .cloned()
            })
            .unwrap_or_default();
        trace!(
            "Binding {} is configured with observer group {:?}",
            binding.key(),
            group
        );
        group
    }

    /// Partition observer bindings into groups and sort the groups
    pub fn sort_observer_bindings_by_group(
        &self,
        bindings: Vec<Arc<Binding>>,
    ) -> Vec<LifeCycleObserverGroup> {
        let mut group_map: IndexMap<String, Vec<Arc<Binding>>> = IndexMap::new();
        for binding in bindings {
            let group = self.observer_group(&binding);
            group_map.entry(group).or_default().push(binding);
        }

        let mut groups: Vec<LifeCycleObserverGroup> = group_map
            .into_iter()
            .map(|(group, bindings)| LifeCycleObserverGroup { group, bindings })
            .collect();

        let ordered_groups = self.options.read().ordered_groups.clone();
        groups.sort_by(|g1, g2| compare_groups(&ordered_groups, &g1.group, &g2.group));
        groups
    }

    /// Notify a list of observers of an event.
    ///
    /// In parallel mode every observer is invoked concurrently and the call
    /// waits for all of them; the first failure in list order is returned. In
    /// sequential mode observers run one after another and the first failure
    /// stops the pass.
    pub async fn notify_observers(
        &self,
        observers: &[(Arc<Binding>, SharedObserver)],
        event: LifeCycleEvent,
    ) -> Result<()> {
        let parallel = self.options.read().parallel;

        if !parallel {
            for (binding, observer) in observers {
                debug!("Invoking {} observer for binding {}", event, binding.key());
                Self::invoke_observer(binding, observer.as_ref(), event).await?;
            }
            return Ok(());
        }

        let notifiers = observers.iter().map(|(binding, observer)| {
            debug!("Invoking {} observer for binding {}", event, binding.key());
            Self::invoke_observer(binding, observer.as_ref(), event)
        });
        let results = join_all(notifiers).await;

        let mut first_failure = None;
        for result in results {
            if let Err(err) = result {
                if first_failure.is_none() {
                    first_failure = Some(err);
                } else {
                    error!("Additional observer failure during {}: {}", event, err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Invoke one observer for the event, skipping it when it does not
    /// implement the operation
    pub async fn invoke_observer(
        binding: &Binding,
        observer: &dyn LifeCycleObserver,
        event: LifeCycleEvent,
    ) -> Result<()> {
        let Some(operation) = event.notify(observer) else {
            trace!("Binding {} does not observe {}", binding.key(), event);
            return Ok(());
        };

        operation.await.map_err(|err| {
            LifeCycleError::ObserverFailed {
                key: binding.key().to_string(),
                event,
                source: err.into(),
            }
            .into()
        })
    }

    /// Emit events to the observer groups.
    ///
    /// All observers are resolved before the first notification. With
    /// `reverse`, both the group order and the order within each group are
    /// reversed.
    pub async fn notify_groups(
        &self,
        events: &[LifeCycleEvent],
        groups: Vec<LifeCycleObserverGroup>,
        reverse: bool,
    ) -> Result<()> {
        let mut resolved = self.resolve_groups(groups)?;
        if reverse {
            resolved.reverse();
            for group in &mut resolved {
                group.observers.reverse();
            }
        }

        for group in &resolved {
            for &event in events {
                debug!(
                    "Beginning notification {} of group {:?}",
                    event, group.group
                );
                self.notify_observers(&group.observers, event).await?;
                debug!(
                    "Finished notification {} of group {:?}",
                    event, group.group
                );
            }
        }

        Ok(())
    }

    fn resolve_groups(&self, groups: Vec<LifeCycleObserverGroup>) -> Result<Vec<ResolvedGroup>> {
        let mut session = ResolutionSession::new(self.observers_view.context());
        let mut resolved = Vec::with_capacity(groups.len());
        for group in groups {
            let mut observers = Vec::with_capacity(group.bindings.len());
            for binding in group.bindings {
                let observer = binding.get_value::<SharedObserver>(&mut session)?;
                observers.push((binding, observer));
            }
            resolved.push(ResolvedGroup {
                group: group.group,
                observers,
            });
        }
        Ok(resolved)
    }

    /// Notify all life-cycle observers of `start`, group by group
    pub async fn start(&self) -> Result<()> {
        info!("Starting life-cycle observers");
        let groups = self.get_observer_groups_by_order();
        self.notify_groups(&[LifeCycleEvent::Start], groups, false).await?;
        info!("Life-cycle observers started");
        Ok(())
    }

    /// Notify all life-cycle observers of `stop`, in reverse order
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping life-cycle observers");
        let groups = self.get_observer_groups_by_order();
        self.notify_groups(&[LifeCycleEvent::Stop], groups, true).await?;
        info!("Life-cycle observers stopped");
        Ok(())
    }
}

impl LifeCycleObserver for LifeCycleObserverRegistry {
    fn start(&self) -> Option<ObserverFuture<'_>> {
        Some(
            async move {
                LifeCycleObserverRegistry::start(self).await?;
                Ok(())
            }
            .boxed(),
        )
    }

    fn stop(&self) -> Option<ObserverFuture<'_>> {
        Some(
            async move {
                LifeCycleObserverRegistry::stop(self).await?;
                Ok(())
            }
            .boxed(),
        )
    }
}

/// Position of a group in the configured order, with unconfigured groups
/// ranked after every configured one
fn group_rank(ordered_groups: &[String], group: &str) -> usize {
    ordered_groups
        .iter()
        .position(|g| g == group)
        .unwrap_or(usize::MAX)
}

/// Compare two groups: configured groups first in configured order, then
/// unconfigured groups alphabetically
fn compare_groups(ordered_groups: &[String], g1: &str, g2: &str) -> Ordering {
    let i1 = group_rank(ordered_groups, g1);
    let i2 = group_rank(ordered_groups, g2);
    // Equal ranks only happen when neither group is configured
    i1.cmp(&i2).then_with(|| g1.cmp(g2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(groups: &[&str]) -> Vec<String> {
        groups.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_configured_before_unconfigured() {
        let order = ordered(&["a", "b"]);
        assert_eq!(compare_groups(&order, "a", "b"), Ordering::Less);
        assert_eq!(compare_groups(&order, "b", "c"), Ordering::Less);
        assert_eq!(compare_groups(&order, "c", "a"), Ordering::Greater);
        assert_eq!(compare_groups(&order, "", "b"), Ordering::Greater);
    }

    #[test]
    fn test_unconfigured_alphabetical() {
        let order = ordered(&["server"]);
        assert_eq!(compare_groups(&order, "1-group", "2-group"), Ordering::Less);
        assert_eq!(compare_groups(&order, "", "cache"), Ordering::Less);
        assert_eq!(compare_groups(&order, "x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_observer_group_derivation() {
        let ctx = Context::new("test");
        let registry = LifeCycleObserverRegistry::new(
            &ctx,
            LifeCycleObserverOptions::with_ordered_groups(["datasource", "server"]),
        );

        let explicit = Binding::new("explicit");
        explicit
            .tag("server")
            .tag_value(CoreTags::LIFE_CYCLE_OBSERVER_GROUP, "cache");
        assert_eq!(registry.observer_group(&explicit), "cache");

        let tagged = Binding::new("tagged");
        tagged.tag("server").tag("datasource");
        assert_eq!(registry.observer_group(&tagged), "datasource");

        let mismatched = Binding::new("mismatched");
        mismatched.tag_value("server", "yes");
        assert_eq!(registry.observer_group(&mismatched), "");

        let plain = Binding::new("plain");
        assert_eq!(registry.observer_group(&plain), "");
    }

    #[test]
    fn test_groups_are_never_empty() {
        let ctx = Context::new("test");
        let registry = LifeCycleObserverRegistry::new(&ctx, LifeCycleObserverOptions::default());
        let bindings = vec![Arc::new(Binding::new("a")), Arc::new(Binding::new("b"))];
        bindings[1].tag("server");

        let groups = registry.sort_observer_bindings_by_group(bindings);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| !g.bindings.is_empty()));
        assert_eq!(groups[0].group, "server");
        assert_eq!(groups[1].group, "");
    }
}
