//! Application facade
//!
//! Owns a context, binds the life-cycle observer registry into it and tracks
//! whether the observers have been started.

use std::sync::Arc;

use keel_context::{
    create_binding_from_class, Binding, BindingFromClassOptions, BindingScope, Component, Context,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::LifeCycleObserverOptions;
use crate::error::Result;
use crate::keys::CoreBindings;
use crate::lifecycle::{as_life_cycle_observer, SharedObserver};
use crate::lifecycle_registry::LifeCycleObserverRegistry;

/// Namespace of observer bindings registered through [`Application`]
pub const LIFE_CYCLE_OBSERVER_NAMESPACE: &str = "lifeCycleObservers";

/// State of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationState {
    /// Created, observers not started
    Created,

    /// Start pass in progress
    Starting,

    /// All observers started
    Started,

    /// Stop pass in progress
    Stopping,

    /// All observers stopped
    Stopped,
}

/// An application owning a context and its life-cycle observers
pub struct Application {
    /// Context holding every binding of the application
    context: Context,

    /// Registry driving the observers
    registry: Arc<LifeCycleObserverRegistry>,

    /// Current state, held across a whole start or stop pass
    state: Mutex<ApplicationState>,
}

impl Application {
    /// Create an application with a fresh context
    pub fn new(options: LifeCycleObserverOptions) -> Result<Self> {
        Self::with_context(Context::new("application"), options)
    }

    /// Create an application over an existing context
    pub fn with_context(context: Context, options: LifeCycleObserverOptions) -> Result<Self> {
        options.validate()?;

        context
            .bind(CoreBindings::LIFE_CYCLE_OBSERVER_OPTIONS)?
            .to_value(options);
        let registry = Arc::new(LifeCycleObserverRegistry::from_context(&context)?);
        context
            .bind(CoreBindings::LIFE_CYCLE_OBSERVER_REGISTRY)?
            .to_value(registry.clone());

        Ok(Self {
            context,
            registry,
            state: Mutex::new(ApplicationState::Created),
        })
    }

    /// Get the context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Get the observer registry
    pub fn registry(&self) -> &Arc<LifeCycleObserverRegistry> {
        &self.registry
    }

    /// Get the current state
    pub async fn state(&self) -> ApplicationState {
        *self.state.lock().await
    }

    /// Register a component class as a life-cycle observer.
    ///
    /// The binding is a singleton so `start` and `stop` reach the same
    /// instance.
    pub fn life_cycle_observer<C>(&self, group: Option<&str>) -> Result<Arc<Binding>>
    where
        C: Component<Value = SharedObserver>,
    {
        let options = BindingFromClassOptions {
            scope: Some(BindingScope::Singleton),
            ..BindingFromClassOptions::in_namespace(LIFE_CYCLE_OBSERVER_NAMESPACE)
        };
        let binding = create_binding_from_class::<C>(&options);
        binding.apply(as_life_cycle_observer(group));
        debug!("Registering life-cycle observer {}", binding.key());
        Ok(self.context.add(binding)?)
    }

    /// Register an observer instance under the given key
    pub fn life_cycle_observer_value(
        &self,
        key: &str,
        group: Option<&str>,
        observer: SharedObserver,
    ) -> Result<Arc<Binding>> {
        let binding = Binding::new(key);
        binding
            .to_value(observer)
            .apply(as_life_cycle_observer(group));
        debug!("Registering life-cycle observer {}", key);
        Ok(self.context.add(binding)?)
    }

    /// Start all observers. Does nothing when already started.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == ApplicationState::Started {
            debug!("Application already started");
            return Ok(());
        }

        *state = ApplicationState::Starting;
        match self.registry.start().await {
            Ok(()) => {
                *state = ApplicationState::Started;
                info!("Application started");
                Ok(())
            }
            Err(err) => {
                *state = ApplicationState::Created;
                error!("Application failed to start: {}", err);
                Err(err)
            }
        }
    }

    /// Stop all observers. Does nothing unless started.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != ApplicationState::Started {
            debug!("Application not started, nothing to stop");
            return Ok(());
        }

        *state = ApplicationState::Stopping;
        match self.registry.stop().await {
            Ok(()) => {
                *state = ApplicationState::Stopped;
                info!("Application stopped");
                Ok(())
            }
            Err(err) => {
                *state = ApplicationState::Started;
                error!("Application failed to stop: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use keel_context::ResolutionSession;

    use crate::lifecycle::{LifeCycleObserver, ObserverFuture};

    struct Noop;

    impl LifeCycleObserver for Noop {
        fn start(&self) -> Option<ObserverFuture<'_>> {
            Some(async { Ok(()) }.boxed())
        }
    }

    impl Component for Noop {
        type Value = SharedObserver;

        fn construct(_session: &mut ResolutionSession) -> anyhow::Result<Self::Value> {
            Ok(Arc::new(Noop))
        }
    }

    #[test]
    fn test_registry_bound_in_context() {
        let app = Application::new(LifeCycleObserverOptions::default()).unwrap();
        let registry = app
            .context()
            .get::<Arc<LifeCycleObserverRegistry>>(CoreBindings::LIFE_CYCLE_OBSERVER_REGISTRY)
            .unwrap();
        assert!(Arc::ptr_eq(&registry, app.registry()));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = LifeCycleObserverOptions::with_ordered_groups([""]);
        assert!(Application::new(options).is_err());
    }

    #[test]
    fn test_observer_class_binding() {
        let app = Application::new(LifeCycleObserverOptions::default()).unwrap();
        let binding = app.life_cycle_observer::<Noop>(Some("cache")).unwrap();

        assert_eq!(binding.key(), "lifeCycleObservers.Noop");
        assert_eq!(binding.scope(), BindingScope::Singleton);
        assert_eq!(app.registry().observer_group(&binding), "cache");
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let app = Application::new(LifeCycleObserverOptions::default()).unwrap();
        app.life_cycle_observer::<Noop>(None).unwrap();
        assert_eq!(app.state().await, ApplicationState::Created);

        app.stop().await.unwrap();
        assert_eq!(app.state().await, ApplicationState::Created);

        app.start().await.unwrap();
        app.start().await.unwrap();
        assert_eq!(app.state().await, ApplicationState::Started);

        app.stop().await.unwrap();
        assert_eq!(app.state().await, ApplicationState::Stopped);
    }
}
