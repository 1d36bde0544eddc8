//! Bindings
//!
//! A binding is a single registration in a [`Context`](crate::Context). It owns
//! a unique key, a mutable map of string tags and the source that produces the
//! bound value. Tags can be changed after registration, which is how templates
//! such as "mark this component as an extension" are applied.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::{ContextError, Result};
use crate::keys::ContextTags;
use crate::session::ResolutionSession;

/// Type-erased value produced by a binding.
pub type BoxedValue = Arc<dyn Any + Send + Sync>;

/// A reusable configuration step applied to a binding with [`Binding::apply`].
pub type BindingTemplate = Box<dyn Fn(&Binding) + Send + Sync>;

type Factory = Arc<dyn Fn(&mut ResolutionSession) -> anyhow::Result<BoxedValue> + Send + Sync>;

#[derive(Clone)]
enum BindingSource {
    Value(BoxedValue),
    Factory(Factory),
}

/// Lifetime of the values produced by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingScope {
    /// A new value is produced on every resolution
    #[default]
    Transient,

    /// The first value produced is cached for the lifetime of the binding
    Singleton,
}

/// A class-like component that can be constructed inside a resolution session.
///
/// The session exposes the binding being constructed, which lets constructors
/// look up dependencies relative to their own registration.
pub trait Component: Send + Sync + 'static {
    /// Value stored in the registry, usually `Arc<Self>` or `Arc<dyn Trait>`
    type Value: Clone + Send + Sync + 'static;

    /// Construct the component value
    fn construct(session: &mut ResolutionSession) -> anyhow::Result<Self::Value>;
}

/// A registration in the context
pub struct Binding {
    key: String,
    tags: RwLock<BTreeMap<String, String>>,
    component_name: RwLock<Option<String>>,
    scope: RwLock<BindingScope>,
    source: RwLock<Option<BindingSource>>,
    cache: Mutex<Option<BoxedValue>>,
}

impl Binding {
    /// Create an unbound binding for the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tags: RwLock::new(BTreeMap::new()),
            component_name: RwLock::new(None),
            scope: RwLock::new(BindingScope::default()),
            source: RwLock::new(None),
            cache: Mutex::new(None),
        }
    }

    /// Get the binding key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add a name-only tag, stored as `name = name`
    pub fn tag(&self, name: impl Into<String>) -> &Self {
        let name = name.into();
        self.tags.write().insert(name.clone(), name);
        self
    }

    /// Add a tag with an explicit value, replacing only that tag
    pub fn tag_value(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.tags.write().insert(name.into(), value.into());
        self
    }

    /// Add several tags at once
    pub fn tags<I, K, V>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = self.tags.write();
        for (name, value) in tags {
            map.insert(name.into(), value.into());
        }
        drop(map);
        self
    }

    /// Snapshot of the tag map
    pub fn tag_map(&self) -> BTreeMap<String, String> {
        self.tags.read().clone()
    }

    /// Value of a single tag
    pub fn tag_value_of(&self, name: &str) -> Option<String> {
        self.tags.read().get(name).cloned()
    }

    /// Check whether a tag is present, whatever its value
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.read().contains_key(name)
    }

    /// Apply a template function to this binding
    pub fn apply<F>(&self, template: F) -> &Self
    where
        F: FnOnce(&Binding),
    {
        template(self);
        self
    }

    /// Set the scope of the binding
    pub fn in_scope(&self, scope: BindingScope) -> &Self {
        *self.scope.write() = scope;
        self.cache.lock().take();
        self
    }

    /// Get the scope of the binding
    pub fn scope(&self) -> BindingScope {
        *self.scope.read()
    }

    /// Bind a constant value
    pub fn to_value<T>(&self, value: T) -> &Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.set_source(BindingSource::Value(Arc::new(value)));
        self
    }

    /// Bind a factory invoked on resolution
    pub fn to_factory<T, F>(&self, factory: F) -> &Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&mut ResolutionSession) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |session: &mut ResolutionSession| {
            factory(session).map(|value| Arc::new(value) as BoxedValue)
        });
        self.set_source(BindingSource::Factory(factory));
        self
    }

    /// Bind a component class, recording its short type name
    pub fn to_class<C: Component>(&self) -> &Self {
        *self.component_name.write() = Some(short_type_name::<C>());
        self.to_factory(C::construct)
    }

    /// Name of the class this binding constructs, if any
    pub fn component_name(&self) -> Option<String> {
        self.component_name.read().clone()
    }

    /// Check whether a value source has been set
    pub fn is_bound(&self) -> bool {
        self.source.read().is_some()
    }

    fn set_source(&self, source: BindingSource) {
        *self.source.write() = Some(source);
        self.cache.lock().take();
    }

    /// Resolve the type-erased value within a session
    pub fn resolve(self: &Arc<Self>, session: &mut ResolutionSession) -> Result<BoxedValue> {
        let singleton = self.scope() == BindingScope::Singleton;
        if singleton {
            if let Some(value) = self.cache.lock().as_ref() {
                return Ok(value.clone());
            }
        }

        let source = self
            .source
            .read()
            .clone()
            .ok_or_else(|| ContextError::ValueNotBound(self.key.clone()))?;

        let value = match source {
            BindingSource::Value(value) => value,
            BindingSource::Factory(factory) => {
                session.enter(self)?;
                trace!("Constructing value for binding {}", self.key);
                let created = factory(session);
                session.exit();
                created.map_err(|err| ContextError::Resolution {
                    key: self.key.clone(),
                    source: err.into(),
                })?
            }
        };

        if singleton {
            let mut cache = self.cache.lock();
            return Ok(cache.get_or_insert(value).clone());
        }
        Ok(value)
    }

    /// Resolve the value and downcast it to `T`
    pub fn get_value<T>(self: &Arc<Self>, session: &mut ResolutionSession) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.resolve(session)?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ContextError::TypeMismatch {
                key: self.key.clone(),
                expected: type_name::<T>(),
            })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("tags", &*self.tags.read())
            .field("scope", &self.scope())
            .field("component_name", &*self.component_name.read())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Short name of a type: the last path segment with generic arguments removed.
///
/// `my_app::greeting::GreetingService` becomes `GreetingService`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Options for [`create_binding_from_class`]
#[derive(Debug, Clone, Default)]
pub struct BindingFromClassOptions {
    /// Explicit binding key
    pub key: Option<String>,

    /// Namespace used to derive the key, defaults to `classes`
    pub namespace: Option<String>,

    /// Name used to derive the key and tagged as `name`
    pub name: Option<String>,

    /// Scope of the binding
    pub scope: Option<BindingScope>,
}

impl BindingFromClassOptions {
    /// Options deriving the key from the given namespace
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }
}

/// Create a binding for a component class.
///
/// The key is `options.key` when given, otherwise `<namespace>.<name>` where the
/// name defaults to the short type name of `C`.
pub fn create_binding_from_class<C: Component>(options: &BindingFromClassOptions) -> Binding {
    let name = options.name.clone().unwrap_or_else(short_type_name::<C>);
    let namespace = options.namespace.as_deref().unwrap_or("classes");
    let key = options
        .key
        .clone()
        .unwrap_or_else(|| format!("{namespace}.{name}"));

    let binding = Binding::new(key);
    binding.to_class::<C>();
    if let Some(explicit) = &options.name {
        binding.tag_value(ContextTags::NAME, explicit.as_str());
    }
    if let Some(namespace) = &options.namespace {
        binding.tag_value(ContextTags::NAMESPACE, namespace.as_str());
    }
    if let Some(scope) = options.scope {
        binding.in_scope(scope);
    }
    binding
}
