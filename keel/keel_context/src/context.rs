//! Binding Context
//!
//! The context is the shared registry every component registers into. It keeps
//! bindings in insertion order and hands out filtered snapshots and live views.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::binding::Binding;
use crate::error::{ContextError, Result};
use crate::session::ResolutionSession;
use crate::view::{filter_by_tag_value, BindingFilter, ContextView};

struct ContextInner {
    name: String,
    registry: RwLock<IndexMap<String, Arc<Binding>>>,
}

/// Shared, cheaply cloneable handle to a binding registry
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create an empty context
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                registry: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Name of the context, used in diagnostics
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Add a binding, replacing any binding with the same key in place
    pub fn add(&self, binding: Binding) -> Result<Arc<Binding>> {
        if binding.key().is_empty() {
            return Err(ContextError::InvalidKey);
        }

        let key = binding.key().to_string();
        let binding = Arc::new(binding);
        let replaced = self
            .inner
            .registry
            .write()
            .insert(key.clone(), binding.clone());

        if replaced.is_some() {
            debug!("Replaced binding {} in context {}", key, self.inner.name);
        } else {
            debug!("Added binding {} to context {}", key, self.inner.name);
        }

        Ok(binding)
    }

    /// Create and add an unbound binding for the key
    pub fn bind(&self, key: impl Into<String>) -> Result<Arc<Binding>> {
        self.add(Binding::new(key))
    }

    /// Remove a binding, returning whether it existed
    pub fn unbind(&self, key: &str) -> bool {
        let removed = self.inner.registry.write().shift_remove(key).is_some();
        if removed {
            debug!("Removed binding {} from context {}", key, self.inner.name);
        }
        removed
    }

    /// Check whether a binding exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.inner.registry.read().contains_key(key)
    }

    /// Number of registered bindings
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    /// Check whether the context has no bindings
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().is_empty()
    }

    /// Look up a binding by key
    pub fn get_binding(&self, key: &str) -> Result<Arc<Binding>> {
        self.inner
            .registry
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ContextError::NotFound(key.to_string()))
    }

    /// All bindings matching the filter, in registration order
    pub fn find(&self, filter: &BindingFilter) -> Vec<Arc<Binding>> {
        // Release the registry lock before running filters that lock bindings
        let snapshot: Vec<Arc<Binding>> = self.inner.registry.read().values().cloned().collect();
        snapshot
            .into_iter()
            .filter(|binding| filter.matches(binding))
            .collect()
    }

    /// All bindings carrying the tag with exactly the given value
    pub fn find_by_tag(&self, name: &str, value: &str) -> Vec<Arc<Binding>> {
        self.find(&filter_by_tag_value(name, value))
    }

    /// Resolve the value bound to the key
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut session = ResolutionSession::new(self);
        session.get(key)
    }

    /// Resolve the value bound to the key, or `None` when nothing is registered
    pub fn get_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ContextError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create a live view over bindings matching the filter
    pub fn create_view(&self, filter: BindingFilter) -> ContextView {
        ContextView::new(self.clone(), filter)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("bindings", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::filter_by_tag;

    #[test]
    fn test_add_and_get() {
        let ctx = Context::new("app");
        ctx.bind("greeting").unwrap().to_value("hello".to_string());

        assert!(ctx.contains("greeting"));
        assert_eq!(ctx.get::<String>("greeting").unwrap(), "hello");
    }

    #[test]
    fn test_empty_key_rejected() {
        let ctx = Context::new("app");
        assert!(matches!(ctx.bind(""), Err(ContextError::InvalidKey)));
    }

    #[test]
    fn test_replace_keeps_position() {
        let ctx = Context::new("app");
        for key in ["a", "b", "c"] {
            ctx.bind(key).unwrap().tag("item");
        }
        ctx.bind("a").unwrap().tag("item");

        let keys: Vec<String> = ctx
            .find(&filter_by_tag("item"))
            .iter()
            .map(|binding| binding.key().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unbind() {
        let ctx = Context::new("app");
        ctx.bind("a").unwrap();
        assert!(ctx.unbind("a"));
        assert!(!ctx.unbind("a"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_get_optional() {
        let ctx = Context::new("app");
        assert_eq!(ctx.get_optional::<u32>("missing").unwrap(), None);

        ctx.bind("present").unwrap().to_value(7u32);
        assert_eq!(ctx.get_optional::<u32>("present").unwrap(), Some(7));
    }

    #[test]
    fn test_find_by_tag() {
        let ctx = Context::new("app");
        ctx.bind("en").unwrap().tag_value("language", "en");
        ctx.bind("zh").unwrap().tag_value("language", "zh");

        let found = ctx.find_by_tag("language", "zh");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key(), "zh");
    }
}
