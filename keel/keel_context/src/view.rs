//! Views over the binding registry
//!
//! A [`ContextView`] is a handle over a live filter. Nothing is cached: each
//! read queries the context again, so the result always reflects the bindings
//! registered at the time of the call.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::Binding;
use crate::context::Context;
use crate::error::Result;
use crate::session::ResolutionSession;

/// Shareable predicate over bindings
#[derive(Clone)]
pub struct BindingFilter(Arc<dyn Fn(&Binding) -> bool + Send + Sync>);

impl BindingFilter {
    /// Wrap a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Binding) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Test a binding against the filter
    pub fn matches(&self, binding: &Binding) -> bool {
        (self.0)(binding)
    }
}

impl fmt::Debug for BindingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BindingFilter")
    }
}

/// Match bindings carrying the tag, whatever its value
pub fn filter_by_tag(name: impl Into<String>) -> BindingFilter {
    let name = name.into();
    BindingFilter::new(move |binding| binding.has_tag(&name))
}

/// Match bindings whose tag has exactly the given value
pub fn filter_by_tag_value(name: impl Into<String>, value: impl Into<String>) -> BindingFilter {
    let name = name.into();
    let value = value.into();
    BindingFilter::new(move |binding| {
        binding.tag_value_of(&name).as_deref() == Some(value.as_str())
    })
}

/// Match the binding with the given key
pub fn filter_by_key(key: impl Into<String>) -> BindingFilter {
    let key = key.into();
    BindingFilter::new(move |binding| binding.key() == key)
}

/// Live, re-evaluated view over the bindings matching a filter
#[derive(Clone, Debug)]
pub struct ContextView {
    context: Context,
    filter: BindingFilter,
}

impl ContextView {
    /// Create a view over the context
    pub fn new(context: Context, filter: BindingFilter) -> Self {
        Self { context, filter }
    }

    /// The context being viewed
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Currently matching bindings, in registration order
    pub fn bindings(&self) -> Vec<Arc<Binding>> {
        self.context.find(&self.filter)
    }

    /// Matching bindings paired with their resolved values, from one snapshot
    pub fn resolve<T>(&self) -> Result<Vec<(Arc<Binding>, T)>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut session = ResolutionSession::new(&self.context);
        self.bindings()
            .into_iter()
            .map(|binding| -> Result<(Arc<Binding>, T)> {
                let value = binding.get_value::<T>(&mut session)?;
                Ok((binding, value))
            })
            .collect()
    }

    /// Resolved values of the matching bindings
    pub fn values<T>(&self) -> Result<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self
            .resolve::<T>()?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    /// Typed getter backed by this view
    pub fn getter<T>(&self) -> Getter<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        Getter {
            view: self.clone(),
            _marker: PhantomData,
        }
    }
}

/// Typed handle that re-reads a view on every call
pub struct Getter<T> {
    view: ContextView,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Getter<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Resolve the values currently matched by the view
    pub fn get(&self) -> Result<Vec<T>> {
        self.view.values()
    }

    /// Bindings currently matched by the view
    pub fn bindings(&self) -> Vec<Arc<Binding>> {
        self.view.bindings()
    }

    /// The underlying view
    pub fn view(&self) -> &ContextView {
        &self.view
    }
}

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Getter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Getter").field("view", &self.view).finish()
    }
}
