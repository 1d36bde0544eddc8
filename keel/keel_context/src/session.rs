//! Resolution Session
//!
//! A session follows one resolution request through nested factories. It
//! records which binding is currently being constructed so that constructors
//! can inspect their own registration, and it rejects circular dependencies.

use std::sync::Arc;

use crate::binding::Binding;
use crate::context::Context;
use crate::error::{ContextError, Result};

/// State for a single resolution request
pub struct ResolutionSession {
    context: Context,
    stack: Vec<Arc<Binding>>,
}

impl ResolutionSession {
    /// Create a session with no binding under construction
    pub fn new(context: &Context) -> Self {
        Self {
            context: context.clone(),
            stack: Vec::new(),
        }
    }

    /// The context this session resolves against
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Binding whose value is currently being constructed
    pub fn current_binding(&self) -> Option<&Arc<Binding>> {
        self.stack.last()
    }

    /// Class name of the component currently being constructed
    pub fn target_name(&self) -> Option<String> {
        self.current_binding()
            .and_then(|binding| binding.component_name())
    }

    /// Keys of the bindings being resolved, outermost first
    pub fn binding_path(&self) -> String {
        self.stack
            .iter()
            .map(|binding| binding.key())
            .collect::<Vec<_>>()
            .join(" --> ")
    }

    /// Resolve a dependency from within this session
    pub fn get<T>(&mut self, key: &str) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let binding = self.context.get_binding(key)?;
        binding.get_value(self)
    }

    pub(crate) fn enter(&mut self, binding: &Arc<Binding>) -> Result<()> {
        if self.stack.iter().any(|entry| entry.key() == binding.key()) {
            return Err(ContextError::CircularDependency(format!(
                "{} --> {}",
                self.binding_path(),
                binding.key()
            )));
        }
        self.stack.push(binding.clone());
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.stack.pop();
    }
}
