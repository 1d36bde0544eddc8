//! Extension points
//!
//! An extension point is a named slot exposed by a consuming component. Other
//! components register themselves as extensions of that name, and the consumer
//! reads them through a lazily re-evaluated [`Getter`].
//!
//! The extension point name of a consumer is resolved in order from:
//!
//! 1. the name passed explicitly to [`extensions`],
//! 2. the `name` tag on the consumer's own binding,
//! 3. the class name of the component being constructed.
//!
//! The first step that yields a non-empty name wins.

use std::sync::Arc;

use keel_context::{
    create_binding_from_class, filter_by_tag_value, Binding, BindingFilter,
    BindingFromClassOptions, BindingTemplate, Component, Context, ContextTags, Getter,
    ResolutionSession,
};
use tracing::debug;

use crate::error::Result;
use crate::keys::CoreTags;

/// Template declaring a binding as the named extension point.
///
/// An empty name declares nothing, leaving the class name fallback in effect.
pub fn extension_point(name: &str) -> BindingTemplate {
    let name = name.to_string();
    Box::new(move |binding: &Binding| declare_extension_point(binding, &name))
}

/// Tag the binding with the extension point name, keeping its other tags
pub fn declare_extension_point(binding: &Binding, name: &str) {
    if name.is_empty() {
        return;
    }
    binding.tag_value(ContextTags::NAME, name);
}

/// Template marking a binding as an extension of the named extension point
pub fn extension_for(extension_point_name: &str) -> BindingTemplate {
    let name = extension_point_name.to_string();
    Box::new(move |binding: &Binding| {
        binding.tag_value(CoreTags::EXTENSION_FOR, name.as_str());
    })
}

/// Register a component class as an extension of the named extension point.
///
/// Every call creates a new registration. Registering the same class twice
/// under the same key replaces the earlier binding.
pub fn add_extension<C: Component>(
    context: &Context,
    extension_point_name: &str,
    options: &BindingFromClassOptions,
) -> Result<Arc<Binding>> {
    let binding = create_binding_from_class::<C>(options);
    add_extension_binding(context, extension_point_name, binding)
}

/// Register an existing binding as an extension of the named extension point
pub fn add_extension_binding(
    context: &Context,
    extension_point_name: &str,
    binding: Binding,
) -> Result<Arc<Binding>> {
    binding.apply(extension_for(extension_point_name));
    debug!(
        "Registering {} as extension of {}",
        binding.key(),
        extension_point_name
    );
    Ok(context.add(binding)?)
}

/// First resolution step: the name given by the caller
pub fn name_from_explicit(explicit: Option<&str>) -> Option<String> {
    explicit.filter(|name| !name.is_empty()).map(str::to_string)
}

/// Second resolution step: the `name` tag on the consumer's binding
pub fn name_from_binding_tag(binding: &Binding) -> Option<String> {
    binding
        .tag_value_of(ContextTags::NAME)
        .filter(|name| !name.is_empty())
}

/// Third resolution step: the class name of the consumer
pub fn name_from_component(binding: &Binding) -> Option<String> {
    binding.component_name().filter(|name| !name.is_empty())
}

/// Resolve the extension point name for the binding under construction.
///
/// Returns `None` when no step yields a name.
pub fn resolve_extension_point_name(explicit: Option<&str>, binding: &Binding) -> Option<String> {
    name_from_explicit(explicit)
        .or_else(|| name_from_binding_tag(binding))
        .or_else(|| name_from_component(binding))
}

/// Filter matching the extensions of the named extension point
pub fn extension_filter(extension_point_name: &str) -> BindingFilter {
    filter_by_tag_value(CoreTags::EXTENSION_POINT, extension_point_name)
}

/// Getter over the extensions of the consumer being constructed.
///
/// Returns `None` when the session is not constructing a binding, or when no
/// extension point name can be resolved. The getter re-queries the context on
/// every call, so extensions registered later are picked up.
pub fn extensions<T>(session: &ResolutionSession, explicit: Option<&str>) -> Option<Getter<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let binding = session.current_binding()?;
    let name = resolve_extension_point_name(explicit, binding)?;
    debug!(
        "Injecting extensions of {} into binding {}",
        name,
        binding.key()
    );
    Some(
        session
            .context()
            .create_view(extension_filter(&name))
            .getter::<T>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GreetingService;

    impl Component for GreetingService {
        type Value = Arc<GreetingService>;

        fn construct(_session: &mut ResolutionSession) -> anyhow::Result<Self::Value> {
            Ok(Arc::new(GreetingService))
        }
    }

    #[test]
    fn test_explicit_name_wins() {
        let binding = Binding::new("greeter-service");
        binding.to_class::<GreetingService>();
        binding.apply(extension_point("greeters"));

        assert_eq!(
            resolve_extension_point_name(Some("farewells"), &binding).as_deref(),
            Some("farewells")
        );
    }

    #[test]
    fn test_tag_before_class_name() {
        let binding = Binding::new("greeter-service");
        binding.to_class::<GreetingService>();
        assert_eq!(
            resolve_extension_point_name(None, &binding).as_deref(),
            Some("GreetingService")
        );

        binding.apply(extension_point("greeters"));
        assert_eq!(
            resolve_extension_point_name(None, &binding).as_deref(),
            Some("greeters")
        );
    }

    #[test]
    fn test_empty_explicit_name_falls_through() {
        let binding = Binding::new("greeter-service");
        binding.to_class::<GreetingService>();
        assert_eq!(
            resolve_extension_point_name(Some(""), &binding).as_deref(),
            Some("GreetingService")
        );
    }

    #[test]
    fn test_no_name_resolvable() {
        let binding = Binding::new("anonymous");
        assert!(resolve_extension_point_name(None, &binding).is_none());
    }

    #[test]
    fn test_declare_extension_point_keeps_tags() {
        let binding = Binding::new("service");
        binding.tag("server");
        declare_extension_point(&binding, "greeters");
        declare_extension_point(&binding, "");

        assert!(binding.has_tag("server"));
        assert_eq!(
            binding.tag_value_of(ContextTags::NAME).as_deref(),
            Some("greeters")
        );
    }

    #[test]
    fn test_extensions_outside_binding_is_none() {
        let ctx = Context::new("app");
        let session = ResolutionSession::new(&ctx);
        assert!(extensions::<u8>(&session, Some("greeters")).is_none());
    }

    #[test]
    fn test_add_extension_binding_tags() {
        let ctx = Context::new("app");
        let binding = Binding::new("greeters.en");
        binding.tag_value("language", "en");
        let added = add_extension_binding(&ctx, "greeters", binding).unwrap();

        assert_eq!(
            added.tag_value_of(CoreTags::EXTENSION_POINT).as_deref(),
            Some("greeters")
        );
        assert!(added.has_tag("language"));
        assert_eq!(ctx.find(&extension_filter("greeters")).len(), 1);
    }
}
