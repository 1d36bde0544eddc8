//! Well-known tag names understood by the registry itself.

/// Tags attached by the registry when bindings are created from classes.
pub struct ContextTags;

impl ContextTags {
    /// Name of the component, or of the extension point it declares
    pub const NAME: &'static str = "name";

    /// Namespace the binding key was derived from
    pub const NAMESPACE: &'static str = "namespace";
}
