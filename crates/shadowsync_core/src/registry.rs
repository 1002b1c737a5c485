//! The property registry: insertion-ordered storage and lookup.

use std::time::Duration;

use shadowsync_codec::Value;

use crate::bind::Binding;
use crate::error::{ShadowError, ShadowResult};
use crate::property::{Permission, Property, UpdatePolicy};

/// Monotonic wire-tag counter.
///
/// An explicit allocator object rather than process-wide state: the
/// registry that owns one assigns tags in registration order, unique
/// for that registry's lifetime.
#[derive(Debug, Clone, Default)]
pub struct TagAllocator {
    next: u32,
}

impl TagAllocator {
    /// Create an allocator starting at tag 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator starting at the given tag.
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub(crate) fn allocate(&mut self) -> u32 {
        let tag = self.next;
        self.next += 1;
        tag
    }
}

/// Insertion-ordered collection of [`Property`] values.
///
/// Registration order is preserved for iteration and encoding; both
/// lookups are linear scans returning the first match, which is exact
/// because duplicate names are rejected at registration.
#[derive(Debug, Default)]
pub struct Registry {
    properties: Vec<Property>,
    tags: Option<TagAllocator>,
}

impl Registry {
    /// Create a registry whose properties are name-keyed on the wire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that assigns a wire tag to every property at
    /// registration time.
    pub fn with_tags(allocator: TagAllocator) -> Self {
        Self {
            properties: Vec::new(),
            tags: Some(allocator),
        }
    }

    /// Register a new property bound to `binding`.
    ///
    /// Returns the property's index in registration order.
    ///
    /// # Errors
    ///
    /// [`ShadowError::EmptyName`] for an empty name and
    /// [`ShadowError::DuplicateName`] when the name is already
    /// registered.
    pub fn add(&mut self, binding: Binding, name: String) -> ShadowResult<usize> {
        if name.is_empty() {
            return Err(ShadowError::EmptyName);
        }
        if self.position_by_name(&name).is_some() {
            return Err(ShadowError::DuplicateName { name });
        }
        let tag = self.tags.as_mut().map(TagAllocator::allocate);
        self.properties.push(Property::new(binding, name, tag));
        Ok(self.properties.len() - 1)
    }

    /// Find a property by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Find a property by wire tag.
    pub fn find_by_tag(&self, tag: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.tag() == Some(tag))
    }

    pub(crate) fn position_by_name(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }

    pub(crate) fn position_by_tag(&self, tag: u32) -> Option<usize> {
        self.properties.iter().position(|p| p.tag() == Some(tag))
    }

    pub(crate) fn get(&self, index: usize) -> &Property {
        &self.properties[index]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut Property {
        &mut self.properties[index]
    }

    /// Iterate properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True if no property is registered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Builder-style handle to a just-registered property.
///
/// Returned by [`DeviceShadow::add_property`] for fluent refinement of
/// the registration defaults (READWRITE, on-change, zero delta, no
/// callback). Each method applies immediately to the live registry
/// entry.
///
/// [`DeviceShadow::add_property`]: crate::DeviceShadow::add_property
#[derive(Debug)]
pub struct PropertySlot<'a> {
    registry: &'a mut Registry,
    index: usize,
}

impl<'a> PropertySlot<'a> {
    pub(crate) fn new(registry: &'a mut Registry, index: usize) -> Self {
        Self { registry, index }
    }

    /// Override the access permission.
    pub fn permission(self, permission: Permission) -> Self {
        self.registry.get_mut(self.index).set_permission(permission);
        self
    }

    /// Switch to a periodic policy: report every `period` regardless
    /// of value change.
    pub fn publish_every(self, period: Duration) -> Self {
        self.registry
            .get_mut(self.index)
            .set_policy(UpdatePolicy::Every(period));
        self
    }

    /// Switch (back) to the on-change policy.
    pub fn publish_on_change(self) -> Self {
        self.registry
            .get_mut(self.index)
            .set_policy(UpdatePolicy::OnChange);
        self
    }

    /// Set the numeric threshold below which a change is not
    /// significant. Ignored by non-numeric kinds.
    pub fn min_delta(self, delta: f64) -> Self {
        self.registry.get_mut(self.index).set_min_delta(delta);
        self
    }

    /// Attach a hook invoked after each accepted inbound write, with
    /// the newly applied value.
    pub fn on_update(self, callback: impl FnMut(&Value) + 'static) -> Self {
        self.registry
            .get_mut(self.index)
            .set_callback(Box::new(callback));
        self
    }

    /// The wire tag assigned at registration, if any.
    pub fn tag(&self) -> Option<u32> {
        self.registry.get(self.index).tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Var;

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = Registry::new();
        for name in ["a", "b", "c"] {
            let var = Var::new(0i64);
            registry.add(Binding::from(&var), name.to_string()).unwrap();
        }
        let names: Vec<_> = registry.iter().map(Property::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = Registry::new();
        let var = Var::new(0i64);
        registry.add(Binding::from(&var), "x".to_string()).unwrap();
        let err = registry.add(Binding::from(&var), "x".to_string());
        assert!(matches!(err, Err(ShadowError::DuplicateName { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_name_rejected() {
        let mut registry = Registry::new();
        let var = Var::new(0i64);
        let err = registry.add(Binding::from(&var), String::new());
        assert!(matches!(err, Err(ShadowError::EmptyName)));
    }

    #[test]
    fn tags_assigned_in_registration_order() {
        let mut registry = Registry::with_tags(TagAllocator::new());
        for name in ["a", "b"] {
            let var = Var::new(0i64);
            registry.add(Binding::from(&var), name.to_string()).unwrap();
        }
        assert_eq!(registry.find_by_name("a").unwrap().tag(), Some(0));
        assert_eq!(registry.find_by_name("b").unwrap().tag(), Some(1));
        assert_eq!(registry.find_by_tag(1).unwrap().name(), "b");
    }

    #[test]
    fn untagged_registry_assigns_no_tags() {
        let mut registry = Registry::new();
        let var = Var::new(0i64);
        registry.add(Binding::from(&var), "a".to_string()).unwrap();
        assert_eq!(registry.find_by_name("a").unwrap().tag(), None);
    }

    #[test]
    fn lookup_miss_is_none() {
        let registry = Registry::new();
        assert!(registry.find_by_name("ghost").is_none());
        assert!(registry.find_by_tag(3).is_none());
    }
}
