//! The registry of named values and built instances.
//!
//! Instances are indexed by concrete type and by every capability their
//! definition declares. A capability maps to at most one instance.

use std::collections::HashMap;

use weft_common::error::{Result, WiringError};
use weft_common::types::{Instance, TypeKey};

use crate::builder::BuiltInstance;
use crate::resolver::Availability;

/// An instance registered under a capability, with the type that provides it.
#[derive(Debug, Clone)]
struct Provider {
    implementor: TypeKey,
    instance: Instance,
}

/// Owns every named value and built instance of a container.
#[derive(Debug, Default)]
pub struct Registry {
    values: HashMap<String, Instance>,
    instances: HashMap<TypeKey, Instance>,
    capabilities: HashMap<TypeKey, Provider>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named value.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::AmbiguousValueName`] if `name` is taken; the
    /// existing value is kept.
    pub fn register_value(&mut self, name: impl Into<String>, value: Instance) -> Result<()> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(WiringError::AmbiguousValueName { name });
        }
        tracing::debug!(name = %name, "registered named value");
        let _ = self.values.insert(name, value);
        Ok(())
    }

    /// Looks up a named value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// Looks up the instance of a concrete type.
    #[must_use]
    pub fn lookup_by_type(&self, key: &TypeKey) -> Option<&Instance> {
        self.instances.get(key)
    }

    /// Looks up the instance registered under a capability.
    #[must_use]
    pub fn lookup_by_capability(&self, key: &TypeKey) -> Option<&Instance> {
        self.capabilities.get(key).map(|p| &p.instance)
    }

    /// Returns the concrete type providing a capability.
    #[must_use]
    pub fn implementor_of(&self, capability: &TypeKey) -> Option<TypeKey> {
        self.capabilities.get(capability).map(|p| p.implementor)
    }

    /// Merges one generation of built instances.
    ///
    /// Concrete instances are recorded first; capabilities are then indexed
    /// in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::MultipleInterfaceImplementation`] when a
    /// capability is already claimed by another type, from this generation
    /// or an earlier one.
    pub fn record_instances(&mut self, generation: Vec<BuiltInstance>) -> Result<()> {
        for built in &generation {
            let _ = self
                .instances
                .insert(built.ty(), std::sync::Arc::clone(built.instance()));
        }

        for built in generation {
            let implementor = built.ty();
            for (capability, instance) in built.into_capabilities() {
                if let Some(existing) = self.capabilities.get(&capability) {
                    if existing.implementor != implementor {
                        return Err(WiringError::MultipleInterfaceImplementation {
                            capability: capability.name().to_string(),
                            existing: existing.implementor.name().to_string(),
                            conflicting: implementor.name().to_string(),
                        });
                    }
                }
                tracing::trace!(
                    capability = capability.name(),
                    implementor = implementor.name(),
                    "indexed capability"
                );
                let _ = self.capabilities.insert(
                    capability,
                    Provider {
                        implementor,
                        instance,
                    },
                );
            }
        }
        Ok(())
    }

    /// Returns the concrete types of every built instance, sorted by name.
    #[must_use]
    pub fn instance_types(&self) -> Vec<TypeKey> {
        let mut types: Vec<TypeKey> = self.instances.keys().copied().collect();
        types.sort();
        types
    }

    /// Returns `(capability, implementor)` pairs, sorted by capability name.
    #[must_use]
    pub fn capability_bindings(&self) -> Vec<(TypeKey, TypeKey)> {
        let mut bindings: Vec<(TypeKey, TypeKey)> = self
            .capabilities
            .iter()
            .map(|(key, provider)| (*key, provider.implementor))
            .collect();
        bindings.sort();
        bindings
    }

    /// Returns every named value key, sorted.
    #[must_use]
    pub fn value_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of built instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl Availability for Registry {
    fn has_type(&self, key: &TypeKey) -> bool {
        self.instances.contains_key(key)
    }

    fn has_capability(&self, key: &TypeKey) -> bool {
        self.capabilities.contains_key(key)
    }

    fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    trait Store: Send + Sync {}

    struct Memory;
    struct Disk;

    impl Store for Memory {}
    impl Store for Disk {}

    fn built<T: std::any::Any + Send + Sync>(value: T, provides_store: bool) -> BuiltInstance
    where
        T: Store,
    {
        let instance: Arc<T> = Arc::new(value);
        let capabilities = if provides_store {
            let store: Arc<dyn Store> = Arc::clone(&instance) as Arc<dyn Store>;
            vec![(TypeKey::of::<dyn Store>(), Arc::new(store) as Instance)]
        } else {
            Vec::new()
        };
        BuiltInstance::new(TypeKey::of::<T>(), instance as Instance, capabilities)
    }

    #[test]
    fn duplicate_value_name_keeps_first() {
        let mut registry = Registry::new();
        registry
            .register_value("db.url", Arc::new("first".to_string()))
            .expect("first registration");
        let err = registry
            .register_value("db.url", Arc::new("second".to_string()))
            .unwrap_err();
        assert!(matches!(err, WiringError::AmbiguousValueName { ref name } if name == "db.url"));

        let value = registry.value("db.url").expect("value").clone();
        let value = value.downcast::<String>().expect("string");
        assert_eq!(value.as_str(), "first");
    }

    #[test]
    fn lookups_return_none_when_absent() {
        let registry = Registry::new();
        assert!(registry.lookup_by_type(&TypeKey::of::<Memory>()).is_none());
        assert!(registry.lookup_by_capability(&TypeKey::of::<dyn Store>()).is_none());
        assert!(registry.value("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn record_indexes_type_and_capability() {
        let mut registry = Registry::new();
        registry
            .record_instances(vec![built(Memory, true)])
            .expect("record");
        assert!(registry.has_type(&TypeKey::of::<Memory>()));
        assert!(registry.has_capability(&TypeKey::of::<dyn Store>()));
        assert_eq!(
            registry.implementor_of(&TypeKey::of::<dyn Store>()),
            Some(TypeKey::of::<Memory>())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_generation_capability_conflict_fails() {
        let mut registry = Registry::new();
        let err = registry
            .record_instances(vec![built(Disk, true), built(Memory, true)])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("multiple implementations"), "got: {msg}");
        // Concrete instances of the failing generation stay recorded.
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn prior_generation_capability_conflict_fails() {
        let mut registry = Registry::new();
        registry
            .record_instances(vec![built(Memory, true)])
            .expect("first generation");
        let err = registry
            .record_instances(vec![built(Disk, true)])
            .unwrap_err();
        match err {
            WiringError::MultipleInterfaceImplementation {
                existing,
                conflicting,
                ..
            } => {
                assert!(existing.ends_with("Memory"));
                assert!(conflicting.ends_with("Disk"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn instance_types_are_sorted() {
        let mut registry = Registry::new();
        registry
            .record_instances(vec![built(Memory, false), built(Disk, false)])
            .expect("record");
        let names: Vec<&str> = registry
            .instance_types()
            .iter()
            .map(TypeKey::name)
            .collect();
        assert!(names[0].ends_with("Disk"));
        assert!(names[1].ends_with("Memory"));
    }
}
