//! The public register / wire / resolve surface.
//!
//! A [`Container`] accepts definitions and named values while idle, then
//! wires them in generations: every pass builds all definitions whose
//! parameters are satisfiable, until nothing is pending or a pass makes no
//! progress. Once wiring has run the container is frozen and only serves
//! lookups.

use std::any::Any;
use std::sync::Arc;

use weft_common::config::{ConfigValue, WeftConfig, flatten_values, load_values};
use weft_common::error::{Result, WiringError};
use weft_common::types::{TypeKey, WiringState};

use crate::builder::build;
use crate::definition::{Blueprint, Component, Definition};
use crate::plan::Plan;
use crate::registry::Registry;
use crate::resolver::{Availability, Generation, next_generation};
use crate::validator::validate_definitions;

/// Dependency-injection container.
#[derive(Debug)]
pub struct Container {
    registry: Registry,
    pending: Vec<Blueprint>,
    state: WiringState,
    value_separator: String,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty, idle container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            pending: Vec::new(),
            state: WiringState::Idle,
            value_separator: weft_common::constants::DEFAULT_VALUE_SEPARATOR.to_string(),
        }
    }

    /// Creates a container and registers the named values from
    /// `config.values_file`, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the values file cannot be loaded.
    pub fn from_config(config: &WeftConfig) -> Result<Self> {
        let mut container = Self::new();
        container.value_separator.clone_from(&config.value_separator);
        if let Some(path) = &config.values_file {
            let values = load_values(path, &config.value_separator)?;
            container.register_config_values(values)?;
        }
        Ok(container)
    }

    /// Registers a batch of definitions.
    ///
    /// A type that is already registered is skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`WiringError::AmbiguousConstructor`] naming every definition in the
    ///   batch without exactly one constructor; nothing is registered.
    /// - [`WiringError::Frozen`] if wiring already ran.
    pub fn register_definitions(
        &mut self,
        definitions: impl IntoIterator<Item = Definition>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let blueprints = validate_definitions(definitions.into_iter().collect())?;

        for blueprint in blueprints {
            let ty = blueprint.ty();
            if self.is_registered(&ty) {
                tracing::warn!(definition = ty.name(), "duplicate definition ignored");
                continue;
            }
            tracing::debug!(definition = ty.name(), "registered definition");
            self.pending.push(blueprint);
        }
        Ok(())
    }

    /// Registers a type that describes its own definition.
    ///
    /// # Errors
    ///
    /// Same as [`Container::register_definitions`].
    pub fn register<T: Component>(&mut self) -> Result<()> {
        self.register_definitions([T::definition().build()])
    }

    /// Registers a named value.
    ///
    /// # Errors
    ///
    /// - [`WiringError::AmbiguousValueName`] if `name` is taken.
    /// - [`WiringError::Frozen`] if wiring already ran.
    pub fn register_value<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<()> {
        self.ensure_idle()?;
        self.registry.register_value(name, Arc::new(value))
    }

    /// Registers every leaf of a JSON object as a named value.
    ///
    /// Nested keys are joined with the configured separator. The document
    /// is checked for collisions before anything is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an object, a key is already
    /// registered, or wiring already ran.
    pub fn register_values_from_json(&mut self, document: &serde_json::Value) -> Result<()> {
        self.ensure_idle()?;
        let values = flatten_values(document, &self.value_separator)?;
        self.register_config_values(values)
    }

    fn register_config_values(
        &mut self,
        values: impl IntoIterator<Item = (String, ConfigValue)>,
    ) -> Result<()> {
        let values: Vec<(String, ConfigValue)> = values.into_iter().collect();
        if let Some((name, _)) = values.iter().find(|(name, _)| self.registry.has_value(name)) {
            return Err(WiringError::AmbiguousValueName { name: name.clone() });
        }
        for (name, value) in values {
            self.registry.register_value(name, value.into_instance())?;
        }
        Ok(())
    }

    /// Builds every registered definition.
    ///
    /// Calling `wire` again after it succeeded is a no-op.
    ///
    /// # Errors
    ///
    /// - [`WiringError::UnmetDependencies`] when a generation makes no
    ///   progress, listing every remaining definition.
    /// - [`WiringError::MultipleInterfaceImplementation`] when two instances
    ///   claim one capability.
    /// - [`WiringError::ObjectInstantiationFailure`] when a factory fails.
    /// - [`WiringError::AnnotationNotFound`] when a by-name parameter has no marker.
    /// - [`WiringError::Frozen`] if an earlier call failed.
    ///
    /// After a failure, instances from completed generations stay
    /// observable, but the container must not be treated as wired.
    pub fn wire(&mut self) -> Result<()> {
        match self.state {
            WiringState::Idle => {}
            WiringState::Complete => {
                tracing::debug!("container already wired");
                return Ok(());
            }
            state @ (WiringState::Wiring | WiringState::Failed) => {
                return Err(WiringError::Frozen { state });
            }
        }

        tracing::info!(
            definitions = self.pending.len(),
            values = self.registry.value_names().len(),
            "wiring container"
        );
        self.state = WiringState::Wiring;

        match self.run_generations() {
            Ok(generations) => {
                self.state = WiringState::Complete;
                tracing::info!(
                    instances = self.registry.len(),
                    generations,
                    "wiring complete"
                );
                Ok(())
            }
            Err(e) => {
                self.state = WiringState::Failed;
                tracing::error!(error = %e, built = self.registry.len(), "wiring failed");
                Err(e)
            }
        }
    }

    fn run_generations(&mut self) -> Result<usize> {
        let mut generation = 0_usize;
        loop {
            let ready = {
                let pending: Vec<&Blueprint> = self.pending.iter().collect();
                match next_generation(&pending, &self.registry) {
                    Generation::Complete => return Ok(generation),
                    Generation::Ready(ready) => ready,
                    Generation::Stuck(unmet) => {
                        return Err(WiringError::UnmetDependencies { unmet });
                    }
                }
            };
            generation += 1;
            tracing::debug!(generation, size = ready.len(), "building generation");

            let built = ready
                .iter()
                .filter_map(|ty| self.pending.iter().find(|b| b.ty() == *ty))
                .map(|blueprint| build(blueprint, &self.registry))
                .collect::<Result<Vec<_>>>()?;
            self.registry.record_instances(built)?;
            self.pending.retain(|b| !ready.contains(&b.ty()));
        }
    }

    /// Predicts the generations [`Container::wire`] would build, without
    /// constructing anything.
    ///
    /// # Errors
    ///
    /// Returns the unmet-dependency or capability conflict wiring would hit.
    pub fn plan(&self) -> Result<Plan> {
        crate::plan::plan(&self.pending, &self.registry)
    }

    /// Returns the built instance of concrete type `T`.
    #[must_use]
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.registry
            .lookup_by_type(&TypeKey::of::<T>())
            .and_then(|instance| Arc::clone(instance).downcast::<T>().ok())
    }

    /// Returns the instance registered under capability `C`.
    #[must_use]
    pub fn resolve_capability<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.registry
            .lookup_by_capability(&TypeKey::of::<C>())
            .and_then(|instance| Arc::clone(instance).downcast::<Arc<C>>().ok())
            .map(|capability| Arc::clone(&*capability))
    }

    /// Returns the named value registered under `name`, if it is a `T`.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.registry
            .value(name)
            .and_then(|instance| Arc::clone(instance).downcast::<T>().ok())
    }

    /// Returns the current wiring state.
    #[must_use]
    pub const fn state(&self) -> WiringState {
        self.state
    }

    /// Returns `true` once every definition has been built.
    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.state == WiringState::Complete
    }

    /// Returns the number of definitions not yet built.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    fn is_registered(&self, ty: &TypeKey) -> bool {
        self.registry.has_type(ty) || self.pending.iter().any(|b| b.ty() == *ty)
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            WiringState::Idle => Ok(()),
            state => Err(WiringError::Frozen { state }),
        }
    }
}
