//! Dry-run preview of the generations `wire()` would build.
//!
//! The same resolver runs against a simulated registry: each predicted
//! generation marks its types and capabilities as available without
//! constructing anything.

use std::collections::{HashMap, HashSet};
use std::fmt;

use weft_common::error::{Result, WiringError};
use weft_common::types::TypeKey;

use crate::definition::Blueprint;
use crate::registry::Registry;
use crate::resolver::{Availability, Generation, next_generation};

/// Predicted build order, one entry per generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    generations: Vec<Vec<TypeKey>>,
}

impl Plan {
    /// Returns the predicted generations.
    #[must_use]
    pub fn generations(&self) -> &[Vec<TypeKey>] {
        &self.generations
    }

    /// Returns the predicted generations as type names.
    #[must_use]
    pub fn names(&self) -> Vec<Vec<&'static str>> {
        self.generations
            .iter()
            .map(|generation| generation.iter().map(TypeKey::name).collect())
            .collect()
    }

    /// Returns the generation index at which `ty` would be built.
    #[must_use]
    pub fn generation_of(&self, ty: &TypeKey) -> Option<usize> {
        self.generations.iter().position(|g| g.contains(ty))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, generation) in self.generations.iter().enumerate() {
            writeln!(f, "generation {}:", index + 1)?;
            for ty in generation {
                writeln!(f, "  + {ty}")?;
            }
        }
        Ok(())
    }
}

struct Simulated<'a> {
    registry: &'a Registry,
    types: HashSet<TypeKey>,
    capabilities: HashMap<TypeKey, TypeKey>,
}

impl Availability for Simulated<'_> {
    fn has_type(&self, key: &TypeKey) -> bool {
        self.types.contains(key) || self.registry.has_type(key)
    }

    fn has_capability(&self, key: &TypeKey) -> bool {
        self.capabilities.contains_key(key) || self.registry.has_capability(key)
    }

    fn has_value(&self, name: &str) -> bool {
        self.registry.has_value(name)
    }
}

impl Simulated<'_> {
    fn claim(&mut self, capability: TypeKey, implementor: TypeKey) -> Result<()> {
        let existing = self
            .capabilities
            .get(&capability)
            .copied()
            .or_else(|| self.registry.implementor_of(&capability));
        if let Some(existing) = existing.filter(|e| *e != implementor) {
            return Err(WiringError::MultipleInterfaceImplementation {
                capability: capability.name().to_string(),
                existing: existing.name().to_string(),
                conflicting: implementor.name().to_string(),
            });
        }
        let _ = self.capabilities.insert(capability, implementor);
        Ok(())
    }
}

/// Predicts the generations for `pending` on top of `registry`.
///
/// # Errors
///
/// Returns the [`WiringError::UnmetDependencies`] or
/// [`WiringError::MultipleInterfaceImplementation`] that wiring would hit.
pub fn plan(pending: &[Blueprint], registry: &Registry) -> Result<Plan> {
    let mut remaining: Vec<&Blueprint> = pending.iter().collect();
    let mut view = Simulated {
        registry,
        types: HashSet::new(),
        capabilities: HashMap::new(),
    };
    let mut out = Plan::default();

    loop {
        let ready = match next_generation(&remaining, &view) {
            Generation::Complete => break,
            Generation::Ready(ready) => ready,
            Generation::Stuck(unmet) => return Err(WiringError::UnmetDependencies { unmet }),
        };

        let built = ready
            .iter()
            .filter_map(|ty| remaining.iter().find(|b| b.ty() == *ty));
        for blueprint in built {
            let _ = view.types.insert(blueprint.ty());
            for capability in blueprint.capabilities() {
                view.claim(capability.key(), blueprint.ty())?;
            }
        }
        remaining.retain(|b| !ready.contains(&b.ty()));
        out.generations.push(ready);
    }

    tracing::debug!(generations = out.generations.len(), "planned wiring");
    Ok(out)
}
