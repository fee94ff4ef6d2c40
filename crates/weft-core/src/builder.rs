//! Instantiation of blueprints from registry contents.

use std::sync::Arc;

use weft_common::error::{Result, WiringError};
use weft_common::types::{Instance, TypeKey, UnmetDependency};

use crate::definition::{Args, Argument, Blueprint, ParamSource, ParamSpec};
use crate::registry::Registry;

/// A freshly constructed instance with its capability instances.
#[derive(Debug)]
pub struct BuiltInstance {
    ty: TypeKey,
    instance: Instance,
    capabilities: Vec<(TypeKey, Instance)>,
}

impl BuiltInstance {
    pub(crate) const fn new(
        ty: TypeKey,
        instance: Instance,
        capabilities: Vec<(TypeKey, Instance)>,
    ) -> Self {
        Self {
            ty,
            instance,
            capabilities,
        }
    }

    /// Returns the concrete type.
    #[must_use]
    pub const fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Returns the concrete instance.
    #[must_use]
    pub const fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Returns the capability keys this instance provides.
    #[must_use]
    pub fn capability_keys(&self) -> Vec<TypeKey> {
        self.capabilities.iter().map(|(key, _)| *key).collect()
    }

    pub(crate) fn into_capabilities(self) -> Vec<(TypeKey, Instance)> {
        self.capabilities
    }
}

/// Builds one blueprint.
///
/// Resolves every parameter from `registry`, invokes the factory, and
/// casts the result to each declared capability.
///
/// # Errors
///
/// - [`WiringError::AnnotationNotFound`] if a by-name parameter has no marker.
/// - [`WiringError::UnmetDependencies`] naming the parameter whose value is absent.
/// - [`WiringError::ObjectInstantiationFailure`] wrapping the factory's error.
pub fn build(blueprint: &Blueprint, registry: &Registry) -> Result<BuiltInstance> {
    let definition = blueprint.ty().name();

    let arguments = blueprint
        .constructor()
        .params()
        .iter()
        .map(|param| {
            resolve_argument(blueprint, param, registry).map(|value| Argument {
                param: param.name().to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut args = Args::new(definition, arguments);
    let instance = blueprint
        .constructor()
        .instantiate(&mut args)
        .map_err(|source| WiringError::ObjectInstantiationFailure {
            definition: definition.to_string(),
            source,
        })?;

    let capabilities = blueprint
        .capabilities()
        .iter()
        .map(|capability| {
            capability
                .cast(&instance)
                .map(|cast| (capability.key(), cast))
                .ok_or_else(|| WiringError::ObjectInstantiationFailure {
                    definition: definition.to_string(),
                    source: format!(
                        "constructed instance cannot be cast to {}",
                        capability.key()
                    )
                    .into(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::trace!(definition, capabilities = capabilities.len(), "built instance");
    Ok(BuiltInstance::new(blueprint.ty(), instance, capabilities))
}

fn resolve_argument(
    blueprint: &Blueprint,
    param: &ParamSpec,
    registry: &Registry,
) -> Result<Instance> {
    let found = match param.source() {
        ParamSource::Type => registry.lookup_by_type(&param.ty()),
        ParamSource::Capability => registry.lookup_by_capability(&param.ty()),
        ParamSource::Named(Some(key)) => registry.value(key),
        ParamSource::Named(None) => {
            return Err(WiringError::AnnotationNotFound {
                definition: blueprint.ty().name().to_string(),
                parameter: param.name().to_string(),
            });
        }
    };

    found.map(Arc::clone).ok_or_else(|| WiringError::UnmetDependencies {
        unmet: vec![UnmetDependency {
            definition: blueprint.ty().name().to_string(),
            missing: vec![param.describe()],
            cyclic: false,
        }],
    })
}
