//! Generation computation.
//!
//! A generation is the set of pending blueprints whose parameters are all
//! satisfiable right now. Blueprints in one generation never depend on each
//! other: a dependency must already be built to be visible here.

use weft_common::types::{TypeKey, UnmetDependency};

use crate::definition::{Blueprint, ParamSource, ParamSpec};
use crate::graph::DependencyGraph;

/// Read-only view of what the registry can currently supply.
pub trait Availability {
    /// Whether an instance of this concrete type is built.
    fn has_type(&self, key: &TypeKey) -> bool;
    /// Whether some instance provides this capability.
    fn has_capability(&self, key: &TypeKey) -> bool;
    /// Whether a named value is registered under `name`.
    fn has_value(&self, name: &str) -> bool;
}

/// Outcome of one resolver pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Nothing is pending.
    Complete,
    /// These blueprints can be built now, in this order.
    Ready(Vec<TypeKey>),
    /// Blueprints remain but none can be built.
    Stuck(Vec<UnmetDependency>),
}

/// Whether a single parameter can be supplied from `view`.
///
/// A by-name parameter without its marker counts as satisfiable so that
/// building it reports the missing marker.
pub fn is_satisfiable(param: &ParamSpec, view: &impl Availability) -> bool {
    match param.source() {
        ParamSource::Type => view.has_type(&param.ty()),
        ParamSource::Capability => view.has_capability(&param.ty()),
        ParamSource::Named(Some(key)) => view.has_value(key),
        ParamSource::Named(None) => true,
    }
}

/// Describes every parameter of `blueprint` that `view` cannot supply.
pub fn unmet_params(blueprint: &Blueprint, view: &impl Availability) -> Vec<String> {
    blueprint
        .constructor()
        .params()
        .iter()
        .filter(|p| !is_satisfiable(p, view))
        .map(ParamSpec::describe)
        .collect()
}

/// Computes the next generation from the pending blueprints.
///
/// Ready blueprints are returned sorted by type name. A stuck pass reports
/// every pending blueprint, flagging those on a dependency cycle.
pub fn next_generation(pending: &[&Blueprint], view: &impl Availability) -> Generation {
    if pending.is_empty() {
        return Generation::Complete;
    }

    let mut ready: Vec<TypeKey> = pending
        .iter()
        .filter(|b| {
            b.constructor()
                .params()
                .iter()
                .all(|p| is_satisfiable(p, view))
        })
        .map(|b| b.ty())
        .collect();

    if ready.is_empty() {
        return Generation::Stuck(diagnose(pending, view));
    }
    ready.sort();
    Generation::Ready(ready)
}

fn diagnose(pending: &[&Blueprint], view: &impl Availability) -> Vec<UnmetDependency> {
    let cyclic = DependencyGraph::from_pending(pending).cyclic_components();

    let mut ordered: Vec<&Blueprint> = pending.to_vec();
    ordered.sort_by_key(|b| b.ty());
    ordered
        .into_iter()
        .map(|b| UnmetDependency {
            definition: b.ty().name().to_string(),
            missing: unmet_params(b, view),
            cyclic: cyclic.contains(&b.ty()),
        })
        .collect()
}
