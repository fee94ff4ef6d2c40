//! Dependency graph management using `petgraph`.
//!
//! Used to diagnose a stuck wiring set: pending blueprints become nodes,
//! and an edge points from a dependency to its dependent whenever one
//! pending blueprint requires another (by type or by capability).

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use weft_common::types::TypeKey;

use crate::definition::{Blueprint, ParamSource};

/// A dependency graph of pending components.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<TypeKey, ()>,
    nodes: HashMap<TypeKey, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of requirements among pending blueprints.
    ///
    /// Requirements satisfied from outside the pending set (already built
    /// instances, named values) add no edges.
    #[must_use]
    pub fn from_pending(pending: &[&Blueprint]) -> Self {
        let mut graph = Self::new();
        let mut providers: HashMap<TypeKey, Vec<NodeIndex>> = HashMap::new();

        for blueprint in pending {
            let idx = graph.add_component(blueprint.ty());
            for capability in blueprint.capabilities() {
                providers.entry(capability.key()).or_default().push(idx);
            }
        }

        for blueprint in pending {
            let Some(&dependent) = graph.nodes.get(&blueprint.ty()) else {
                continue;
            };
            for param in blueprint.constructor().params() {
                let dependencies: Vec<NodeIndex> = match param.source() {
                    ParamSource::Type => graph
                        .nodes
                        .get(&param.ty())
                        .copied()
                        .into_iter()
                        .collect(),
                    ParamSource::Capability => {
                        providers.get(&param.ty()).cloned().unwrap_or_default()
                    }
                    ParamSource::Named(_) => Vec::new(),
                };
                for dependency in dependencies {
                    graph.add_dependency(dependent, dependency);
                }
            }
        }
        graph
    }

    /// Adds a component node to the graph, returning the existing node if
    /// the type is already present.
    pub fn add_component(&mut self, ty: TypeKey) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&ty) {
            return idx;
        }
        let idx = self.graph.add_node(ty);
        let _ = self.nodes.insert(ty, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Returns every component that lies on a dependency cycle,
    /// including components that require themselves.
    #[must_use]
    pub fn cyclic_components(&self) -> HashSet<TypeKey> {
        petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&idx| self.graph.contains_edge(idx, idx))
            })
            .flatten()
            .filter_map(|idx| self.graph.node_weight(idx).copied())
            .collect()
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Definition, ParamSpec};
    use crate::validator::validate_definitions;

    struct A;
    struct B;
    struct C;
    struct D;

    trait Port: Send + Sync {}
    impl Port for D {}

    #[test]
    fn empty_graph_has_no_cycles() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.cyclic_components().is_empty());
    }

    #[test]
    fn linear_chain_has_no_cycles() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component(TypeKey::of::<A>());
        let b = graph.add_component(TypeKey::of::<B>());
        graph.add_dependency(a, b);
        assert_eq!(graph.len(), 2);
        assert!(graph.cyclic_components().is_empty());
    }

    #[test]
    fn add_component_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let first = graph.add_component(TypeKey::of::<A>());
        let second = graph.add_component(TypeKey::of::<A>());
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn diamond_dependency_has_no_cycles() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component(TypeKey::of::<A>());
        let b = graph.add_component(TypeKey::of::<B>());
        let c = graph.add_component(TypeKey::of::<C>());
        let d = graph.add_component(TypeKey::of::<D>());
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        graph.add_dependency(b, d);
        graph.add_dependency(c, d);
        assert!(graph.cyclic_components().is_empty());
    }

    #[test]
    fn two_node_cycle_detection() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component(TypeKey::of::<A>());
        let b = graph.add_component(TypeKey::of::<B>());
        let c = graph.add_component(TypeKey::of::<C>());
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);
        graph.add_dependency(c, a);

        let cyclic = graph.cyclic_components();
        assert_eq!(cyclic.len(), 2);
        assert!(cyclic.contains(&TypeKey::of::<A>()));
        assert!(cyclic.contains(&TypeKey::of::<B>()));
        assert!(!cyclic.contains(&TypeKey::of::<C>()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component(TypeKey::of::<A>());
        graph.add_dependency(a, a);
        assert!(graph.cyclic_components().contains(&TypeKey::of::<A>()));
    }

    #[test]
    fn from_pending_follows_type_and_capability_edges() {
        let blueprints = validate_definitions(vec![
            Definition::of::<A>()
                .constructor(vec![ParamSpec::capability::<dyn Port>("port")], |_| Ok(A))
                .build(),
            Definition::of::<D>()
                .constructor(vec![ParamSpec::of_type::<A>("a")], |_| Ok(D))
                .provides::<dyn Port>(|d| d)
                .build(),
            Definition::of::<B>()
                .constructor(vec![ParamSpec::named::<String>("url", "db.url")], |_| {
                    Ok(B)
                })
                .build(),
        ])
        .expect("valid definitions");
        let pending: Vec<&Blueprint> = blueprints.iter().collect();

        let graph = DependencyGraph::from_pending(&pending);
        assert_eq!(graph.len(), 3);
        let cyclic = graph.cyclic_components();
        assert!(cyclic.contains(&TypeKey::of::<A>()));
        assert!(cyclic.contains(&TypeKey::of::<D>()));
        assert!(!cyclic.contains(&TypeKey::of::<B>()));
    }
}
