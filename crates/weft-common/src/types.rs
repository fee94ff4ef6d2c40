//! Domain primitive types used across the Weft workspace.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A constructed component or a registered named value.
///
/// Instances are shared and immutable once built; consumers downcast
/// them back to their concrete type (or to `Arc<dyn Capability>`).
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error type returned by component factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identity of a concrete type or of a capability (`dyn Trait`).
///
/// Two keys are equal when their [`TypeId`]s are equal; the type name is
/// kept for diagnostics and for deterministic ordering.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`, which may be unsized (`dyn Trait`).
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lifecycle state of the wiring process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WiringState {
    /// Definitions and values are being registered.
    #[default]
    Idle,
    /// The generation loop is running.
    Wiring,
    /// Every definition has been built.
    Complete,
    /// Wiring aborted with an error; the registry may be partially populated.
    Failed,
}

impl fmt::Display for WiringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Wiring => write!(f, "wiring"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A definition that could not be built, with the parameters it still lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetDependency {
    /// Type name of the definition.
    pub definition: String,
    /// Human-readable description of every unmet parameter.
    pub missing: Vec<String>,
    /// Whether the definition sits on a dependency cycle among pending definitions.
    pub cyclic: bool,
}

impl fmt::Display for UnmetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition)?;
        if !self.missing.is_empty() {
            write!(f, " (missing: {})", self.missing.join(", "))?;
        }
        if self.cyclic {
            write!(f, " [cycle]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}

    #[test]
    fn type_keys_compare_by_type_id() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<dyn Greeter>(), TypeKey::of::<String>());
    }

    #[test]
    fn type_keys_order_by_name() {
        let mut keys = vec![TypeKey::of::<u32>(), TypeKey::of::<bool>()];
        keys.sort();
        assert_eq!(keys[0].name(), "bool");
        assert_eq!(keys[1].name(), "u32");
    }

    #[test]
    fn unmet_dependency_display_lists_missing_and_cycle() {
        let unmet = UnmetDependency {
            definition: "app::Service".into(),
            missing: vec!["repo: app::Repo".into()],
            cyclic: true,
        };
        assert_eq!(
            unmet.to_string(),
            "app::Service (missing: repo: app::Repo) [cycle]"
        );
    }

    #[test]
    fn wiring_state_display() {
        assert_eq!(WiringState::default().to_string(), "idle");
        assert_eq!(WiringState::Failed.to_string(), "failed");
    }
}
