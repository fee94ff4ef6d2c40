//! Unified error types for the Weft workspace.
//!
//! Every failure of registration or wiring is terminal for the call that
//! raised it. The engine never retries.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{BoxError, UnmetDependency, WiringState};

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum WiringError {
    /// One or more registered types do not expose exactly one constructor.
    #[error("ambiguous constructor: {}", .types.join(", "))]
    AmbiguousConstructor {
        /// Names of every offending type in the batch.
        types: Vec<String>,
    },

    /// A named value was registered under a key that is already taken.
    #[error("ambiguous value name: {name}")]
    AmbiguousValueName {
        /// The duplicated key.
        name: String,
    },

    /// Definitions could not be satisfied from the registry.
    #[error("unmet dependencies: {}", format_unmet(.unmet))]
    UnmetDependencies {
        /// Every definition left unbuilt, with its unmet parameters.
        unmet: Vec<UnmetDependency>,
    },

    /// A by-name parameter carries no injection-name marker.
    #[error("inject marker not found on parameter `{parameter}` of {definition}")]
    AnnotationNotFound {
        /// Type name of the malformed definition.
        definition: String,
        /// Name of the unmarked parameter.
        parameter: String,
    },

    /// Two instances claim the same capability.
    #[error("{capability} has multiple implementations: {existing} and {conflicting}")]
    MultipleInterfaceImplementation {
        /// Name of the contested capability.
        capability: String,
        /// Type already registered for the capability.
        existing: String,
        /// Type that attempted to claim it.
        conflicting: String,
    },

    /// The factory of a definition failed.
    #[error("failed to instantiate {definition}: {source}")]
    ObjectInstantiationFailure {
        /// Type name of the definition being built.
        definition: String,
        /// Error returned by the factory.
        source: BoxError,
    },

    /// Registration or wiring was attempted after wiring already ran.
    #[error("container is frozen: wiring is {state}")]
    Frozen {
        /// State the container was in.
        state: WiringState,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Failure to hand a resolved argument to a factory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// The factory asked for more arguments than the constructor declares.
    #[error("{definition} requested argument #{index} but only {declared} are declared")]
    Exhausted {
        /// Type name of the definition being built.
        definition: String,
        /// Zero-based index of the requested argument.
        index: usize,
        /// Number of declared parameters.
        declared: usize,
    },

    /// The resolved argument is not of the requested type.
    #[error("parameter `{parameter}` of {definition} is not a {expected}")]
    TypeMismatch {
        /// Type name of the definition being built.
        definition: String,
        /// Name of the parameter.
        parameter: String,
        /// Requested type name.
        expected: &'static str,
    },
}

fn format_unmet(unmet: &[UnmetDependency]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WiringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_constructor_lists_all_types() {
        let err = WiringError::AmbiguousConstructor {
            types: vec!["a::A".into(), "b::B".into()],
        };
        assert_eq!(err.to_string(), "ambiguous constructor: a::A, b::B");
    }

    #[test]
    fn unmet_dependencies_joins_definitions() {
        let err = WiringError::UnmetDependencies {
            unmet: vec![
                UnmetDependency {
                    definition: "A".into(),
                    missing: vec!["b: B".into()],
                    cyclic: true,
                },
                UnmetDependency {
                    definition: "B".into(),
                    missing: vec!["a: A".into()],
                    cyclic: true,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("A (missing: b: B) [cycle]"), "got: {msg}");
        assert!(msg.contains("B (missing: a: A) [cycle]"), "got: {msg}");
    }

    #[test]
    fn instantiation_failure_preserves_cause() {
        let cause: BoxError = "connection refused".into();
        let err = WiringError::ObjectInstantiationFailure {
            definition: "Db".into(),
            source: cause,
        };
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "connection refused");
    }
}
