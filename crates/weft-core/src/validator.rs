//! Registration-time validation of component definitions.
//!
//! A definition is eligible for wiring only if it declares exactly one
//! constructor. Every offending definition in a batch is collected and
//! reported in a single error.

use weft_common::error::{Result, WiringError};

use crate::definition::{Blueprint, Definition};

/// Validates a batch of definitions and converts them into blueprints.
///
/// # Errors
///
/// Returns [`WiringError::AmbiguousConstructor`] naming every definition
/// with zero or several constructors. Nothing from the batch is accepted
/// in that case.
pub fn validate_definitions(definitions: Vec<Definition>) -> Result<Vec<Blueprint>> {
    tracing::debug!(count = definitions.len(), "validating definitions");

    let ambiguous: Vec<String> = definitions
        .iter()
        .filter(|d| d.constructor_count() != 1)
        .map(|d| d.ty().name().to_string())
        .collect();
    if !ambiguous.is_empty() {
        return Err(WiringError::AmbiguousConstructor { types: ambiguous });
    }

    Ok(definitions
        .into_iter()
        .filter_map(|definition| {
            let (ty, mut constructors, capabilities) = definition.into_parts();
            constructors
                .pop()
                .map(|constructor| Blueprint::new(ty, constructor, capabilities))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ParamSpec;

    struct Single;
    struct Double;
    struct Bare;

    fn single() -> Definition {
        Definition::of::<Single>()
            .constructor(vec![], |_| Ok(Single))
            .build()
    }

    fn double() -> Definition {
        Definition::of::<Double>()
            .constructor(vec![], |_| Ok(Double))
            .constructor(vec![ParamSpec::of_type::<Single>("single")], |_| {
                Ok(Double)
            })
            .build()
    }

    fn bare() -> Definition {
        Definition::of::<Bare>().build()
    }

    #[test]
    fn validate_empty_batch_succeeds() {
        let blueprints = validate_definitions(Vec::new()).expect("should validate");
        assert!(blueprints.is_empty());
    }

    #[test]
    fn validate_single_constructor_succeeds() {
        let blueprints = validate_definitions(vec![single()]).expect("should validate");
        assert_eq!(blueprints.len(), 1);
        assert!(blueprints[0].constructor().params().is_empty());
    }

    #[test]
    fn validate_two_constructors_fails() {
        let err = validate_definitions(vec![single(), double()]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Double"), "got: {msg}");
        assert!(!msg.contains("Single"), "got: {msg}");
    }

    #[test]
    fn validate_reports_every_offender() {
        let err = validate_definitions(vec![double(), single(), bare()]).unwrap_err();
        match err {
            WiringError::AmbiguousConstructor { types } => {
                assert_eq!(types.len(), 2);
                assert!(types.iter().any(|t| t.ends_with("Double")));
                assert!(types.iter().any(|t| t.ends_with("Bare")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
