//! Type Operator Tests
//!
//! Tests for: is, as (operator and function forms), ofType

use super::{eval, eval_bool, eval_err, eval_on, observation, patient, values};
use octofhir_fhirpath_eval::{EvalError, FhirPathErrorCause};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("1 is Integer", true)]
#[case("1 is System.Integer", true)]
#[case("1 is String", false)]
#[case("'a' is String", true)]
#[case("1.5 is Decimal", true)]
#[case("@2012-01-01 is Date", true)]
#[case("5 'mg' is Quantity", true)]
#[case("true is Boolean", true)]
#[case("1 is NoSuchType", false)]
#[case("{} is Integer", false)]
#[case("(1).is(Integer)", true)]
fn test_is_on_system_values(#[case] expression: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expression), Some(expected), "{}", expression);
}

#[test]
fn test_is_on_fhir_elements() {
    let result = eval_on("Patient is Patient", &patient());
    assert_eq!(result.as_boolean(), Some(true));
    let result = eval_on("Patient is DomainResource", &patient());
    assert_eq!(result.as_boolean(), Some(true));
    let result = eval_on("Patient.gender is code", &patient());
    assert_eq!(result.as_boolean(), Some(true));
    let result = eval_on("Observation.value is Quantity", &observation());
    assert_eq!(result.as_boolean(), Some(true));
    let result = eval_on("Observation.value is CodeableConcept", &observation());
    assert_eq!(result.as_boolean(), Some(false));
}

#[test]
fn test_is_requires_singleton() {
    let err = eval_err("(1 | 2) is Integer");
    assert!(matches!(
        err.cause,
        FhirPathErrorCause::Evaluation(EvalError::SingletonExpected { size: 2 })
    ));
}

#[test]
fn test_as_filters() {
    assert_eq!(values(&eval("1 as Integer")), vec!["1"]);
    assert!(eval("1 as String").is_empty());
    let unit = eval_on("(Observation.value as Quantity).unit", &observation());
    assert_eq!(values(&unit), vec!["lbs"]);
}

#[test]
fn test_of_type_keeps_matching_items() {
    assert_eq!(values(&eval("(1 | 'a' | 2).ofType(Integer)")), vec!["1", "2"]);
    assert_eq!(values(&eval("(1 | 'a' | 2).ofType(String)")), vec!["a"]);
}

#[test]
fn test_as_unknown_type_is_an_error() {
    for expression in ["1 as NoSuchType", "(1 | 2).ofType(NoSuchType)"] {
        let err = eval_err(expression);
        assert!(
            matches!(
                err.cause,
                FhirPathErrorCause::Evaluation(EvalError::UnknownType { .. })
            ),
            "{}",
            expression
        );
    }
}
