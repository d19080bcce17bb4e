//! Navigation and Indexer Tests
//!
//! Tests for: member access, the type-name self step, choice elements, [ ]

use super::{eval, eval_on, observation, patient, values};
use octofhir_fhirpath_eval::{EvalError, FhirPathErrorCause, FhirPathEvaluator};
use pretty_assertions::assert_eq;

#[test]
fn test_member_navigation_flattens_in_order() {
    let given = eval_on("Patient.name.given", &patient());
    assert_eq!(values(&given), vec!["Peter", "James", "Jim"]);
}

#[test]
fn test_type_name_step_is_optional() {
    let with_type = eval_on("Patient.name.family", &patient());
    let without = eval_on("name.family", &patient());
    assert_eq!(values(&with_type), vec!["Chalmers"]);
    assert_eq!(with_type, without);
}

#[test]
fn test_type_name_of_base_type_navigates_to_self() {
    let result = eval_on("DomainResource.gender", &patient());
    assert_eq!(values(&result), vec!["male"]);
}

#[test]
fn test_missing_member_is_empty() {
    assert!(eval_on("Patient.deceased", &patient()).is_empty());
    assert!(eval_on("Patient.name.nickname", &patient()).is_empty());
}

#[test]
fn test_choice_element_navigates_by_stem() {
    let result = eval_on("Observation.value.unit", &observation());
    assert_eq!(values(&result), vec!["lbs"]);
}

#[test]
fn test_primitive_values_are_typed() {
    let result = eval_on("Patient.birthDate < @2000-01-01", &patient());
    assert_eq!(result.as_boolean(), Some(true));
    let result = eval_on("Patient.active = true", &patient());
    assert_eq!(result.as_boolean(), Some(true));
}

#[test]
fn test_indexer() {
    assert_eq!(values(&eval("(10 | 20 | 30)[1]")), vec!["20"]);
    assert!(eval("(10 | 20)[5]").is_empty());
    assert!(eval("(10 | 20)[-1]").is_empty());
    assert!(eval("(10 | 20)[{}]").is_empty());
    let given = eval_on("Patient.name[0].given[1]", &patient());
    assert_eq!(values(&given), vec!["James"]);
}

#[test]
fn test_indexer_rejects_non_integer() {
    let err = FhirPathEvaluator::new()
        .evaluate("(10 | 20)['a']")
        .unwrap_err();
    assert!(matches!(
        err.cause,
        FhirPathErrorCause::Evaluation(EvalError::InvalidArgument { .. })
    ));
}

#[test]
fn test_ordering_elements_without_values_is_empty() {
    for expression in [
        "Patient.name.first() < Patient.name.first()",
        "Patient.telecom >= Patient.telecom",
        "Patient.maritalStatus > 1",
        "1 <= Patient.maritalStatus",
    ] {
        assert!(eval_on(expression, &patient()).is_empty(), "{}", expression);
    }
}
