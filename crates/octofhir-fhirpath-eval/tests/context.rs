//! Evaluation Context Tests
//!
//! Tests for external constants, %context/%resource binding, constraints,
//! issue reporting and terminology-backed membership.

use octofhir_fhirpath_diagnostics::{FP0201, FP0202};
use octofhir_fhirpath_eval::{
    Constraint, ConstraintLevel, EvaluationContext, EvaluationContextBuilder, FhirPathEvaluator,
    InMemoryTerminology,
};
use octofhir_fhirpath_model::Collection;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const GENDER_VS: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";
const LOINC: &str = "http://loinc.org";
const VITALS_VS: &str = "http://example.org/ValueSet/vitals";

fn values(collection: &Collection) -> Vec<String> {
    collection.iter().map(ToString::to_string).collect()
}

fn patient() -> Value {
    json!({
        "resourceType": "Patient",
        "gender": "female",
        "name": [{"family": "Chalmers"}]
    })
}

fn observation() -> Value {
    json!({
        "resourceType": "Observation",
        "status": "final",
        "code": {
            "coding": [
                {"system": "http://example.org/local", "code": "BW"},
                {"system": LOINC, "code": "29463-7"}
            ]
        }
    })
}

fn terminology() -> Arc<InMemoryTerminology> {
    Arc::new(
        InMemoryTerminology::new()
            .with_value_set(
                GENDER_VS,
                [
                    ("http://hl7.org/fhir/administrative-gender", "male"),
                    ("http://hl7.org/fhir/administrative-gender", "female"),
                ],
            )
            .with_value_set(VITALS_VS, [(LOINC, "29463-7"), (LOINC, "8302-2")]),
    )
}

fn context_for(resource: Value) -> EvaluationContext {
    let mut ctx = EvaluationContext::from_json(resource).unwrap();
    ctx.set_terminology(terminology());
    ctx
}

// ============================================================================
// External constants
// ============================================================================

#[test]
fn test_reserved_constants() {
    let evaluator = FhirPathEvaluator::new();
    assert_eq!(
        values(&evaluator.evaluate("%ucum").unwrap()),
        vec!["http://unitsofmeasure.org"]
    );
    assert_eq!(values(&evaluator.evaluate("%loinc").unwrap()), vec![LOINC]);
    assert_eq!(
        values(&evaluator.evaluate("%sct").unwrap()),
        vec!["http://snomed.info/sct"]
    );
    assert_eq!(
        values(&evaluator.evaluate("%`vs-administrative-gender`").unwrap()),
        vec![GENDER_VS]
    );
    assert_eq!(
        values(&evaluator.evaluate("%`ext-patient-birthTime`").unwrap()),
        vec!["http://hl7.org/fhir/StructureDefinition/patient-birthTime"]
    );
}

#[test]
fn test_unknown_constant_is_empty() {
    let result = FhirPathEvaluator::new().evaluate("%missing").unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_caller_constants() {
    let mut ctx = EvaluationContextBuilder::new()
        .constant("limit", Collection::from_value(3))
        .build();
    let evaluator = FhirPathEvaluator::new();
    let result = evaluator
        .evaluate_with_context(&mut ctx, "(1 | 2 | 3 | 4).where($this < %limit)")
        .unwrap();
    assert_eq!(values(&result), vec!["1", "2"]);

    assert!(ctx.unset_external_constant("limit").is_some());
    let result = evaluator.evaluate_with_context(&mut ctx, "%limit").unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_resource_and_context_constants() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = EvaluationContext::from_json(patient()).unwrap();

    let result = evaluator
        .evaluate_with_context(&mut ctx, "%resource.gender")
        .unwrap();
    assert_eq!(values(&result), vec!["female"]);

    let result = evaluator
        .evaluate_with_context(&mut ctx, "name.select(%rootResource.gender)")
        .unwrap();
    assert_eq!(values(&result), vec!["female"]);

    let family = evaluator
        .evaluate_with_context(&mut ctx, "name.family")
        .unwrap();
    let result = evaluator
        .evaluate_collection(&mut ctx, "%context", family)
        .unwrap();
    assert_eq!(values(&result), vec!["Chalmers"]);
}

// ============================================================================
// Terminology
// ============================================================================

#[test]
fn test_member_of_code() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = context_for(patient());
    let result = evaluator
        .evaluate_with_context(&mut ctx, "gender.memberOf(%`vs-administrative-gender`)")
        .unwrap();
    assert_eq!(result.as_boolean(), Some(true));
    assert!(!ctx.has_issues());
}

#[test]
fn test_member_of_codeable_concept_checks_every_coding() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = context_for(observation());
    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("code.memberOf('{}')", VITALS_VS))
        .unwrap();
    assert_eq!(result.as_boolean(), Some(true));

    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("code.memberOf('{}')", GENDER_VS))
        .unwrap();
    assert_eq!(result.as_boolean(), Some(false));
}

#[test]
fn test_in_with_value_set_url_uses_terminology() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = context_for(patient());
    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("gender in '{}'", GENDER_VS))
        .unwrap();
    assert_eq!(result.as_boolean(), Some(true));

    // System values are never coded elements, so this stays a subset test
    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("'female' in '{}'", GENDER_VS))
        .unwrap();
    assert_eq!(result.as_boolean(), Some(false));
}

#[test]
fn test_member_of_without_terminology_reports_warning() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = EvaluationContext::from_json(patient()).unwrap();
    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("gender.memberOf('{}')", GENDER_VS))
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(ctx.issues().len(), 1);
    assert_eq!(ctx.issues()[0].code, FP0201);
}

#[test]
fn test_member_of_unknown_value_set_reports_warning() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = context_for(patient());
    let result = evaluator
        .evaluate_with_context(&mut ctx, "gender.memberOf('http://example.org/nope')")
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(ctx.issues()[0].code, FP0202);
}

#[test]
fn test_member_of_empty_input() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = context_for(patient());
    let result = evaluator
        .evaluate_with_context(&mut ctx, &format!("birthDate.memberOf('{}')", GENDER_VS))
        .unwrap();
    assert!(result.is_empty());
    assert!(!ctx.has_issues());
}

// ============================================================================
// Constraints
// ============================================================================

#[test]
fn test_issues_are_tagged_with_active_constraint() {
    let evaluator = FhirPathEvaluator::new();
    let constraint = Constraint::new(
        "pat-1",
        ConstraintLevel::Warning,
        "Patient.gender",
        "Gender must come from the administrative gender value set",
        format!("gender.memberOf('{}')", GENDER_VS),
    );
    let mut ctx = EvaluationContext::from_json(patient()).unwrap();
    ctx.set_constraint(constraint.clone());

    evaluator
        .evaluate_with_context(&mut ctx, &constraint.expression)
        .unwrap();
    assert_eq!(ctx.issues()[0].constraint.as_deref(), Some("pat-1"));

    ctx.clear_issues();
    assert!(ctx.unset_constraint().is_some());
    assert!(!ctx.has_constraint());
    assert!(!ctx.has_issues());
}
