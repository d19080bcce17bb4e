//! Operator integration tests for FHIRPath evaluation
//!
//! These tests verify operator behavior including:
//! - Empty propagation for arithmetic and comparison
//! - Three-valued logic for logical operators
//! - Collection semantics of equality, union and membership
//! - Type testing and casting against FHIR and System types

mod arithmetic;
mod comparison;
mod logical;
mod membership;
mod navigation;
mod types;

use octofhir_fhirpath_eval::{FhirPathError, FhirPathEvaluator};
use octofhir_fhirpath_model::Collection;
use serde_json::{Value, json};

// ============================================================================
// Test Helpers
// ============================================================================

pub fn evaluator() -> FhirPathEvaluator {
    FhirPathEvaluator::new()
}

pub fn eval(expression: &str) -> Collection {
    evaluator()
        .evaluate(expression)
        .unwrap_or_else(|e| panic!("{}: {:?}", e, e.cause))
}

pub fn eval_err(expression: &str) -> FhirPathError {
    match evaluator().evaluate(expression) {
        Ok(result) => panic!("expected {} to fail, got {}", expression, result),
        Err(e) => e,
    }
}

/// Boolean result of an expression; `None` for the empty collection
pub fn eval_bool(expression: &str) -> Option<bool> {
    let result = eval(expression);
    assert!(
        result.len() <= 1,
        "{} gave more than one item: {}",
        expression,
        result
    );
    result.as_boolean()
}

pub fn eval_on(expression: &str, resource: &Value) -> Collection {
    evaluator()
        .evaluate_json(expression, resource)
        .unwrap_or_else(|e| panic!("{}: {:?}", e, e.cause))
}

pub fn values(collection: &Collection) -> Vec<String> {
    collection.iter().map(ToString::to_string).collect()
}

pub fn patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "example",
        "active": true,
        "gender": "male",
        "birthDate": "1974-12-25",
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "given": ["Jim"]}
        ],
        "telecom": [
            {"system": "phone", "value": "(03) 5555 6473", "use": "work"}
        ],
        "maritalStatus": {
            "coding": [{"system": "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus", "code": "M"}]
        }
    })
}

pub fn observation() -> Value {
    json!({
        "resourceType": "Observation",
        "status": "final",
        "code": {
            "coding": [{"system": "http://loinc.org", "code": "29463-7", "display": "Body Weight"}]
        },
        "valueQuantity": {
            "value": 185,
            "unit": "lbs",
            "system": "http://unitsofmeasure.org",
            "code": "[lb_av]"
        }
    })
}
