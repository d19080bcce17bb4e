//! End-to-end tests across the parser, model and evaluator crates

use octofhir_fhirpath::diagnostics::{FP0001, FP0106};
use octofhir_fhirpath::eval::{EvaluatorCaches, FhirPathErrorCause};
use octofhir_fhirpath::{
    Collection, EvaluationContext, EvaluatorConfig, FhirPathEvaluator, FhirPathTree, Node,
    SystemValue, evaluate, parse_expression,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

// ============================================================================
// Test Helpers
// ============================================================================

fn values(collection: &Collection) -> Vec<String> {
    collection.iter().map(ToString::to_string).collect()
}

fn patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "active": true,
        "birthDate": "1974-12-25",
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "given": ["Jim"]}
        ],
        "telecom": [
            {"system": "phone", "value": "(03) 5555 6473", "use": "work", "rank": 1},
            {"system": "email", "value": "peter@example.org", "use": "home", "rank": 2}
        ]
    })
}

fn bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {"resource": patient()},
            {"resource": {
                "resourceType": "Observation",
                "status": "final",
                "code": {"coding": [{"system": "http://loinc.org", "code": "29463-7"}]},
                "valueQuantity": {"value": 185, "unit": "lbs", "system": "http://unitsofmeasure.org", "code": "[lb_av]"}
            }}
        ]
    })
}

// ============================================================================
// Resource queries
// ============================================================================

#[rstest]
#[case("Patient.name.where(use = 'official').given", vec!["Peter", "James"])]
#[case("Patient.name.given.first()", vec!["Peter"])]
#[case("Patient.telecom.where(rank > 1).value", vec!["peter@example.org"])]
#[case("Patient.telecom.select(system & ':' & use)", vec!["phone:work", "email:home"])]
#[case("Patient.name.given.count()", vec!["3"])]
#[case("Patient.id", vec!["pat-1"])]
#[case("Patient.name.exists(family.empty())", vec!["true"])]
#[case("Patient.birthDate.toString().substring(0, 4)", vec!["1974"])]
fn test_patient_queries(#[case] expression: &str, #[case] expected: Vec<&str>) {
    let result = evaluate(expression, &patient()).unwrap();
    assert_eq!(values(&result), expected, "{}", expression);
}

#[test]
fn test_bundle_queries() {
    let bundle = bundle();
    let types = evaluate("Bundle.entry.resource.ofType(Observation).status", &bundle).unwrap();
    assert_eq!(values(&types), vec!["final"]);

    let patients = evaluate("Bundle.entry.resource.where($this is Patient).count()", &bundle)
        .unwrap();
    assert_eq!(values(&patients), vec!["1"]);
}

#[test]
fn test_quantity_elements_compare_as_quantities() {
    let bundle = bundle();
    let heavy = evaluate(
        "Bundle.entry.resource.ofType(Observation).value > 100 '[lb_av]'",
        &bundle,
    )
    .unwrap();
    assert_eq!(heavy.as_boolean(), Some(true));
}

#[test]
fn test_evaluate_node() {
    let tree = FhirPathTree::from_json(patient()).unwrap();
    let name = tree.root().children_named("name").next().cloned().unwrap();
    let result = FhirPathEvaluator::new()
        .evaluate_node("given.last()", name)
        .unwrap();
    assert_eq!(values(&result), vec!["James"]);
}

#[test]
fn test_synthetic_nodes() {
    let node = Node::from_value(SystemValue::Integer(41));
    let result = FhirPathEvaluator::new()
        .evaluate_node("$this + 1", node)
        .unwrap();
    assert_eq!(values(&result), vec!["42"]);
}

// ============================================================================
// Determinism and caching
// ============================================================================

#[test]
fn test_repeated_evaluation_is_deterministic() {
    let evaluator = FhirPathEvaluator::new();
    let mut ctx = EvaluationContext::from_json(patient()).unwrap();
    ctx.set_external_constant("use", Collection::from_value("official"));
    let expression = "name.where(use = %use).given | name.given";
    let first = evaluator.evaluate_with_context(&mut ctx, expression).unwrap();
    let second = evaluator.evaluate_with_context(&mut ctx, expression).unwrap();
    assert_eq!(first, second);
    assert_eq!(values(&first), vec!["Peter", "James", "Jim"]);
}

#[test]
fn test_compiled_expressions_are_shared() {
    let evaluator = FhirPathEvaluator::with_config(EvaluatorConfig::default());
    let first = evaluator.compile("Patient.name.given").unwrap();
    let second = evaluator.compile("Patient.name.given").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = evaluator.caches().expressions.memo().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_evaluators_can_share_caches() {
    let caches = Arc::new(EvaluatorCaches::default());
    let a = FhirPathEvaluator::new().with_caches(Arc::clone(&caches));
    let b = FhirPathEvaluator::new().with_caches(Arc::clone(&caches));
    let first = a.compile("1 + 1").unwrap();
    let second = b.compile("1 + 1").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_parse_errors_are_wrapped() {
    let err = evaluate("Patient.name.where(", &patient()).unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(err.code(), FP0001);
    assert_eq!(err.expression, "Patient.name.where(");
    assert!(parse_expression("Patient.name.where(").is_err());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_json() {
    let config: EvaluatorConfig = serde_json::from_value(json!({
        "cache": {"expressions": 16},
        "max_depth": 8
    }))
    .unwrap();
    assert_eq!(config.cache.expressions, 16);
    assert_eq!(config.cache.identifiers, 2048);
    assert_eq!(config.max_depth, 8);

    let evaluator = FhirPathEvaluator::with_config(config);
    assert_eq!(evaluator.caches().expressions.memo().capacity(), 16);
}

#[test]
fn test_depth_limit() {
    let config = EvaluatorConfig {
        max_depth: 4,
        ..EvaluatorConfig::default()
    };
    let evaluator = FhirPathEvaluator::with_config(config);
    assert!(evaluator.evaluate("1 + 1").is_ok());

    let err = evaluator.evaluate("1 + 1 + 1 + 1 + 1 + 1 + 1").unwrap_err();
    assert_eq!(err.code(), FP0106);
    assert!(matches!(err.cause, FhirPathErrorCause::Evaluation(_)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_evaluator_is_shared_across_threads() {
    let evaluator = Arc::new(FhirPathEvaluator::new());
    let resource = Arc::new(patient());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let evaluator = Arc::clone(&evaluator);
            let resource = Arc::clone(&resource);
            thread::spawn(move || {
                let expression = format!("Patient.name.given[{}]", i % 3);
                evaluator.evaluate_json(&expression, &resource).unwrap()
            })
        })
        .collect();
    let results: Vec<Vec<String>> = handles
        .into_iter()
        .map(|handle| values(&handle.join().unwrap()))
        .collect();
    assert_eq!(
        results,
        vec![
            vec!["Peter".to_string()],
            vec!["James".to_string()],
            vec!["Jim".to_string()],
            vec!["Peter".to_string()],
        ]
    );
}
