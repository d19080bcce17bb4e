//! FHIRPath expression engine for Rust
//!
//! This crate bundles the FHIRPath workspace:
//! - Parsing FHIRPath expressions into an AST
//! - The System value family and the System/FHIR type registry
//! - A node model over FHIR R4 JSON resources
//! - Expression evaluation with caching, a function registry and
//!   terminology hooks
//!
//! # Example
//!
//! ```ignore
//! use octofhir_fhirpath::evaluate;
//! use serde_json::json;
//!
//! let patient = json!({
//!     "resourceType": "Patient",
//!     "name": [{"use": "official", "given": ["Peter", "James"]}]
//! });
//!
//! let given = evaluate("Patient.name.where(use = 'official').given", &patient)?;
//! assert_eq!(given.len(), 2);
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_fhirpath_ast as ast;
pub use octofhir_fhirpath_diagnostics as diagnostics;
pub use octofhir_fhirpath_eval as eval;
pub use octofhir_fhirpath_model as model;
pub use octofhir_fhirpath_parser as parser;
pub use octofhir_fhirpath_types as types;

// Convenience re-exports
pub use octofhir_fhirpath_ast::Expression;
pub use octofhir_fhirpath_diagnostics::{Diagnostic, ErrorCode, ParseError, Severity};
pub use octofhir_fhirpath_eval::{
    EvaluationContext, EvaluatorConfig, FhirPathError, FhirPathEvaluator, FunctionRegistry,
    TerminologyService,
};
pub use octofhir_fhirpath_model::{Collection, FhirPathTree, Node};
pub use octofhir_fhirpath_parser::parse_expression;
pub use octofhir_fhirpath_types::SystemValue;

/// Evaluate `expression` against a JSON resource with a default evaluator
pub fn evaluate(
    expression: &str,
    resource: &serde_json::Value,
) -> Result<Collection, FhirPathError> {
    FhirPathEvaluator::new().evaluate_json(expression, resource)
}
