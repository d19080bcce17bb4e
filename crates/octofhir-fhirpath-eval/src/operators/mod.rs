//! FHIRPath operator implementations
//!
//! Each module adds evaluation methods to [`FhirPathEvaluator`]:
//!
//! - `logical`: and, or, xor, implies (lazy right-hand side)
//! - `arithmetic`: +, -, &, *, /, div, mod
//! - `comparison`: =, !=, ~, !~, <, <=, >, >=
//! - `membership`: in, contains
//!
//! Union (`|`) is [`Collection::union`](octofhir_fhirpath_model::Collection::union).
//!
//! [`FhirPathEvaluator`]: crate::evaluator::FhirPathEvaluator

pub mod arithmetic;
pub mod comparison;
pub mod logical;
pub mod membership;
