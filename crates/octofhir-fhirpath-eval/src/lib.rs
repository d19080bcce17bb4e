//! FHIRPath Evaluation Engine
//!
//! This crate evaluates FHIRPath expressions against node trees built by
//! `octofhir-fhirpath-model`:
//!
//! - **Operators**: arithmetic, string concatenation, comparison,
//!   equality and equivalence, membership, union, three-valued logic
//! - **Inline functions**: all, exists, iif, is, as, ofType, select,
//!   where, repeat, trace
//! - **Function registry**: every other function, with a standard library
//!   registered by default
//! - **Caches**: bounded LRU caches for compiled expressions, identifiers
//!   and literals, shareable between evaluators
//!
//! # Example
//!
//! ```ignore
//! use octofhir_fhirpath_eval::FhirPathEvaluator;
//! use serde_json::json;
//!
//! let evaluator = FhirPathEvaluator::new();
//! let patient = json!({"resourceType": "Patient", "name": [{"given": ["Ann"]}]});
//! let given = evaluator.evaluate_json("Patient.name.given", &patient).unwrap();
//! ```
//!
//! # Empty propagation
//!
//! The empty collection stands for "unknown". Most operators return empty
//! when an operand is empty, and numeric failures such as division by zero
//! also give empty. Only genuinely invalid input (unknown functions or
//! types, wrong arity, incompatible operand types) produces an error.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
mod functions;
pub mod operators;
pub mod registry;
pub mod terminology;

pub use cache::{CacheStats, EvaluatorCaches, ExpressionCache, LruMemo};
pub use config::{CacheConfig, EvaluatorConfig};
pub use context::{Constraint, ConstraintLevel, EvaluationContext, EvaluationContextBuilder};
pub use error::{EvalError, EvalResult, FhirPathError, FhirPathErrorCause};
pub use evaluator::{EvaluationFrame, FhirPathEvaluator};
pub use registry::{FhirPathFunction, FnFunction, FunctionImpl, FunctionRegistry, FunctionRegistryBuilder};
pub use terminology::{InMemoryTerminology, TerminologyError, TerminologyService};
