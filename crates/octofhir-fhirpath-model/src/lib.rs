//! FHIRPath node model
//!
//! This crate provides:
//! - [`Node`] and [`Collection`], the values every expression evaluates to
//! - the [`Visitable`] capability for navigable data elements
//! - ModelInfo with an embedded FHIR R4 type table
//! - a JSON adapter building a [`FhirPathTree`] from FHIR resources

pub mod collection;
pub mod error;
pub mod fhir;
pub mod json;
pub mod model_info;
pub mod node;

pub use collection::Collection;
pub use error::{ModelError, ModelResult};
pub use fhir::{fhir_r4_model_info, fhir_r4_type_registry};
pub use json::{FhirPathTree, JsonElement, node_to_json};
pub use model_info::{ModelInfo, PropertyInfo, ResolvedProperty, TypeInfo};
pub use node::{Node, Visitable};
