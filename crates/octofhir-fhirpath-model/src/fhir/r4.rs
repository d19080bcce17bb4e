//! FHIR R4 ModelInfo
//!
//! Embedded FHIR R4 type table used to type JSON resources.

use crate::error::ModelResult;
use crate::model_info::ModelInfo;
use octofhir_fhirpath_types::TypeRegistry;
use once_cell::sync::Lazy;

/// FHIR R4 ModelInfo JSON (embedded at compile time)
pub const FHIR_R4_MODEL_INFO_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/fhir-r4-modelinfo.json"
));

/// Lazily parsed FHIR R4 ModelInfo
pub static FHIR_R4_MODEL_INFO: Lazy<ModelResult<ModelInfo>> =
    Lazy::new(|| ModelInfo::from_json(FHIR_R4_MODEL_INFO_JSON));

static FHIR_R4_TYPE_REGISTRY: Lazy<TypeRegistry> = Lazy::new(|| match fhir_r4_model_info() {
    Ok(info) => info.type_registry(),
    Err(e) => {
        log::error!("FHIR R4 model info unavailable: {}", e);
        TypeRegistry::new()
    }
});

/// Get the FHIR R4 ModelInfo
pub fn fhir_r4_model_info() -> ModelResult<&'static ModelInfo> {
    FHIR_R4_MODEL_INFO.as_ref().map_err(Clone::clone)
}

/// Type registry for the System namespace and the FHIR R4 types
pub fn fhir_r4_type_registry() -> &'static TypeRegistry {
    &FHIR_R4_TYPE_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_types::FhirPathType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedded_model_loads() {
        let info = fhir_r4_model_info().unwrap();
        assert_eq!(info.name, "FHIR");
        assert_eq!(info.version, "4.0.1");
        assert!(info.has_type("Patient"));
        assert!(info.is_resource("Observation"));
        assert!(!info.is_resource("HumanName"));
        assert_eq!(info.primitive_system_type("dateTime"), Some("DateTime"));
        assert_eq!(info.primitive_system_type("code"), Some("String"));
    }

    #[test]
    fn test_inherited_property() {
        let info = fhir_r4_model_info().unwrap();
        let id = info.property("Patient", "id").unwrap();
        assert_eq!(id.type_name, "id");
        let value = info.property("Observation", "valueQuantity").unwrap();
        assert_eq!(value.name, "value");
        assert_eq!(value.type_name, "Quantity");
    }

    #[test]
    fn test_registry_closure() {
        let registry = fhir_r4_type_registry();
        let patient = FhirPathType::fhir("Patient");
        assert!(registry.closure_contains(&patient, "DomainResource"));
        assert!(registry.closure_contains(&patient, "Resource"));
        assert!(registry.is_assignable_from(&FhirPathType::fhir("string"), &FhirPathType::fhir("code")));
        assert_eq!(registry.resolve("Patient"), Some(patient));
        assert_eq!(registry.resolve("string"), Some(FhirPathType::fhir("string")));
    }
}
