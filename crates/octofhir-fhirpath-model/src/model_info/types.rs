//! ModelInfo abstraction for data model definitions

use crate::error::{ModelError, ModelResult};
use indexmap::IndexMap;
use octofhir_fhirpath_types::{FhirPathType, TypeRegistry};
use serde::{Deserialize, Serialize};

/// Type table of a data model
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (e.g., "FHIR")
    pub name: String,
    /// Model version
    pub version: String,
    /// Model URL
    pub url: String,
    /// Type definitions keyed by name, in declaration order
    pub type_infos: IndexMap<String, TypeInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModelInfo {
    name: String,
    version: String,
    #[serde(default)]
    url: String,
    type_infos: Vec<TypeInfo>,
}

impl ModelInfo {
    /// Create an empty ModelInfo
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: String::new(),
            type_infos: IndexMap::new(),
        }
    }

    /// Parse the JSON form: `{ name, version, url, typeInfos: [..] }`
    pub fn from_json(text: &str) -> ModelResult<Self> {
        let raw: RawModelInfo =
            serde_json::from_str(text).map_err(|e| ModelError::ParseError(e.to_string()))?;
        let mut info = Self::new(raw.name, raw.version);
        info.url = raw.url;
        for type_info in raw.type_infos {
            info.add_type(type_info);
        }
        Ok(info)
    }

    pub fn add_type(&mut self, type_info: TypeInfo) {
        self.type_infos.insert(type_info.name.clone(), type_info);
    }

    /// Get type info by name
    pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
        self.type_infos.get(name)
    }

    /// Check if model contains type
    pub fn has_type(&self, name: &str) -> bool {
        self.type_infos.contains_key(name)
    }

    /// Resolve a JSON member name against a type, traversing base types
    ///
    /// Choice elements match their typed form: `valueQuantity` resolves to
    /// the `value[x]` element with type `Quantity` and FHIRPath name `value`.
    pub fn property(&self, parent_type: &str, member: &str) -> Option<ResolvedProperty> {
        let mut current = self.get_type(parent_type)?;
        loop {
            if let Some(resolved) = current.resolve_member(member) {
                return Some(resolved);
            }
            let base = current.base_type.as_deref()?;
            current = self.get_type(base)?;
        }
    }

    /// Like [`ModelInfo::property`], failing with `PropertyNotFound`
    pub fn require_property(&self, parent_type: &str, member: &str) -> ModelResult<ResolvedProperty> {
        if !self.has_type(parent_type) {
            return Err(ModelError::TypeNotFound(parent_type.to_string()));
        }
        self.property(parent_type, member)
            .ok_or_else(|| ModelError::PropertyNotFound {
                parent: parent_type.to_string(),
                property: member.to_string(),
            })
    }

    /// Check if one type is derived from another (considers inheritance)
    pub fn is_derived_from(&self, child_type: &str, parent_type: &str) -> bool {
        let mut current = child_type;
        loop {
            if current == parent_type {
                return true;
            }
            match self.get_type(current).and_then(|t| t.base_type.as_deref()) {
                Some(base) => current = base,
                None => return false,
            }
        }
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        self.get_type(name).is_some_and(|t| t.primitive.is_some())
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.is_derived_from(name, "Resource")
    }

    /// System type name backing a primitive type (`dateTime` -> `DateTime`)
    pub fn primitive_system_type(&self, name: &str) -> Option<&str> {
        self.get_type(name).and_then(|t| t.primitive.as_deref())
    }

    /// Type registry holding the System namespace plus every type of this model
    ///
    /// Types without a declared base derive from `FHIR.Any`.
    pub fn type_registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for info in self.type_infos.values() {
            let base = info.base_type.as_deref().unwrap_or("Any");
            registry.register(FhirPathType::fhir(&info.name), FhirPathType::fhir(base));
        }
        registry
    }
}

/// Type information for a model type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    /// Type name
    pub name: String,
    /// Base type name
    #[serde(default)]
    pub base_type: Option<String>,
    /// System type carrying the value of a primitive type
    #[serde(default)]
    pub primitive: Option<String>,
    /// Property definitions
    #[serde(default)]
    pub elements: Vec<PropertyInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            primitive: None,
            elements: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_element(mut self, element: PropertyInfo) -> Self {
        self.elements.push(element);
        self
    }

    /// Get property by name
    pub fn get_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.elements.iter().find(|e| e.name == name)
    }

    fn resolve_member(&self, member: &str) -> Option<ResolvedProperty> {
        self.elements.iter().find_map(|element| {
            let Some(stem) = element.choice_stem() else {
                return (element.name == member).then(|| ResolvedProperty {
                    name: element.name.clone(),
                    type_name: element.element_type.clone(),
                    is_list: element.is_list,
                });
            };
            let suffix = member.strip_prefix(stem).filter(|s| !s.is_empty())?;
            element
                .choices
                .iter()
                .find(|choice| capitalize(choice) == suffix)
                .map(|choice| ResolvedProperty {
                    name: stem.to_string(),
                    type_name: choice.clone(),
                    is_list: false,
                })
        })
    }
}

/// Property information within a type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    /// Property name; choice elements end in `[x]`
    pub name: String,
    /// Property type; empty for choice elements
    #[serde(rename = "type", default)]
    pub element_type: String,
    /// Whether property is a list
    #[serde(default)]
    pub is_list: bool,
    /// Allowed types of a choice element
    #[serde(default)]
    pub choices: Vec<String>,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: element_type.into(),
            is_list: false,
            choices: Vec::new(),
        }
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn choice(name: &str, choices: &[&str]) -> Self {
        Self {
            name: format!("{}[x]", name),
            element_type: String::new(),
            is_list: false,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `value` for `value[x]`
    pub fn choice_stem(&self) -> Option<&str> {
        self.name.strip_suffix("[x]")
    }
}

/// A JSON member resolved against the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    /// Name the member is navigated by
    pub name: String,
    /// Concrete type of the member
    pub type_name: String,
    pub is_list: bool,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model() -> ModelInfo {
        let mut info = ModelInfo::new("Test", "1");
        info.add_type(TypeInfo::new("Element"));
        info.add_type(TypeInfo::new("Quantity").with_base("Element"));
        info.add_type(TypeInfo::new("Age").with_base("Quantity"));
        info.add_type(
            TypeInfo::new("Observation")
                .with_base("Element")
                .with_element(PropertyInfo::new("status", "code"))
                .with_element(PropertyInfo::choice("value", &["Quantity", "string", "dateTime"]))
                .with_element(PropertyInfo::new("note", "Annotation").list()),
        );
        info
    }

    #[test]
    fn test_choice_member_resolution() {
        let info = model();
        assert_eq!(
            info.property("Observation", "valueQuantity"),
            Some(ResolvedProperty {
                name: "value".to_string(),
                type_name: "Quantity".to_string(),
                is_list: false,
            })
        );
        assert_eq!(
            info.property("Observation", "valueDateTime").map(|p| p.type_name),
            Some("dateTime".to_string())
        );
        assert_eq!(info.property("Observation", "valueBoolean"), None);
        assert_eq!(info.property("Observation", "value"), None);
    }

    #[test]
    fn test_list_property() {
        let info = model();
        assert!(info.property("Observation", "note").is_some_and(|p| p.is_list));
    }

    #[test]
    fn test_require_property_errors() {
        let info = model();
        assert!(matches!(
            info.require_property("Observation", "nope"),
            Err(ModelError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            info.require_property("Nope", "status"),
            Err(ModelError::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_is_derived_from() {
        let info = model();
        assert!(info.is_derived_from("Age", "Element"));
        assert!(info.is_derived_from("Age", "Age"));
        assert!(!info.is_derived_from("Element", "Age"));
    }

    #[test]
    fn test_type_registry_roots_at_any() {
        let registry = model().type_registry();
        let age = FhirPathType::fhir("Age");
        assert!(registry.is_assignable_from(&FhirPathType::fhir("Quantity"), &age));
        assert!(registry.is_assignable_from(&FhirPathType::fhir("Any"), &age));
        assert_eq!(registry.base_type(&FhirPathType::fhir("Element")), FhirPathType::fhir("Any"));
    }
}
