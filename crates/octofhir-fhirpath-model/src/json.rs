//! JSON adapter for FHIR resources
//!
//! Members are typed through the FHIR R4 [`ModelInfo`]; members the model
//! does not know are typed by their JSON shape. Primitive extension members
//! (`_birthDate`) are not navigable and are skipped.

use crate::error::{ModelError, ModelResult};
use crate::fhir::fhir_r4_model_info;
use crate::model_info::ModelInfo;
use crate::node::{Node, Visitable};
use indexmap::IndexMap;
use octofhir_fhirpath_types::{FhirPathDate, FhirPathDateTime, FhirPathTime, FhirPathType, SystemValue};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// A JSON element with its resolved FHIR type
#[derive(Debug)]
pub struct JsonElement {
    json: Value,
    type_name: String,
    model: Option<&'static ModelInfo>,
}

impl JsonElement {
    pub fn new(json: Value, type_name: impl Into<String>) -> Self {
        Self {
            json,
            type_name: type_name.into(),
            model: fhir_r4_model_info().ok(),
        }
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    fn child(&self, json: Value, type_name: String) -> Arc<dyn Visitable> {
        Arc::new(Self {
            json,
            type_name,
            model: self.model,
        })
    }

    /// FHIRPath name, concrete type and declaration rank of a member
    fn resolve_member(&self, key: &str, value: &Value) -> (String, String, usize) {
        let resolved = self
            .model
            .and_then(|model| model.property(&self.type_name, key).map(|p| (model, p)));
        match resolved {
            Some((model, property)) => {
                let type_name = match resource_type(value) {
                    Some(rt) if property.type_name == "Resource" => rt.to_string(),
                    _ => property.type_name,
                };
                let rank = declaration_rank(model, &self.type_name, &property.name);
                (property.name, type_name, rank)
            }
            None => (key.to_string(), shape_type(value), usize::MAX),
        }
    }
}

impl Visitable for JsonElement {
    fn type_name(&self) -> FhirPathType {
        FhirPathType::fhir(&self.type_name)
    }

    fn value(&self) -> Option<SystemValue> {
        let system = match self.model {
            Some(model) => model.primitive_system_type(&self.type_name)?,
            None => shape_system_type(&self.json)?,
        };
        let value = convert_primitive(system, &self.json);
        if value.is_none() {
            log::debug!(
                "JSON value {} is not a valid {} ({})",
                self.json,
                self.type_name,
                system
            );
        }
        value
    }

    fn children(&self) -> Vec<(String, Arc<dyn Visitable>)> {
        let Value::Object(members) = &self.json else {
            return Vec::new();
        };
        let mut resolved: Vec<(usize, String, String, &Value)> = members
            .iter()
            .filter(|(key, _)| key.as_str() != "resourceType" && !key.starts_with('_'))
            .map(|(key, value)| {
                let (name, type_name, rank) = self.resolve_member(key, value);
                (rank, name, type_name, value)
            })
            .collect();
        resolved.sort_by_key(|(rank, ..)| *rank);

        let mut children = Vec::new();
        for (_, name, type_name, value) in resolved {
            match value {
                Value::Array(items) => {
                    for item in items.iter().filter(|item| !item.is_null()) {
                        let item_type = match resource_type(item) {
                            Some(rt) if type_name == "Resource" => rt.to_string(),
                            _ => type_name.clone(),
                        };
                        children.push((name.clone(), self.child(item.clone(), item_type)));
                    }
                }
                Value::Null => {}
                _ => children.push((name, self.child(value.clone(), type_name))),
            }
        }
        children
    }
}

fn resource_type(value: &Value) -> Option<&str> {
    value.get("resourceType").and_then(Value::as_str)
}

/// Position of an element in declaration order, base types first
fn declaration_rank(model: &ModelInfo, type_name: &str, element: &str) -> usize {
    let mut chain = Vec::new();
    let mut current = model.get_type(type_name);
    while let Some(info) = current {
        chain.push(info);
        current = info.base_type.as_deref().and_then(|base| model.get_type(base));
    }
    chain
        .iter()
        .rev()
        .flat_map(|info| info.elements.iter())
        .position(|e| e.name == element || e.choice_stem() == Some(element))
        .unwrap_or(usize::MAX)
}

fn shape_type(value: &Value) -> String {
    match value {
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if n.is_i64() => "integer".to_string(),
        Value::Number(_) => "decimal".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Object(_) => resource_type(value).unwrap_or("Element").to_string(),
        Value::Array(_) | Value::Null => "Element".to_string(),
    }
}

fn shape_system_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("Boolean"),
        Value::Number(n) if n.is_i64() => Some("Integer"),
        Value::Number(_) => Some("Decimal"),
        Value::String(_) => Some("String"),
        _ => None,
    }
}

fn convert_primitive(system: &str, json: &Value) -> Option<SystemValue> {
    match system {
        "Boolean" => json.as_bool().map(SystemValue::Boolean),
        "Integer" => json
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(SystemValue::Integer),
        "Decimal" => match json {
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .map(SystemValue::Decimal)
            }
            _ => None,
        },
        "String" => json.as_str().map(SystemValue::string),
        "Date" => json.as_str().and_then(FhirPathDate::parse).map(SystemValue::Date),
        "DateTime" => json
            .as_str()
            .and_then(FhirPathDateTime::parse)
            .map(SystemValue::DateTime),
        "Time" => json.as_str().and_then(FhirPathTime::parse).map(SystemValue::Time),
        _ => None,
    }
}

/// A rooted node tree over a JSON resource or element
#[derive(Debug, Clone)]
pub struct FhirPathTree {
    root: Node,
}

impl FhirPathTree {
    /// Tree over a resource (`resourceType` required)
    pub fn from_resource(json: Value) -> ModelResult<Self> {
        let resource_type = resource_type(&json)
            .ok_or_else(|| ModelError::InvalidResource("missing resourceType".to_string()))?
            .to_string();
        if let Ok(model) = fhir_r4_model_info() {
            if !model.has_type(&resource_type) {
                log::debug!("Resource type {} is not in the model, typing by shape", resource_type);
            }
        }
        let element = JsonElement::new(json, resource_type.clone());
        Ok(Self {
            root: Node::from_visitable(Some(resource_type), Arc::new(element)),
        })
    }

    /// Tree over an element of a known type
    pub fn from_element(json: Value, type_name: &str) -> ModelResult<Self> {
        if !json.is_object() && !json.is_string() && !json.is_number() && !json.is_boolean() {
            return Err(ModelError::InvalidResource(format!(
                "cannot adapt JSON {} as {}",
                json, type_name
            )));
        }
        let element = JsonElement::new(json, type_name);
        Ok(Self {
            root: Node::from_visitable(None, Arc::new(element)),
        })
    }

    /// Tree over any JSON: resources by `resourceType`, other values by shape
    pub fn from_json(json: Value) -> ModelResult<Self> {
        if resource_type(&json).is_some() {
            return Self::from_resource(json);
        }
        let type_name = shape_type(&json);
        Self::from_element(json, &type_name)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Render a node back to JSON
///
/// Value nodes become JSON scalars (quantities an object with `value` and
/// `unit`); elements become objects, repeated children arrays.
pub fn node_to_json(node: &Node) -> Value {
    if node.children().is_empty() || node.node_type().is_system() {
        if let Some(value) = node.value() {
            return value_to_json(value);
        }
    }
    let mut members: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for child in node.children() {
        members
            .entry(child.name().unwrap_or_default())
            .or_default()
            .push(node_to_json(child));
    }
    let mut object = serde_json::Map::new();
    for (name, mut values) in members {
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(name.to_string(), value);
    }
    Value::Object(object)
}

fn value_to_json(value: &SystemValue) -> Value {
    match value {
        SystemValue::Boolean(b) => Value::Bool(*b),
        SystemValue::Integer(i) => Value::from(*i),
        SystemValue::Decimal(d) => decimal_to_json(d),
        SystemValue::Quantity(q) => serde_json::json!({
            "value": decimal_to_json(&q.value),
            "unit": q.unit,
        }),
        other => Value::String(other.to_string()),
    }
}

fn decimal_to_json(d: &Decimal) -> Value {
    serde_json::Number::from_str(&d.to_string())
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(d.to_string()))
}
