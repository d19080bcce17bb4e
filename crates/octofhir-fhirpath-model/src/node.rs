//! Navigable nodes over a data tree
//!
//! A [`Node`] wraps either a [`Visitable`] element of a resource or a
//! synthetic System value. Children are materialized on first access and
//! keep a non-owning link back to their parent.

use crate::fhir::fhir_r4_type_registry;
use octofhir_fhirpath_types::{FhirPathType, Quantity, SystemValue, ValueError, ValueResult};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Capability of an element that can be navigated by FHIRPath
pub trait Visitable: Send + Sync + fmt::Debug {
    /// Declared type of the element
    fn type_name(&self) -> FhirPathType;

    /// Primitive value, for primitive elements
    fn value(&self) -> Option<SystemValue>;

    /// Named children in declaration order, one entry per list item
    fn children(&self) -> Vec<(String, Arc<dyn Visitable>)>;
}

struct NodeInner {
    name: Option<String>,
    ty: FhirPathType,
    value: Option<SystemValue>,
    source: Option<Arc<dyn Visitable>>,
    children: OnceLock<Vec<Node>>,
    parent: Weak<NodeInner>,
}

/// One position in an evaluated tree; cheap to clone
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Synthetic node holding a System value
    pub fn from_value(value: impl Into<SystemValue>) -> Self {
        let value = value.into();
        Self {
            inner: Arc::new(NodeInner {
                name: None,
                ty: value.system_type(),
                value: Some(value),
                source: None,
                children: OnceLock::new(),
                parent: Weak::new(),
            }),
        }
    }

    /// Root node over a visitable element
    pub fn from_visitable(name: Option<String>, source: Arc<dyn Visitable>) -> Self {
        Self::build(name, source, Weak::new())
    }

    fn build(name: Option<String>, source: Arc<dyn Visitable>, parent: Weak<NodeInner>) -> Self {
        let ty = source.type_name();
        let value = source
            .value()
            .or_else(|| quantity_value(&ty, source.as_ref()).map(SystemValue::Quantity));
        Self {
            inner: Arc::new(NodeInner {
                name,
                ty,
                value,
                source: Some(source),
                children: OnceLock::new(),
                parent,
            }),
        }
    }

    /// Element name; absent for roots and synthetic values
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Declared type
    pub fn node_type(&self) -> &FhirPathType {
        &self.inner.ty
    }

    pub fn has_value(&self) -> bool {
        self.inner.value.is_some()
    }

    pub fn value(&self) -> Option<&SystemValue> {
        self.inner.value.as_ref()
    }

    /// Quantity view; FHIR `Quantity` elements carry their value and code
    pub fn quantity(&self) -> Option<&Quantity> {
        self.value().and_then(SystemValue::as_quantity)
    }

    /// Immediate children in declaration order
    pub fn children(&self) -> &[Node] {
        self.inner.children.get_or_init(|| match &self.inner.source {
            Some(source) => source
                .children()
                .into_iter()
                .map(|(name, child)| Self::build(Some(name), child, Arc::downgrade(&self.inner)))
                .collect(),
            None => Vec::new(),
        })
    }

    /// Children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children()
            .iter()
            .filter(move |child| child.name() == Some(name))
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.upgrade().map(|inner| Node { inner })
    }

    /// All descendants, depth first
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack: Vec<&Node> = self.children().iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.clone());
            stack.extend(node.children().iter().rev());
        }
        out
    }

    /// Same underlying node, not just structurally equal
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether ordering comparisons with `other` are defined
    pub fn is_comparable_to(&self, other: &Node) -> bool {
        matches!(self.compare_to(other), Ok(Some(_)))
    }

    /// Ordering between the values of two nodes
    ///
    /// Errors when either node has no value or the value types are
    /// incompatible; `Ok(None)` when the values cannot be ordered.
    pub fn compare_to(&self, other: &Node) -> ValueResult<Option<Ordering>> {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a.compare(b),
            _ => Err(ValueError::incomparable(
                self.inner.ty.to_string(),
                other.inner.ty.to_string(),
            )),
        }
    }
}

/// Build a System quantity from a FHIR `Quantity`-derived element
fn quantity_value(ty: &FhirPathType, source: &dyn Visitable) -> Option<Quantity> {
    let registry = fhir_r4_type_registry();
    if ty.is_system() || !registry.is_assignable_from(&FhirPathType::fhir("Quantity"), ty) {
        return None;
    }
    let mut value: Option<Decimal> = None;
    let mut code = None;
    let mut unit = None;
    for (name, child) in source.children() {
        match (name.as_str(), child.value()) {
            ("value", Some(SystemValue::Decimal(d))) => value = Some(d),
            ("value", Some(SystemValue::Integer(i))) => value = Some(Decimal::from(i)),
            ("code", Some(SystemValue::String(s))) => code = Some(s),
            ("unit", Some(SystemValue::String(s))) => unit = Some(s),
            _ => {}
        }
    }
    let unit = code.or(unit).unwrap_or_default();
    value.map(|value| Quantity::new(value, unit))
}

impl PartialEq for Node {
    /// Structural equality: values compare as values, elements by type and children
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a.equals(b) == Some(true),
            (None, None) => {
                self.inner.ty == other.inner.ty
                    && self.children().len() == other.children().len()
                    && self
                        .children()
                        .iter()
                        .zip(other.children())
                        .all(|(a, b)| a.name() == b.name() && a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.inner.name)
            .field("type", &self.inner.ty.to_string())
            .field("value", &self.inner.value)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "{}", self.inner.ty),
        }
    }
}

impl From<SystemValue> for Node {
    fn from(value: SystemValue) -> Self {
        Self::from_value(value)
    }
}
