//! Type registry for the System and FHIR namespaces
//!
//! Every type has exactly one base type. `System.Any` is the universal root
//! and is its own base, which terminates every walk up the chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Language primitives (`System.Boolean`, `System.Quantity`, ...)
    System,
    /// Types defined by the data model (`FHIR.Patient`, `FHIR.string`, ...)
    Fhir,
}

impl Namespace {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Fhir => "FHIR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "System" => Some(Self::System),
            "FHIR" => Some(Self::Fhir),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespace-qualified type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FhirPathType {
    pub namespace: Namespace,
    pub name: Arc<str>,
}

impl FhirPathType {
    pub fn new(namespace: Namespace, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn system(name: &str) -> Self {
        Self::new(Namespace::System, name)
    }

    pub fn fhir(name: &str) -> Self {
        Self::new(Namespace::Fhir, name)
    }

    pub fn system_any() -> Self {
        Self::system("Any")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn is_system(&self) -> bool {
        self.namespace == Namespace::System
    }

    /// `System.Any` or `FHIR.Any`
    pub fn is_any(&self) -> bool {
        &*self.name == "Any"
    }
}

impl fmt::Display for FhirPathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Primitive types of the System namespace, all deriving from `System.Any`
pub const SYSTEM_TYPES: &[&str] = &[
    "Boolean", "Integer", "Decimal", "String", "Date", "DateTime", "Time", "Quantity",
];

/// Registry of known types and their base types
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    bases: HashMap<FhirPathType, FhirPathType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry holding the System namespace and `FHIR.Any`
    pub fn new() -> Self {
        let mut registry = Self {
            bases: HashMap::new(),
        };
        let any = FhirPathType::system_any();
        registry.bases.insert(any.clone(), any.clone());
        for name in SYSTEM_TYPES {
            registry.register(FhirPathType::system(name), any.clone());
        }
        registry.register(FhirPathType::fhir("Any"), any);
        registry
    }

    /// Register a type with its base; re-registering replaces the base
    pub fn register(&mut self, ty: FhirPathType, base: FhirPathType) {
        self.bases.insert(ty, base);
    }

    pub fn contains(&self, ty: &FhirPathType) -> bool {
        self.bases.contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Resolve a type name
    ///
    /// `System.X` and `FHIR.X` resolve in their namespace. An unqualified
    /// name is looked up in FHIR first, then System.
    pub fn resolve(&self, name: &str) -> Option<FhirPathType> {
        if let Some((ns, local)) = name.split_once('.') {
            let namespace = Namespace::parse(ns)?;
            let ty = FhirPathType::new(namespace, local);
            return self.contains(&ty).then_some(ty);
        }
        [Namespace::Fhir, Namespace::System]
            .into_iter()
            .map(|ns| FhirPathType::new(ns, name))
            .find(|ty| self.contains(ty))
    }

    /// Base type; the root is its own base and unknown types fall back to the root
    pub fn base_type(&self, ty: &FhirPathType) -> FhirPathType {
        self.bases
            .get(ty)
            .cloned()
            .unwrap_or_else(FhirPathType::system_any)
    }

    /// True when `candidate` is `target` or derives from it
    pub fn is_assignable_from(&self, target: &FhirPathType, candidate: &FhirPathType) -> bool {
        let mut current = candidate.clone();
        loop {
            if &current == target {
                return true;
            }
            let base = self.base_type(&current);
            if base == current {
                return false;
            }
            current = base;
        }
    }

    /// The type and its ancestors, stopping before the universal root
    pub fn closure(&self, ty: &FhirPathType) -> Vec<FhirPathType> {
        let mut out = Vec::new();
        let mut current = ty.clone();
        while !current.is_any() {
            out.push(current.clone());
            let base = self.base_type(&current);
            if base == current {
                break;
            }
            current = base;
        }
        out
    }

    /// True when `name` is the simple name of `ty` or of one of its ancestors
    pub fn closure_contains(&self, ty: &FhirPathType, name: &str) -> bool {
        self.closure(ty).iter().any(|t| t.name() == name)
    }
}
