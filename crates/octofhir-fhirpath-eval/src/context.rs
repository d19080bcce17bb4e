//! Evaluation context for FHIRPath execution
//!
//! One context per top-level evaluation: the tree being evaluated, the
//! external constant table, an optional constraint under evaluation and
//! the issues collected along the way.

use crate::terminology::TerminologyService;
use octofhir_fhirpath_diagnostics::Diagnostic;
use octofhir_fhirpath_model::{Collection, FhirPathTree, ModelResult, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const UCUM_URL: &str = "http://unitsofmeasure.org";
const LOINC_URL: &str = "http://loinc.org";
const SNOMED_URL: &str = "http://snomed.info/sct";
const EXTENSION_PREFIX: &str = "ext-";
const EXTENSION_BASE_URL: &str = "http://hl7.org/fhir/StructureDefinition/";
const VALUE_SET_PREFIX: &str = "vs-";
const VALUE_SET_BASE_URL: &str = "http://hl7.org/fhir/ValueSet/";

/// Severity declared by a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintLevel {
    Rule,
    Warning,
    Info,
}

/// The rule a caller is validating, visible to functions for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub level: ConstraintLevel,
    /// Path of the element the rule applies to
    pub location: String,
    pub description: String,
    pub expression: String,
    /// Canonical URL of the defining profile
    pub source: Option<String>,
}

impl Constraint {
    pub fn new(
        id: impl Into<String>,
        level: ConstraintLevel,
        location: impl Into<String>,
        description: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            location: location.into(),
            description: description.into(),
            expression: expression.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// State for one top-level evaluation
#[derive(Default)]
pub struct EvaluationContext {
    tree: Option<FhirPathTree>,
    constants: HashMap<String, Collection>,
    constraint: Option<Constraint>,
    issues: Vec<Diagnostic>,
    terminology: Option<Arc<dyn TerminologyService>>,
}

impl EvaluationContext {
    /// Context without a tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Context over a tree; `%resource` and `%rootResource` refer to its root
    pub fn from_tree(tree: FhirPathTree) -> Self {
        let mut ctx = Self::new();
        ctx.set_external_constant("resource", tree.root().clone());
        ctx.set_external_constant("rootResource", tree.root().clone());
        ctx.tree = Some(tree);
        ctx
    }

    /// Context over a JSON resource or element
    pub fn from_json(json: serde_json::Value) -> ModelResult<Self> {
        FhirPathTree::from_json(json).map(Self::from_tree)
    }

    pub fn tree(&self) -> Option<&FhirPathTree> {
        self.tree.as_ref()
    }

    /// Root node of the tree, if any
    pub fn root(&self) -> Option<&Node> {
        self.tree.as_ref().map(FhirPathTree::root)
    }

    // =========================================================================
    // External constants
    // =========================================================================

    /// Bind `%name` to a node or collection, replacing any previous binding
    pub fn set_external_constant(&mut self, name: impl Into<String>, value: impl Into<Collection>) {
        self.constants.insert(name.into(), value.into());
    }

    pub fn unset_external_constant(&mut self, name: &str) -> Option<Collection> {
        self.constants.remove(name)
    }

    pub fn has_external_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Resolve `%name`
    ///
    /// Reserved names come first (`ucum`, `loinc`, `sct`), then the `ext-` and
    /// `vs-` prefixes, then the caller's bindings. Unknown names are empty.
    pub fn external_constant(&self, name: &str) -> Collection {
        match name {
            "ucum" => return Collection::from_value(UCUM_URL),
            "loinc" => return Collection::from_value(LOINC_URL),
            "sct" => return Collection::from_value(SNOMED_URL),
            _ => {}
        }
        if let Some(id) = name.strip_prefix(EXTENSION_PREFIX) {
            return Collection::from_value(format!("{}{}", EXTENSION_BASE_URL, id));
        }
        if let Some(id) = name.strip_prefix(VALUE_SET_PREFIX) {
            return Collection::from_value(format!("{}{}", VALUE_SET_BASE_URL, id));
        }
        self.constants.get(name).cloned().unwrap_or_default()
    }

    // =========================================================================
    // Constraint
    // =========================================================================

    pub fn set_constraint(&mut self, constraint: Constraint) {
        self.constraint = Some(constraint);
    }

    pub fn unset_constraint(&mut self) -> Option<Constraint> {
        self.constraint.take()
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }

    // =========================================================================
    // Issues
    // =========================================================================

    pub fn issues(&self) -> &[Diagnostic] {
        &self.issues
    }

    /// Record a non-fatal issue, tagged with the active constraint id
    pub fn add_issue(&mut self, issue: Diagnostic) {
        let issue = match (&self.constraint, &issue.constraint) {
            (Some(constraint), None) => issue.with_constraint(constraint.id.clone()),
            _ => issue,
        };
        self.issues.push(issue);
    }

    pub fn clear_issues(&mut self) {
        self.issues.clear();
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    // =========================================================================
    // Terminology
    // =========================================================================

    pub fn set_terminology(&mut self, service: Arc<dyn TerminologyService>) {
        self.terminology = Some(service);
    }

    pub fn terminology(&self) -> Option<&Arc<dyn TerminologyService>> {
        self.terminology.as_ref()
    }
}

/// Builder for [`EvaluationContext`]
#[derive(Default)]
pub struct EvaluationContextBuilder {
    tree: Option<FhirPathTree>,
    constants: Vec<(String, Collection)>,
    constraint: Option<Constraint>,
    terminology: Option<Arc<dyn TerminologyService>>,
}

impl EvaluationContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(mut self, tree: FhirPathTree) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Collection>) -> Self {
        self.constants.push((name.into(), value.into()));
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn terminology(mut self, service: Arc<dyn TerminologyService>) -> Self {
        self.terminology = Some(service);
        self
    }

    /// Build the context; explicit constants override the tree presets
    pub fn build(self) -> EvaluationContext {
        let mut ctx = match self.tree {
            Some(tree) => EvaluationContext::from_tree(tree),
            None => EvaluationContext::new(),
        };
        for (name, value) in self.constants {
            ctx.set_external_constant(name, value);
        }
        ctx.constraint = self.constraint;
        ctx.terminology = self.terminology;
        ctx
    }
}
