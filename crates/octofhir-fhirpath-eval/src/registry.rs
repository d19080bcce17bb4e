//! Function registry for the FHIRPath evaluation engine
//!
//! Maps function names to implementations. The interpreter evaluates a small
//! set of functions inline (those that need the context stack) and looks
//! everything else up here.

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use octofhir_fhirpath_model::Collection;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type alias for closure-based function implementations
pub type FunctionImpl = Arc<
    dyn Fn(&mut EvaluationContext, &Collection, &[Collection]) -> EvalResult<Collection>
        + Send
        + Sync,
>;

/// A named function callable from expressions
///
/// Arguments arrive already evaluated against the invocation target.
pub trait FhirPathFunction: Send + Sync {
    fn name(&self) -> &str;

    fn min_arity(&self) -> usize;

    /// `usize::MAX` for variadic functions
    fn max_arity(&self) -> usize;

    fn apply(
        &self,
        ctx: &mut EvaluationContext,
        input: &Collection,
        args: &[Collection],
    ) -> EvalResult<Collection>;

    /// Check the argument count against the declared arity
    fn check_arity(&self, actual: usize) -> EvalResult<()> {
        if actual < self.min_arity() || actual > self.max_arity() {
            return Err(EvalError::invalid_arity(
                self.name(),
                actual,
                self.min_arity(),
                self.max_arity(),
            ));
        }
        Ok(())
    }
}

/// A [`FhirPathFunction`] backed by a closure
pub struct FnFunction {
    name: String,
    min_arity: usize,
    max_arity: usize,
    implementation: FunctionImpl,
}

impl FnFunction {
    pub fn new(
        name: impl Into<String>,
        min_arity: usize,
        max_arity: usize,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name: name.into(),
            min_arity,
            max_arity,
            implementation,
        }
    }
}

impl FhirPathFunction for FnFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_arity(&self) -> usize {
        self.min_arity
    }

    fn max_arity(&self) -> usize {
        self.max_arity
    }

    fn apply(
        &self,
        ctx: &mut EvaluationContext,
        input: &Collection,
        args: &[Collection],
    ) -> EvalResult<Collection> {
        (self.implementation)(ctx, input, args)
    }
}

/// Immutable name to function lookup table
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn FhirPathFunction>>,
}

impl FunctionRegistry {
    /// Registry with no functions
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the standard function library
    pub fn standard() -> Self {
        FunctionRegistryBuilder::new().with_standard_library().build()
    }

    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FhirPathFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Collects functions before freezing them into a [`FunctionRegistry`]
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    functions: HashMap<String, Arc<dyn FhirPathFunction>>,
}

impl FunctionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; a later registration under the same name wins
    pub fn register(mut self, function: Arc<dyn FhirPathFunction>) -> Self {
        self.functions.insert(function.name().to_string(), function);
        self
    }

    /// Register a closure
    pub fn function<F>(self, name: &str, min_arity: usize, max_arity: usize, f: F) -> Self
    where
        F: Fn(&mut EvaluationContext, &Collection, &[Collection]) -> EvalResult<Collection>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnFunction::new(
            name,
            min_arity,
            max_arity,
            Arc::new(f),
        )))
    }

    /// Add every function of the standard library
    pub fn with_standard_library(self) -> Self {
        crate::functions::register_standard_library(self)
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}
