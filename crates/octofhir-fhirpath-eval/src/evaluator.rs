//! FHIRPath Evaluation Engine
//!
//! [`FhirPathEvaluator`] walks a compiled expression tree against a
//! collection of nodes. Each top-level call gets its own
//! [`EvaluationFrame`], so one evaluator can serve many threads.

use crate::cache::EvaluatorCaches;
use crate::config::EvaluatorConfig;
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult, FhirPathError};
use crate::registry::FunctionRegistry;
use octofhir_fhirpath_ast::{
    BinaryOp, Expression, FunctionCall, Identifier, Invocation, Literal, LiteralKind,
    OperatorCategory, PolarityOp, TypeOp,
};
use octofhir_fhirpath_model::{Collection, FhirPathTree, Node, fhir_r4_type_registry};
use octofhir_fhirpath_types::{
    FhirPathDate, FhirPathDateTime, FhirPathTime, FhirPathType, Quantity, SystemValue,
    TypeRegistry, arithmetic,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

static STANDARD_REGISTRY: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::standard()));

/// Per-call evaluation state: the context stack and nesting depth
#[derive(Debug)]
pub struct EvaluationFrame {
    stack: Vec<FrameEntry>,
    depth: usize,
}

#[derive(Debug)]
struct FrameEntry {
    context: Collection,
    /// Position of `context` in the collection being iterated, if any
    index: Option<usize>,
}

impl EvaluationFrame {
    /// Frame whose stack holds exactly `initial`
    pub fn new(initial: Collection) -> Self {
        Self {
            stack: vec![FrameEntry {
                context: initial,
                index: None,
            }],
            depth: 0,
        }
    }

    /// Top of the context stack (`$this`)
    pub fn current(&self) -> Collection {
        self.stack
            .last()
            .map(|entry| entry.context.clone())
            .unwrap_or_default()
    }

    /// Innermost iteration index (`$index`)
    pub fn index(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|entry| entry.index)
    }

    pub fn push(&mut self, context: Collection, index: Option<usize>) {
        self.stack.push(FrameEntry { context, index });
    }

    pub fn pop(&mut self) -> Option<Collection> {
        self.stack.pop().map(|entry| entry.context)
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    fn enter(&mut self, limit: usize) -> EvalResult<()> {
        if self.depth >= limit {
            return Err(EvalError::RecursionLimit { limit });
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// The FHIRPath evaluation engine
///
/// Holds only immutable state: the function registry, the shared caches
/// and the type registry.
pub struct FhirPathEvaluator {
    registry: Arc<FunctionRegistry>,
    caches: Arc<EvaluatorCaches>,
    config: EvaluatorConfig,
    types: &'static TypeRegistry,
}

impl Default for FhirPathEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl FhirPathEvaluator {
    /// Evaluator with the standard library and the process-wide caches
    pub fn new() -> Self {
        Self {
            registry: Arc::clone(&STANDARD_REGISTRY),
            caches: EvaluatorCaches::shared(),
            config: EvaluatorConfig::default(),
            types: fhir_r4_type_registry(),
        }
    }

    /// Evaluator with its own caches sized by `config`
    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self {
            caches: Arc::new(EvaluatorCaches::new(&config.cache)),
            config,
            ..Self::new()
        }
    }

    /// Replace the function registry
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Share caches with other evaluators
    pub fn with_caches(mut self, caches: Arc<EvaluatorCaches>) -> Self {
        self.caches = caches;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn caches(&self) -> &Arc<EvaluatorCaches> {
        &self.caches
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn types(&self) -> &'static TypeRegistry {
        self.types
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Compiled tree for `expression`, from the cache when possible
    pub fn compile(&self, expression: &str) -> Result<Arc<Expression>, FhirPathError> {
        self.caches
            .expressions
            .compile(expression)
            .map_err(|e| FhirPathError::new(expression, e))
    }

    /// Evaluate without any input
    pub fn evaluate(&self, expression: &str) -> Result<Collection, FhirPathError> {
        let mut ctx = EvaluationContext::new();
        self.evaluate_collection(&mut ctx, expression, Collection::empty())
    }

    /// Evaluate against a JSON resource or element
    pub fn evaluate_json(
        &self,
        expression: &str,
        json: &serde_json::Value,
    ) -> Result<Collection, FhirPathError> {
        let tree = FhirPathTree::from_json(json.clone())
            .map_err(|e| FhirPathError::new(expression, e))?;
        let root = tree.root().clone();
        let mut ctx = EvaluationContext::from_tree(tree);
        self.evaluate_collection(&mut ctx, expression, Collection::singleton(root))
    }

    /// Evaluate against a single node
    pub fn evaluate_node(&self, expression: &str, node: Node) -> Result<Collection, FhirPathError> {
        let mut ctx = EvaluationContext::new();
        self.evaluate_collection(&mut ctx, expression, Collection::singleton(node))
    }

    /// Evaluate against the root of the context's tree (or nothing)
    pub fn evaluate_with_context(
        &self,
        ctx: &mut EvaluationContext,
        expression: &str,
    ) -> Result<Collection, FhirPathError> {
        let initial = ctx
            .root()
            .cloned()
            .map(Collection::singleton)
            .unwrap_or_default();
        self.evaluate_collection(ctx, expression, initial)
    }

    /// Evaluate against an explicit initial collection
    ///
    /// `%context` is bound to `initial` for the duration of the call and
    /// afterwards.
    pub fn evaluate_collection(
        &self,
        ctx: &mut EvaluationContext,
        expression: &str,
        initial: Collection,
    ) -> Result<Collection, FhirPathError> {
        let compiled = self.compile(expression)?;
        ctx.set_external_constant("context", initial.clone());
        let mut frame = EvaluationFrame::new(initial);
        log::debug!("Evaluating {}", expression);
        self.eval(&compiled, &mut frame, ctx)
            .map_err(|e| FhirPathError::new(expression, e))
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Evaluate a sub-expression against the top of the frame's stack
    pub fn eval(
        &self,
        expr: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        frame.enter(self.config.max_depth)?;
        log::trace!(
            "{:indent$}{}: {}",
            "",
            expr.kind_name(),
            expr,
            indent = frame.depth * 2
        );

        let result = match expr {
            // === Terms ===
            Expression::Literal(literal) => self.eval_literal(literal),
            Expression::ExternalConstant(name) => Ok(ctx.external_constant(name)),
            Expression::Invocation(invocation) => self.eval_term(invocation, frame, ctx),

            // === Navigation ===
            Expression::Path { target, invocation } => {
                let input = self.eval(target, frame, ctx)?;
                self.eval_invocation(input, invocation, frame, ctx)
            }
            Expression::Indexer { collection, index } => {
                self.eval_indexer(collection, index, frame, ctx)
            }

            // === Operators ===
            Expression::Polarity { op, operand } => self.eval_polarity(*op, operand, frame, ctx),
            Expression::Binary { left, op, right } => {
                self.eval_binary(left, *op, right, frame, ctx)
            }
            Expression::Type {
                operand,
                op,
                type_specifier,
            } => {
                let input = self.eval(operand, frame, ctx)?;
                let type_name = type_specifier.unquoted();
                match op {
                    TypeOp::Is => self.is_type(&input, &type_name),
                    TypeOp::As => self.as_type(&input, &type_name),
                }
            }
        };

        frame.exit();
        result
    }

    fn eval_binary(
        &self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        // Logical operators decide themselves whether the right side runs
        match op.category() {
            OperatorCategory::Implies => return self.eval_implies(left, right, frame, ctx),
            OperatorCategory::OrXor if op == BinaryOp::Or => {
                return self.eval_or(left, right, frame, ctx);
            }
            OperatorCategory::OrXor => return self.eval_xor(left, right, frame, ctx),
            OperatorCategory::And => return self.eval_and(left, right, frame, ctx),
            _ => {}
        }

        let lhs = self.eval(left, frame, ctx)?;
        let rhs = self.eval(right, frame, ctx)?;
        match op.category() {
            OperatorCategory::Membership => self.eval_membership(op, &lhs, &rhs, ctx),
            OperatorCategory::Equality => Ok(Self::eval_equality(op, &lhs, &rhs)),
            OperatorCategory::Inequality => Self::eval_inequality(op, &lhs, &rhs),
            OperatorCategory::Union => Ok(lhs.union(&rhs)),
            OperatorCategory::Additive => Self::eval_additive(op, &lhs, &rhs),
            OperatorCategory::Multiplicative => Self::eval_multiplicative(op, &lhs, &rhs),
            OperatorCategory::Implies | OperatorCategory::OrXor | OperatorCategory::And => {
                Ok(Collection::empty())
            }
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn eval_literal(&self, literal: &Literal) -> EvalResult<Collection> {
        self.caches
            .literals
            .get_or_try_insert_with(literal.text.as_str(), || literal_value(literal))
    }

    // =========================================================================
    // Invocations
    // =========================================================================

    /// Invocation in term position, against the current context
    fn eval_term(
        &self,
        invocation: &Invocation,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        match invocation {
            Invocation::Member(identifier) => Ok(self.navigate(&frame.current(), identifier)),
            Invocation::Function(call) => self.eval_function(call, frame, ctx),
            Invocation::This => Ok(frame.current()),
            Invocation::Index => Ok(index_value(frame.index())),
            Invocation::Total => Ok(Collection::empty()),
        }
    }

    /// Invocation applied to the result of a target expression
    fn eval_invocation(
        &self,
        input: Collection,
        invocation: &Invocation,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        match invocation {
            Invocation::Member(identifier) => Ok(self.navigate(&input, identifier)),
            Invocation::Function(call) => {
                frame.push(input, None);
                let result = self.eval_function(call, frame, ctx);
                frame.pop();
                result
            }
            Invocation::This => Ok(input),
            Invocation::Index => Ok(index_value(frame.index())),
            Invocation::Total => Ok(Collection::empty()),
        }
    }

    fn identifier(&self, identifier: &Identifier) -> Arc<str> {
        self.caches
            .identifiers
            .get_or_insert_with(identifier.text.as_str(), || Arc::from(identifier.unquoted()))
    }

    /// Child navigation by name
    ///
    /// A single element whose type (or an ancestor type) is named `name`
    /// navigates to itself, so `Patient.name` works from a Patient root.
    fn navigate(&self, input: &Collection, identifier: &Identifier) -> Collection {
        let name = self.identifier(identifier);
        if let Some(node) = input.singleton_node() {
            let ty = node.node_type();
            if !ty.is_system() && self.types.closure_contains(ty, &name) {
                return input.clone();
            }
        }
        input
            .iter()
            .flat_map(|node| node.children_named(&name).cloned().collect::<Vec<_>>())
            .collect()
    }

    fn eval_indexer(
        &self,
        collection: &Expression,
        index: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let items = self.eval(collection, frame, ctx)?;
        let index = self.eval(index, frame, ctx)?;
        let position = match index.len() {
            0 => return Ok(Collection::empty()),
            1 => match index.singleton_value() {
                Some(SystemValue::Integer(i)) => *i,
                _ => {
                    return Err(EvalError::invalid_argument(
                        "[]",
                        "index must be an Integer",
                    ));
                }
            },
            n => return Err(EvalError::singleton_expected(n)),
        };
        Ok(usize::try_from(position)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .map(Collection::singleton)
            .unwrap_or_default())
    }

    fn eval_polarity(
        &self,
        op: PolarityOp,
        operand: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let operand = self.eval(operand, frame, ctx)?;
        let Some(value) = operand.singleton_value() else {
            return Ok(Collection::empty());
        };
        if !value.is_numeric() && value.as_quantity().is_none() {
            return Ok(Collection::empty());
        }
        let result = match op {
            PolarityOp::Plus => Some(value.clone()),
            PolarityOp::Minus => arithmetic::negate(value)?,
        };
        Ok(result.map(Collection::from_value).unwrap_or_default())
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Call a function with the invocation target on top of the stack
    fn eval_function(
        &self,
        call: &FunctionCall,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let name = self.identifier(&call.name);
        let input = frame.current();
        let args = &call.args;

        match &*name {
            "all" => {
                check_arity(&name, args, 1, 1)?;
                self.eval_all(&input, &args[0], frame, ctx)
            }
            "exists" => {
                check_arity(&name, args, 0, 1)?;
                match args.first() {
                    Some(criteria) => {
                        let matched = self.eval_where(&input, criteria, frame, ctx)?;
                        Ok(Collection::boolean(!matched.is_empty()))
                    }
                    None => Ok(Collection::boolean(!input.is_empty())),
                }
            }
            "iif" => {
                check_arity(&name, args, 2, 3)?;
                self.eval_iif(args, frame, ctx)
            }
            "is" => {
                check_arity(&name, args, 1, 1)?;
                self.is_type(&input, &type_argument(&name, &args[0])?)
            }
            "as" => {
                check_arity(&name, args, 1, 1)?;
                self.as_type(&input, &type_argument(&name, &args[0])?)
            }
            "ofType" => {
                check_arity(&name, args, 1, 1)?;
                self.as_type(&input, &type_argument(&name, &args[0])?)
            }
            "select" => {
                check_arity(&name, args, 1, 1)?;
                self.eval_select(&input, &args[0], frame, ctx)
            }
            "where" => {
                check_arity(&name, args, 1, 1)?;
                self.eval_where(&input, &args[0], frame, ctx)
            }
            "repeat" => {
                check_arity(&name, args, 1, 1)?;
                self.eval_repeat(&input, &args[0], frame, ctx)
            }
            "trace" => {
                check_arity(&name, args, 1, 2)?;
                self.eval_trace(&input, args, frame, ctx)
            }
            _ => self.eval_registered(&name, &input, args, frame, ctx),
        }
    }

    fn eval_registered(
        &self,
        name: &str,
        input: &Collection,
        args: &[Expression],
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let function = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::unknown_function(name))?;
        function.check_arity(args.len())?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg, frame, ctx))
            .collect::<EvalResult<Vec<_>>>()?;
        function.apply(ctx, input, &args)
    }

    /// Evaluate `expr` once per element, with the element as `$this`
    fn for_each_item(
        &self,
        input: &Collection,
        expr: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
        mut visit: impl FnMut(&Node, Collection) -> bool,
    ) -> EvalResult<()> {
        for (index, node) in input.iter().enumerate() {
            frame.push(Collection::singleton(node.clone()), Some(index));
            let result = self.eval(expr, frame, ctx);
            frame.pop();
            if !visit(node, result?) {
                break;
            }
        }
        Ok(())
    }

    fn eval_all(
        &self,
        input: &Collection,
        criteria: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let mut all = true;
        self.for_each_item(input, criteria, frame, ctx, |_, result| {
            all = !result.is_false();
            all
        })?;
        Ok(Collection::boolean(all))
    }

    fn eval_where(
        &self,
        input: &Collection,
        criteria: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let mut out = Collection::empty();
        self.for_each_item(input, criteria, frame, ctx, |node, result| {
            if result.is_true() {
                out.push(node.clone());
            }
            true
        })?;
        Ok(out)
    }

    fn eval_select(
        &self,
        input: &Collection,
        projection: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let mut out = Collection::empty();
        self.for_each_item(input, projection, frame, ctx, |_, result| {
            out.extend(result);
            true
        })?;
        Ok(out)
    }

    /// Transitive projection; each new node is projected again until nothing new appears
    fn eval_repeat(
        &self,
        input: &Collection,
        projection: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let mut out = Collection::empty();
        let mut pending = input.clone();
        while !pending.is_empty() {
            let mut next = Collection::empty();
            self.for_each_item(&pending, projection, frame, ctx, |_, result| {
                for node in result {
                    if !out.contains(&node) {
                        out.push(node.clone());
                        next.push(node);
                    }
                }
                true
            })?;
            pending = next;
        }
        Ok(out)
    }

    fn eval_iif(
        &self,
        args: &[Expression],
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let criterion = self.eval(&args[0], frame, ctx)?;
        if !criterion.is_empty() && criterion.as_boolean().is_none() {
            return Err(EvalError::invalid_argument(
                "iif",
                "criterion must be a Boolean",
            ));
        }
        if criterion.is_true() {
            self.eval(&args[1], frame, ctx)
        } else {
            match args.get(2) {
                Some(otherwise) => self.eval(otherwise, frame, ctx),
                None => Ok(Collection::empty()),
            }
        }
    }

    /// Log the input (or a projection of it) and return the input unchanged
    fn eval_trace(
        &self,
        input: &Collection,
        args: &[Expression],
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let label = self.eval(&args[0], frame, ctx)?;
        let label = label
            .singleton_value()
            .map(ToString::to_string)
            .unwrap_or_default();
        match args.get(1) {
            Some(projection) => {
                let projected = self.eval_select(input, projection, frame, ctx)?;
                log::debug!("{}: {}", label, projected);
            }
            None => log::debug!("{}: {}", label, input),
        }
        Ok(input.clone())
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Resolve a type name for a node
    ///
    /// Synthetic System values look in the System namespace first, so
    /// `5 'mg' is Quantity` means `System.Quantity`.
    fn resolve_type_for(&self, name: &str, node: &Node) -> Option<FhirPathType> {
        if !name.contains('.') && node.node_type().is_system() {
            let system = FhirPathType::system(name);
            if self.types.contains(&system) {
                return Some(system);
            }
        }
        self.types.resolve(name)
    }

    /// Whether `node` is of type `target` or a subtype
    ///
    /// For System targets the type of the node's value is used, so a FHIR
    /// `string` element is also a `System.String`.
    fn conforms_to(&self, node: &Node, target: &FhirPathType) -> bool {
        let ty = match (target.is_system(), node.value()) {
            (true, Some(value)) => value.system_type(),
            _ => node.node_type().clone(),
        };
        self.types.is_assignable_from(target, &ty)
    }

    /// `is`: false for empty input and unknown types; more than one item is an error
    fn is_type(&self, input: &Collection, type_name: &str) -> EvalResult<Collection> {
        let node = match input.len() {
            0 => return Ok(Collection::boolean(false)),
            1 => input.first(),
            n => return Err(EvalError::singleton_expected(n)),
        };
        let conforms = node
            .and_then(|node| {
                self.resolve_type_for(type_name, node)
                    .map(|target| self.conforms_to(node, &target))
            })
            .unwrap_or(false);
        Ok(Collection::boolean(conforms))
    }

    /// `as` / `ofType`: the items of the given type; unknown types are an error
    fn as_type(&self, input: &Collection, type_name: &str) -> EvalResult<Collection> {
        if self.types.resolve(type_name).is_none() {
            return Err(EvalError::unknown_type(type_name));
        }
        Ok(input
            .iter()
            .filter(|node| {
                self.resolve_type_for(type_name, node)
                    .is_some_and(|target| self.conforms_to(node, &target))
            })
            .cloned()
            .collect())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn check_arity(name: &str, args: &[Expression], min: usize, max: usize) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::invalid_arity(name, args.len(), min, max));
    }
    Ok(())
}

fn index_value(index: Option<usize>) -> Collection {
    index
        .and_then(|i| i32::try_from(i).ok())
        .map(Collection::from_value)
        .unwrap_or_default()
}

/// Type name written as a function argument: `Patient`, `FHIR.Patient`, `` `System`.String ``
fn type_argument(function: &str, arg: &Expression) -> EvalResult<String> {
    match arg {
        Expression::Invocation(Invocation::Member(id)) => Ok(id.unquoted().to_string()),
        Expression::Path {
            target,
            invocation: Invocation::Member(id),
        } => Ok(format!(
            "{}.{}",
            type_argument(function, target)?,
            id.unquoted()
        )),
        other => Err(EvalError::invalid_argument(
            function,
            format!("'{}' is not a type specifier", other),
        )),
    }
}

/// Value of a literal
fn literal_value(literal: &Literal) -> EvalResult<Collection> {
    let invalid = || EvalError::invalid_literal(&literal.text);
    let value = match &literal.kind {
        LiteralKind::Null => return Ok(Collection::empty()),
        LiteralKind::Boolean(b) => SystemValue::Boolean(*b),
        LiteralKind::String(s) => SystemValue::String(s.clone()),
        LiteralKind::Number(digits) => SystemValue::parse_number(digits).ok_or_else(invalid)?,
        LiteralKind::Date(text) => {
            SystemValue::Date(FhirPathDate::parse(text).ok_or_else(invalid)?)
        }
        LiteralKind::DateTime(text) => {
            SystemValue::DateTime(FhirPathDateTime::parse(text).ok_or_else(invalid)?)
        }
        LiteralKind::Time(text) => {
            SystemValue::Time(FhirPathTime::parse(text).ok_or_else(invalid)?)
        }
        LiteralKind::Quantity { number, unit } => {
            let value = Decimal::from_str(number).map_err(|_| invalid())?;
            SystemValue::Quantity(Quantity::new(value, unit.as_str()))
        }
    };
    Ok(Collection::from_value(value))
}
