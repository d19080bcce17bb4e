//! Arithmetic Operators for FHIRPath
//!
//! Implements: +, -, &, *, /, div, mod
//! Operands must be empty or singletons. Numeric failures (overflow,
//! division by zero) give empty; undefined operand types are an error.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::FhirPathEvaluator;
use octofhir_fhirpath_ast::BinaryOp;
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_types::{SystemValue, ValueResult, arithmetic};

type ArithmeticFn = fn(&SystemValue, &SystemValue) -> ValueResult<Option<SystemValue>>;

/// Value of an operand that must be empty or a singleton value
fn operand(collection: &Collection) -> EvalResult<Option<&SystemValue>> {
    match collection.len() {
        0 => Ok(None),
        1 => match collection.first() {
            Some(node) => match node.value() {
                Some(value) => Ok(Some(value)),
                None => Err(EvalError::IncompatibleOperands {
                    message: format!("Type: '{}' has no value", node.node_type()),
                }),
            },
            None => Ok(None),
        },
        n => Err(EvalError::singleton_expected(n)),
    }
}

fn apply(f: ArithmeticFn, left: &SystemValue, right: &SystemValue) -> EvalResult<Collection> {
    Ok(f(left, right)?.map(Collection::from_value).unwrap_or_default())
}

impl FhirPathEvaluator {
    /// Evaluate `+`, `-` and `&`
    ///
    /// `&` treats an empty side as the empty string when the other side is a
    /// string; every other combination with an empty side gives empty.
    pub(crate) fn eval_additive(
        op: BinaryOp,
        left: &Collection,
        right: &Collection,
    ) -> EvalResult<Collection> {
        let (l, r) = (operand(left)?, operand(right)?);
        if op == BinaryOp::Concatenate {
            return match (l, r) {
                (None, None) => Ok(Collection::from_value("")),
                (Some(SystemValue::String(a)), None) | (None, Some(SystemValue::String(a))) => {
                    Ok(Collection::from_value(a.clone()))
                }
                (Some(SystemValue::String(a)), Some(SystemValue::String(b))) => {
                    Ok(Collection::from_value(format!("{}{}", a, b)))
                }
                (Some(l), Some(r)) => {
                    Err(EvalError::incompatible_types(l.type_name(), r.type_name()))
                }
                _ => Ok(Collection::empty()),
            };
        }

        let (Some(l), Some(r)) = (l, r) else {
            return Ok(Collection::empty());
        };
        match op {
            BinaryOp::Add => apply(arithmetic::add, l, r),
            _ => apply(arithmetic::subtract, l, r),
        }
    }

    /// Evaluate `*`, `/`, `div` and `mod`
    pub(crate) fn eval_multiplicative(
        op: BinaryOp,
        left: &Collection,
        right: &Collection,
    ) -> EvalResult<Collection> {
        let (Some(l), Some(r)) = (operand(left)?, operand(right)?) else {
            return Ok(Collection::empty());
        };
        let f: ArithmeticFn = match op {
            BinaryOp::Multiply => arithmetic::multiply,
            BinaryOp::Divide => arithmetic::divide,
            BinaryOp::Div => arithmetic::truncated_divide,
            _ => arithmetic::modulo,
        };
        apply(f, l, r)
    }
}
