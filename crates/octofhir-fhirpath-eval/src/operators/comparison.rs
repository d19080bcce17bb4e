//! Comparison Operators for FHIRPath
//!
//! Implements: =, !=, ~, !~, <, <=, >, >=

use crate::error::{EvalError, EvalResult};
use crate::evaluator::FhirPathEvaluator;
use octofhir_fhirpath_ast::BinaryOp;
use octofhir_fhirpath_model::{Collection, Node};
use std::cmp::Ordering;

/// Equality of two nodes; `None` when unknown (differing temporal precision)
fn node_equals(left: &Node, right: &Node) -> Option<bool> {
    match (left.value(), right.value()) {
        (Some(a), Some(b)) => a.equals(b),
        _ => Some(left == right),
    }
}

fn node_equivalent(left: &Node, right: &Node) -> bool {
    match (left.value(), right.value()) {
        (Some(a), Some(b)) => a.equivalent(b),
        (None, None) => {
            left.node_type() == right.node_type()
                && left.children().len() == right.children().len()
                && left
                    .children()
                    .iter()
                    .zip(right.children())
                    .all(|(a, b)| a.name() == b.name() && node_equivalent(a, b))
        }
        _ => false,
    }
}

/// `=` over collections
///
/// Empty if either side is empty; false for differing sizes; otherwise
/// pairwise in order, empty if any pair is unknown.
pub(crate) fn equals(left: &Collection, right: &Collection) -> Option<bool> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    if left.len() != right.len() {
        return Some(false);
    }
    let mut unknown = false;
    for (l, r) in left.iter().zip(right.iter()) {
        match node_equals(l, r) {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown { None } else { Some(true) }
}

/// `~` over collections: never empty, order-independent
pub(crate) fn equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut unmatched: Vec<&Node> = right.iter().collect();
    for l in left.iter() {
        match unmatched.iter().position(|r| node_equivalent(l, r)) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => return false,
        }
    }
    true
}

impl FhirPathEvaluator {
    /// Evaluate `=`, `!=`, `~` and `!~`
    pub(crate) fn eval_equality(op: BinaryOp, left: &Collection, right: &Collection) -> Collection {
        let result = match op {
            BinaryOp::Equal => equals(left, right),
            BinaryOp::NotEqual => equals(left, right).map(|b| !b),
            BinaryOp::Equivalent => Some(equivalent(left, right)),
            _ => Some(!equivalent(left, right)),
        };
        result.map(Collection::boolean).unwrap_or_default()
    }

    /// Evaluate `<`, `<=`, `>` and `>=`
    ///
    /// Both sides must be singletons carrying a value, else the result is
    /// empty. Values of incompatible types are an error; values that cannot
    /// be ordered (differing precision) give empty.
    pub(crate) fn eval_inequality(
        op: BinaryOp,
        left: &Collection,
        right: &Collection,
    ) -> EvalResult<Collection> {
        let (Some(l), Some(r)) = (left.singleton_node(), right.singleton_node()) else {
            return Ok(Collection::empty());
        };
        let ordering = match (l.value(), r.value()) {
            (Some(a), Some(b)) if a.is_compatible_with(b) => a.compare(b)?,
            (Some(a), Some(b)) => {
                return Err(EvalError::incompatible_types(a.type_name(), b.type_name()));
            }
            _ => return Ok(Collection::empty()),
        };
        let Some(ordering) = ordering else {
            return Ok(Collection::empty());
        };
        let result = match op {
            BinaryOp::Less => ordering == Ordering::Less,
            BinaryOp::LessOrEqual => ordering != Ordering::Greater,
            BinaryOp::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        Ok(Collection::boolean(result))
    }
}
