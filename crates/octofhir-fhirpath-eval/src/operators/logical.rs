//! Logical Operators for FHIRPath
//!
//! Implements: and, or, xor, implies
//! All four use three-valued logic where the empty collection is "unknown".
//! An operand counts as a boolean only when it is a singleton Boolean.

use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::evaluator::{EvaluationFrame, FhirPathEvaluator};
use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_model::Collection;

fn truth(value: Option<bool>) -> Collection {
    value.map(Collection::boolean).unwrap_or_default()
}

impl FhirPathEvaluator {
    /// Evaluate `and`; the right side is skipped when the left is false
    ///
    /// Truth table:
    /// | A     | B     | A and B |
    /// |-------|-------|---------|
    /// | true  | true  | true    |
    /// | true  | false | false   |
    /// | true  | {}    | {}      |
    /// | false | any   | false   |
    /// | {}    | true  | {}      |
    /// | {}    | false | false   |
    /// | {}    | {}    | {}      |
    pub(crate) fn eval_and(
        &self,
        left: &Expression,
        right: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let l = self.eval(left, frame, ctx)?.as_boolean();
        if l == Some(false) {
            return Ok(Collection::boolean(false));
        }
        let r = self.eval(right, frame, ctx)?.as_boolean();
        Ok(truth(match (l, r) {
            (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        }))
    }

    /// Evaluate `or`; the right side is skipped when the left is true
    ///
    /// Truth table:
    /// | A     | B     | A or B  |
    /// |-------|-------|---------|
    /// | true  | any   | true    |
    /// | false | true  | true    |
    /// | false | false | false   |
    /// | false | {}    | {}      |
    /// | {}    | true  | true    |
    /// | {}    | false | {}      |
    /// | {}    | {}    | {}      |
    pub(crate) fn eval_or(
        &self,
        left: &Expression,
        right: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let l = self.eval(left, frame, ctx)?.as_boolean();
        if l == Some(true) {
            return Ok(Collection::boolean(true));
        }
        let r = self.eval(right, frame, ctx)?.as_boolean();
        Ok(truth(match (l, r) {
            (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        }))
    }

    /// Evaluate `xor`: true when exactly one side is true, empty if either is unknown
    pub(crate) fn eval_xor(
        &self,
        left: &Expression,
        right: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let l = self.eval(left, frame, ctx)?.as_boolean();
        let r = self.eval(right, frame, ctx)?.as_boolean();
        Ok(truth(match (l, r) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        }))
    }

    /// Evaluate `implies`; the right side is skipped when the left is false
    ///
    /// Truth table:
    /// | A     | B     | A implies B |
    /// |-------|-------|-------------|
    /// | true  | true  | true        |
    /// | true  | false | false       |
    /// | true  | {}    | {}          |
    /// | false | any   | true        |
    /// | {}    | true  | true        |
    /// | {}    | false | {}          |
    /// | {}    | {}    | {}          |
    pub(crate) fn eval_implies(
        &self,
        left: &Expression,
        right: &Expression,
        frame: &mut EvaluationFrame,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        let l = self.eval(left, frame, ctx)?.as_boolean();
        if l == Some(false) {
            return Ok(Collection::boolean(true));
        }
        let r = self.eval(right, frame, ctx)?.as_boolean();
        Ok(truth(match (l, r) {
            (_, Some(true)) => Some(true),
            (Some(true), Some(false)) => Some(false),
            _ => None,
        }))
    }
}
