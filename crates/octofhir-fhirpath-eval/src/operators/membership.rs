//! Membership Operators for FHIRPath
//!
//! Implements: in, contains

use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::evaluator::FhirPathEvaluator;
use octofhir_fhirpath_ast::BinaryOp;
use octofhir_fhirpath_model::{Collection, Node};
use octofhir_fhirpath_types::{FhirPathType, SystemValue};

const VALUE_SET_FUNCTION: &str = "memberOf";

impl FhirPathEvaluator {
    /// Evaluate `in` and `contains` as subset tests
    ///
    /// `code in 'http://...'` with a coded, string or uri element on the
    /// left and a string on the right is a value set membership test.
    pub(crate) fn eval_membership(
        &self,
        op: BinaryOp,
        left: &Collection,
        right: &Collection,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<Collection> {
        if op == BinaryOp::In && self.is_value_set_test(left, right) {
            if let Some(member_of) = self.registry().get(VALUE_SET_FUNCTION).cloned() {
                return member_of.apply(ctx, left, std::slice::from_ref(right));
            }
        }
        let result = match op {
            BinaryOp::In => right.contains_all(left),
            _ => left.contains_all(right),
        };
        Ok(Collection::boolean(result))
    }

    fn is_value_set_test(&self, left: &Collection, right: &Collection) -> bool {
        let right_is_string = matches!(right.singleton_value(), Some(SystemValue::String(_)));
        right_is_string && left.singleton_node().is_some_and(|node| self.is_coded_element(node))
    }

    fn is_coded_element(&self, node: &Node) -> bool {
        let ty = node.node_type();
        !ty.is_system()
            && ["code", "Coding", "CodeableConcept", "string", "uri"]
                .iter()
                .any(|name| {
                    self.types()
                        .is_assignable_from(&FhirPathType::fhir(name), ty)
                })
    }
}
