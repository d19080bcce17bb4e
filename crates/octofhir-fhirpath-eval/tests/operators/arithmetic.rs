//! Arithmetic Operator Tests
//!
//! Tests for: +, -, *, /, div, mod, &, unary polarity

use super::{eval, eval_bool, eval_err, values};
use octofhir_fhirpath_diagnostics::FP0103;
use octofhir_fhirpath_eval::{EvalError, FhirPathErrorCause};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("1 + 2 = 3")]
#[case("5 - 7 = -2")]
#[case("3 * 4 = 12")]
#[case("10 / 4 = 2.5")]
#[case("7 div 2 = 3")]
#[case("7 mod 2 = 1")]
#[case("1.5 + 1 = 2.5")]
#[case("7.5 div 2 = 3")]
#[case("'abc' + 'def' = 'abcdef'")]
#[case("2 'mg' + 3 'mg' = 5 'mg'")]
#[case("@2019-01-31 + 1 month = @2019-02-28")]
fn test_arithmetic(#[case] expression: &str) {
    assert_eq!(eval_bool(expression), Some(true), "{}", expression);
}

#[rstest]
#[case("1 + {}")]
#[case("{} - 1")]
#[case("{} * 2")]
#[case("1 / 0")]
#[case("1 div 0")]
#[case("1 mod 0")]
#[case("2147483647 + 1")]
#[case("1 & {}")]
#[case("{} & 1")]
#[case("@2020-01-01T00:00:00Z + 10000000000000000 days")]
#[case("@2020-01-01 - 10000000000000000 weeks")]
#[case("@2020-01-01T00:00:00Z + 100000000000000000000 years")]
fn test_arithmetic_gives_empty(#[case] expression: &str) {
    assert!(eval(expression).is_empty(), "{}", expression);
}

#[test]
fn test_concatenation_treats_empty_as_empty_string() {
    assert_eq!(values(&eval("'a' & 'b'")), vec!["ab"]);
    assert_eq!(values(&eval("'a' & {}")), vec!["a"]);
    assert_eq!(values(&eval("{} & 'b'")), vec!["b"]);
    assert_eq!(values(&eval("{} & {}")), vec![""]);
}

#[test]
fn test_concatenation_rejects_non_strings() {
    let err = eval_err("'a' & 1");
    assert_eq!(err.code(), FP0103);
}

#[test]
fn test_operand_must_be_singleton() {
    let err = eval_err("(1 | 2) + 1");
    assert!(matches!(
        err.cause,
        FhirPathErrorCause::Evaluation(EvalError::SingletonExpected { size: 2 })
    ));
}

#[test]
fn test_incompatible_operands() {
    let err = eval_err("1 + 'a'");
    assert!(matches!(
        err.cause,
        FhirPathErrorCause::Evaluation(EvalError::IncompatibleOperands { .. })
    ));
}

#[rstest]
#[case("-5 = 0 - 5", Some(true))]
#[case("-(2.5) = 0 - 2.5", Some(true))]
#[case("+3 = 3", Some(true))]
#[case("-{}", None)]
#[case("+'a'", None)]
#[case("-'a'", None)]
#[case("-'true'", None)]
fn test_polarity(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[test]
fn test_time_shift_by_huge_amount_wraps_midnight() {
    assert_eq!(eval_bool("@T10:00 + 9000000000000000 hours = @T10:00"), Some(true));
}
