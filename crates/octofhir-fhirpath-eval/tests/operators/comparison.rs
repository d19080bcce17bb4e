//! Comparison Operator Tests
//!
//! Tests for: =, !=, ~, !~, <, <=, >, >=

use super::{eval_bool, eval_err};
use octofhir_fhirpath_eval::{EvalError, FhirPathErrorCause};
use rstest::rstest;

#[rstest]
#[case("1 = 1", Some(true))]
#[case("1 = 1.0", Some(true))]
#[case("'a' = 'a'", Some(true))]
#[case("'a' = 'A'", Some(false))]
#[case("1 = 'a'", Some(false))]
#[case("(1 | 2) = (1 | 2)", Some(true))]
#[case("(1 | 2) = (2 | 1)", Some(false))]
#[case("(1 | 2) = 1", Some(false))]
#[case("1 = {}", None)]
#[case("{} = {}", None)]
#[case("@2012-01 = @2012-01-01", None)]
#[case("@2012-01-01 = @2012-01-01", Some(true))]
fn test_equality(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[rstest]
#[case("1 != 2", Some(true))]
#[case("1 != 1", Some(false))]
#[case("(1 | 2) != 1", Some(true))]
#[case("1 != {}", None)]
fn test_inequality_operator(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[rstest]
#[case("'Hello  World' ~ 'hello world'", true)]
#[case("1.2 ~ 1.24", true)]
#[case("(1 | 2) ~ (2 | 1)", true)]
#[case("{} ~ {}", true)]
#[case("1 ~ {}", false)]
#[case("'a' ~ 'b'", false)]
#[case("'a' !~ 'b'", true)]
#[case("{} !~ {}", false)]
fn test_equivalence(#[case] expression: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expression), Some(expected), "{}", expression);
}

#[rstest]
#[case("1 < 2", Some(true))]
#[case("2 <= 2", Some(true))]
#[case("3 > 2.5", Some(true))]
#[case("1 >= 2", Some(false))]
#[case("'abc' < 'abd'", Some(true))]
#[case("@2012-01-01 < @2012-01-02", Some(true))]
#[case("@2012 < @2012-01-02", None)]
#[case("5 'mg' < 1 'g'", Some(true))]
#[case("1 < {}", None)]
#[case("(1 | 2) < 3", None)]
fn test_ordering(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[test]
fn test_ordering_incompatible_types() {
    let err = eval_err("1 < 'a'");
    match err.cause {
        FhirPathErrorCause::Evaluation(EvalError::IncompatibleOperands { message }) => {
            assert_eq!(message, "Type: 'Integer' is not compatible with type: 'String'");
        }
        other => panic!("unexpected cause: {:?}", other),
    }
}
