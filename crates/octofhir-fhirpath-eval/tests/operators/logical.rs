//! Logical Operator Tests
//!
//! Tests for: and, or, xor, implies

use super::eval_bool;
use rstest::rstest;

#[rstest]
#[case("true and true", Some(true))]
#[case("true and false", Some(false))]
#[case("true and {}", None)]
#[case("false and true", Some(false))]
#[case("false and false", Some(false))]
#[case("false and {}", Some(false))]
#[case("{} and true", None)]
#[case("{} and false", Some(false))]
#[case("{} and {}", None)]
fn test_and(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[rstest]
#[case("true or true", Some(true))]
#[case("true or false", Some(true))]
#[case("true or {}", Some(true))]
#[case("false or true", Some(true))]
#[case("false or false", Some(false))]
#[case("false or {}", None)]
#[case("{} or true", Some(true))]
#[case("{} or false", None)]
#[case("{} or {}", None)]
fn test_or(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[rstest]
#[case("true xor true", Some(false))]
#[case("true xor false", Some(true))]
#[case("false xor true", Some(true))]
#[case("false xor false", Some(false))]
#[case("true xor {}", None)]
#[case("{} xor false", None)]
fn test_xor(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[rstest]
#[case("true implies true", Some(true))]
#[case("true implies false", Some(false))]
#[case("true implies {}", None)]
#[case("false implies true", Some(true))]
#[case("false implies false", Some(true))]
#[case("false implies {}", Some(true))]
#[case("{} implies true", Some(true))]
#[case("{} implies false", None)]
#[case("{} implies {}", None)]
fn test_implies(#[case] expression: &str, #[case] expected: Option<bool>) {
    assert_eq!(eval_bool(expression), expected, "{}", expression);
}

#[test]
fn test_right_side_not_evaluated_when_decided() {
    // The right-hand sides would fail with an unknown function
    assert_eq!(eval_bool("false and noSuchFunction()"), Some(false));
    assert_eq!(eval_bool("true or noSuchFunction()"), Some(true));
    assert_eq!(eval_bool("false implies noSuchFunction()"), Some(true));
}

#[test]
fn test_non_boolean_operand_is_unknown() {
    assert_eq!(eval_bool("'yes' and true"), None);
    assert_eq!(eval_bool("(true | false) or false"), None);
}
