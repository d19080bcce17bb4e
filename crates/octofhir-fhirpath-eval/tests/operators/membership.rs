//! Membership and Union Operator Tests
//!
//! Tests for: in, contains, |

use super::{eval, eval_bool, values};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("1 in (1 | 2 | 3)", true)]
#[case("4 in (1 | 2 | 3)", false)]
#[case("(1 | 2) in (1 | 2 | 3)", true)]
#[case("{} in (1 | 2)", true)]
#[case("'b' in ('a' | 'b')", true)]
#[case("(1 | 2 | 3) contains 2", true)]
#[case("(1 | 2 | 3) contains 4", false)]
#[case("(1 | 2) contains {}", true)]
fn test_membership(#[case] expression: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expression), Some(expected), "{}", expression);
}

#[test]
fn test_union_removes_duplicates_in_first_seen_order() {
    assert_eq!(values(&eval("(3 | 1) | (1 | 2 | 3)")), vec!["3", "1", "2"]);
    assert_eq!(values(&eval("1 | 1.0")), vec!["1"]);
}

#[test]
fn test_union_with_empty() {
    assert_eq!(values(&eval("{} | 1")), vec!["1"]);
    assert!(eval("{} | {}").is_empty());
}
