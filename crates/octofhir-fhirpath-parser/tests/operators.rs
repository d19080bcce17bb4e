//! Tests for operator parsing and precedence
//!
//! Expressions are compared through their `Display` form, which wraps every
//! binary and type expression in parentheses and so exposes grouping.

use octofhir_fhirpath_ast::{BinaryOp, Expression, PolarityOp, TypeOp};
use octofhir_fhirpath_parser::parse_expression;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn parse_expr(input: &str) -> Expression {
    parse_expression(input).unwrap_or_else(|e| panic!("Failed to parse '{}': {:?}", input, e))
}

// === Binary Operators ===

#[rstest]
#[case("1 + 2", BinaryOp::Add)]
#[case("1 - 2", BinaryOp::Subtract)]
#[case("'a' & 'b'", BinaryOp::Concatenate)]
#[case("2 * 3", BinaryOp::Multiply)]
#[case("2 / 3", BinaryOp::Divide)]
#[case("7 div 2", BinaryOp::Div)]
#[case("7 mod 2", BinaryOp::Mod)]
#[case("a | b", BinaryOp::Union)]
#[case("a < b", BinaryOp::Less)]
#[case("a <= b", BinaryOp::LessOrEqual)]
#[case("a > b", BinaryOp::Greater)]
#[case("a >= b", BinaryOp::GreaterOrEqual)]
#[case("a = b", BinaryOp::Equal)]
#[case("a != b", BinaryOp::NotEqual)]
#[case("a ~ b", BinaryOp::Equivalent)]
#[case("a !~ b", BinaryOp::NotEquivalent)]
#[case("a in b", BinaryOp::In)]
#[case("a contains b", BinaryOp::Contains)]
#[case("a and b", BinaryOp::And)]
#[case("a or b", BinaryOp::Or)]
#[case("a xor b", BinaryOp::Xor)]
#[case("a implies b", BinaryOp::Implies)]
fn test_binary_operator(#[case] input: &str, #[case] expected: BinaryOp) {
    match parse_expr(input) {
        Expression::Binary { op, .. } => assert_eq!(op, expected),
        other => panic!("Expected binary expression for '{}', got {:?}", input, other),
    }
}

// === Precedence ===

#[rstest]
#[case("1 + 2 * 3", "(1 + (2 * 3))")]
#[case("1 * 2 + 3", "((1 * 2) + 3)")]
#[case("1 - 2 - 3", "((1 - 2) - 3)")]
#[case("a or b and c", "(a or (b and c))")]
#[case("a implies b implies c", "(a implies (b implies c))")]
#[case("a = b or c = d", "((a = b) or (c = d))")]
#[case("a | b = c", "((a | b) = c)")]
#[case("a < b = true", "((a < b) = true)")]
#[case("x in y and z", "((x in y) and z)")]
#[case("1 + 2 is Integer", "((1 + 2) is Integer)")]
#[case("a | b is String", "(a | (b is String))")]
#[case("(1 + 2) * 3", "((1 + 2) * 3)")]
fn test_precedence(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(parse_expr(input).to_string(), expected);
}

// === Type Operators ===

#[test]
fn test_is_with_qualified_type() {
    let expr = parse_expr("value is System.String");
    match expr {
        Expression::Type {
            op, type_specifier, ..
        } => {
            assert_eq!(op, TypeOp::Is);
            assert_eq!(type_specifier.unquoted(), "System.String");
        }
        other => panic!("Expected type expression, got {:?}", other),
    }
}

#[test]
fn test_as_with_delimited_type() {
    let expr = parse_expr("value as FHIR.`Quantity`");
    match expr {
        Expression::Type {
            op, type_specifier, ..
        } => {
            assert_eq!(op, TypeOp::As);
            assert_eq!(type_specifier.unquoted(), "FHIR.Quantity");
        }
        other => panic!("Expected type expression, got {:?}", other),
    }
}

// === Polarity ===

#[test]
fn test_unary_minus() {
    let expr = parse_expr("-5");
    assert!(matches!(
        expr,
        Expression::Polarity {
            op: PolarityOp::Minus,
            ..
        }
    ));
}

#[test]
fn test_unary_minus_binds_tighter_than_multiplication() {
    assert_eq!(parse_expr("-2 * 3").to_string(), "(-2 * 3)");
}

#[test]
fn test_subtract_negative() {
    assert_eq!(parse_expr("5 - -3").to_string(), "(5 - -3)");
}

// === Paths and Invocations ===

#[rstest]
#[case("Patient.name.given")]
#[case("Patient.name.where(use = 'official').given.first()")]
#[case("Patient.name[0]")]
#[case("Bundle.entry.resource.ofType(Patient)")]
#[case("name.select(given & ' ' & family)")]
#[case("$this.length() > 2")]
#[case("%resource.id")]
#[case("%`vs-administrative-gender`")]
#[case("iif(active, 'yes', 'no')")]
#[case("Observation.value.is(Quantity)")]
#[case("children().count() > 0")]
#[case("Patient.`div`")]
fn test_parses(#[case] input: &str) {
    parse_expr(input);
}

#[test]
fn test_path_and_indexer_structure() {
    let expr = parse_expr("Patient.name[1].given");
    assert_eq!(expr.to_string(), "Patient.name[1].given");
    match expr {
        Expression::Path { target, .. } => {
            assert!(matches!(*target, Expression::Indexer { .. }));
        }
        other => panic!("Expected path, got {:?}", other),
    }
}

#[test]
fn test_external_constant_names_are_unquoted() {
    assert_eq!(
        parse_expr("%`ext-patient-birthTime`"),
        Expression::ExternalConstant("ext-patient-birthTime".into())
    );
    assert_eq!(
        parse_expr("%'vs-observation-status'"),
        Expression::ExternalConstant("vs-observation-status".into())
    );
}

#[test]
fn test_function_arguments() {
    let expr = parse_expr("substring(1, 2)");
    assert_eq!(
        expr,
        Expression::function(
            "substring",
            vec![
                Expression::Literal(octofhir_fhirpath_ast::Literal::number("1")),
                Expression::Literal(octofhir_fhirpath_ast::Literal::number("2")),
            ]
        )
    );
}

#[test]
fn test_whitespace_and_comments() {
    let expr = parse_expr(
        r#"
        Patient.name // the names
          /* only official */ .where(use = 'official')
        "#,
    );
    assert_eq!(expr.to_string(), "Patient.name.where((use = 'official'))");
}

// === Errors ===

#[rstest]
#[case("Patient.name.")]
#[case("1 +")]
#[case("(1 + 2")]
#[case("Patient.name)")]
#[case("'unterminated")]
#[case("where(")]
#[case("and")]
#[case("")]
fn test_parse_errors(#[case] input: &str) {
    assert!(
        parse_expression(input).is_err(),
        "Expected parse error for '{}'",
        input
    );
}

#[test]
fn test_error_points_at_offending_character() {
    let err = parse_expression("Patient.name)").unwrap_err();
    assert_eq!(err.code.to_string(), "FP0001");
    let location = err.location.expect("location");
    assert_eq!(location.offset, 12);
}
