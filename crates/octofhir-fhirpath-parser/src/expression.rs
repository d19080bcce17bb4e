//! Expression parser using recursive descent with precedence climbing
//!
//! One function per precedence level, lowest first. Every binary level is
//! left-associative except `implies`.

use crate::combinators::{
    any_identifier_parser, boolean_or_null_parser, identifier_parser, lit,
    number_or_quantity_parser, padded_keyword, string_parser, temporal_literal_parser, ws, Input,
    PResult,
};
use octofhir_fhirpath_ast::{
    BinaryOp, Expression, FunctionCall, Identifier, Invocation, Literal, LiteralKind, PolarityOp,
    QualifiedIdentifier, TypeOp,
};
use winnow::combinator::separated;
use winnow::error::ContextError;
use winnow::prelude::*;

/// Parse a FHIRPath expression (entry point)
pub fn expression_parser(input: &mut Input<'_>) -> PResult<Expression> {
    ws(input)?;
    implies_expression(input)
}

/// Parse implies expression (lowest precedence, right-associative)
fn implies_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let left = or_expression(input)?;

    if padded_keyword("implies").parse_next(input).is_ok() {
        let right = implies_expression(input)?;
        return Ok(Expression::binary(left, BinaryOp::Implies, right));
    }
    Ok(left)
}

/// Parse or/xor expression
fn or_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = and_expression(input)?;

    loop {
        let op = if padded_keyword("or").parse_next(input).is_ok() {
            BinaryOp::Or
        } else if padded_keyword("xor").parse_next(input).is_ok() {
            BinaryOp::Xor
        } else {
            break;
        };
        let right = and_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

fn and_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = membership_expression(input)?;

    while padded_keyword("and").parse_next(input).is_ok() {
        let right = membership_expression(input)?;
        left = Expression::binary(left, BinaryOp::And, right);
    }
    Ok(left)
}

/// Parse `in` / `contains`
fn membership_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = equality_expression(input)?;

    loop {
        let op = if padded_keyword("in").parse_next(input).is_ok() {
            BinaryOp::In
        } else if padded_keyword("contains").parse_next(input).is_ok() {
            BinaryOp::Contains
        } else {
            break;
        };
        let right = equality_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

/// Parse `=`, `~`, `!=`, `!~`
fn equality_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = inequality_expression(input)?;

    loop {
        let op = if lit("!=").parse_next(input).is_ok() {
            BinaryOp::NotEqual
        } else if lit("!~").parse_next(input).is_ok() {
            BinaryOp::NotEquivalent
        } else if lit("=").parse_next(input).is_ok() {
            BinaryOp::Equal
        } else if lit("~").parse_next(input).is_ok() {
            BinaryOp::Equivalent
        } else {
            break;
        };
        let right = inequality_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

/// Parse `<`, `<=`, `>`, `>=`
fn inequality_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = union_expression(input)?;

    loop {
        // Two-character operators must be tried first
        let op = if lit("<=").parse_next(input).is_ok() {
            BinaryOp::LessOrEqual
        } else if lit(">=").parse_next(input).is_ok() {
            BinaryOp::GreaterOrEqual
        } else if lit("<").parse_next(input).is_ok() {
            BinaryOp::Less
        } else if lit(">").parse_next(input).is_ok() {
            BinaryOp::Greater
        } else {
            break;
        };
        let right = union_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

fn union_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = type_expression(input)?;

    while lit("|").parse_next(input).is_ok() {
        let right = type_expression(input)?;
        left = Expression::binary(left, BinaryOp::Union, right);
    }
    Ok(left)
}

/// Parse `is` / `as` followed by a type specifier
fn type_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut operand = additive_expression(input)?;

    loop {
        let op = if padded_keyword("is").parse_next(input).is_ok() {
            TypeOp::Is
        } else if padded_keyword("as").parse_next(input).is_ok() {
            TypeOp::As
        } else {
            break;
        };
        let type_specifier = qualified_identifier(input)?;
        operand = Expression::Type {
            operand: Box::new(operand),
            op,
            type_specifier,
        };
    }
    Ok(operand)
}

/// Parse a dotted type name such as `System.String` or `FHIR.Patient`
fn qualified_identifier(input: &mut Input<'_>) -> PResult<QualifiedIdentifier> {
    let parts: Vec<Identifier> = separated(1.., any_identifier_parser, lit(".")).parse_next(input)?;
    Ok(QualifiedIdentifier::new(parts))
}

/// Parse `+`, `-`, `&`
fn additive_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = multiplicative_expression(input)?;

    loop {
        let op = if lit("+").parse_next(input).is_ok() {
            BinaryOp::Add
        } else if lit("-").parse_next(input).is_ok() {
            BinaryOp::Subtract
        } else if lit("&").parse_next(input).is_ok() {
            BinaryOp::Concatenate
        } else {
            break;
        };
        let right = multiplicative_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

/// Parse `*`, `/`, `div`, `mod`
fn multiplicative_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut left = polarity_expression(input)?;

    loop {
        let op = if lit("*").parse_next(input).is_ok() {
            BinaryOp::Multiply
        } else if lit("/").parse_next(input).is_ok() {
            BinaryOp::Divide
        } else if padded_keyword("div").parse_next(input).is_ok() {
            BinaryOp::Div
        } else if padded_keyword("mod").parse_next(input).is_ok() {
            BinaryOp::Mod
        } else {
            break;
        };
        let right = polarity_expression(input)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

/// Parse prefix `+` / `-`
fn polarity_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let op = if lit("+").parse_next(input).is_ok() {
        PolarityOp::Plus
    } else if lit("-").parse_next(input).is_ok() {
        PolarityOp::Minus
    } else {
        return postfix_expression(input);
    };
    let operand = polarity_expression(input)?;
    Ok(Expression::Polarity {
        op,
        operand: Box::new(operand),
    })
}

/// Parse a term followed by any number of `.invocation` and `[index]`
fn postfix_expression(input: &mut Input<'_>) -> PResult<Expression> {
    let mut expr = term(input)?;

    loop {
        if lit(".").parse_next(input).is_ok() {
            let invocation = invocation_parser(input, true)?;
            expr = Expression::path(expr, invocation);
        } else if lit("[").parse_next(input).is_ok() {
            let index = expression_parser(input)?;
            lit("]").parse_next(input)?;
            expr = Expression::Indexer {
                collection: Box::new(expr),
                index: Box::new(index),
            };
        } else {
            break;
        }
    }
    Ok(expr)
}

/// Parse a term: literal, external constant, invocation or parenthesized expression
fn term(input: &mut Input<'_>) -> PResult<Expression> {
    ws(input)?;

    if lit("(").parse_next(input).is_ok() {
        let inner = expression_parser(input)?;
        lit(")").parse_next(input)?;
        return Ok(inner);
    }

    if lit("%").parse_next(input).is_ok() {
        return external_constant(input);
    }

    if input.starts_with('@') {
        return temporal_literal_parser(input).map(Expression::Literal);
    }

    if input.starts_with(|c: char| c.is_ascii_digit()) {
        return number_or_quantity_parser(input).map(Expression::Literal);
    }

    if input.starts_with('\'') {
        return string_parser(input)
            .map(|(value, raw)| Expression::Literal(Literal::new(LiteralKind::String(value), raw)));
    }

    if let Ok(literal) = boolean_or_null_parser(input) {
        return Ok(Expression::Literal(literal));
    }

    invocation_parser(input, false).map(Expression::Invocation)
}

/// `%name`, `%`delimited`` or `%'string'`; the stored name has delimiters removed
fn external_constant(input: &mut Input<'_>) -> PResult<Expression> {
    if input.starts_with('\'') {
        let (value, _) = string_parser(input)?;
        return Ok(Expression::ExternalConstant(value));
    }
    let id = any_identifier_parser(input)?;
    Ok(Expression::ExternalConstant(id.unquoted().to_string()))
}

/// Parse a member name, function call or special variable
///
/// After a `.` any identifier is allowed (`Patient.as(...)`, `x.contains`);
/// in term position a reserved word is accepted only as a function name.
fn invocation_parser(input: &mut Input<'_>, after_dot: bool) -> PResult<Invocation> {
    ws(input)?;

    if let Some(rest) = input.strip_prefix('$') {
        let checkpoint = *input;
        *input = rest;
        let name = any_identifier_parser(input)?;
        return match name.text.as_str() {
            "this" => Ok(Invocation::This),
            "index" => Ok(Invocation::Index),
            "total" => Ok(Invocation::Total),
            _ => {
                *input = checkpoint;
                Err(ContextError::new())
            }
        };
    }

    let checkpoint = *input;
    let (name, reserved) = match identifier_parser(input) {
        Ok(name) => (name, false),
        Err(_) => {
            *input = checkpoint;
            (any_identifier_parser(input)?, !after_dot)
        }
    };

    let before_args = *input;
    if lit("(").parse_next(input).is_ok() {
        let args = arguments(input)?;
        lit(")").parse_next(input)?;
        return Ok(Invocation::Function(FunctionCall { name, args }));
    }
    *input = before_args;

    if reserved {
        *input = checkpoint;
        return Err(ContextError::new());
    }
    Ok(Invocation::Member(name))
}

fn arguments(input: &mut Input<'_>) -> PResult<Vec<Expression>> {
    ws(input)?;
    if input.starts_with(')') {
        return Ok(Vec::new());
    }
    separated(1.., expression_parser, lit(",")).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Expression {
        let mut input = source;
        let expr = expression_parser(&mut input)
            .unwrap_or_else(|e| panic!("Failed to parse '{}': {:?}", source, e));
        assert!(input.trim().is_empty(), "Unconsumed input: '{}'", input);
        expr
    }

    #[test]
    fn test_reserved_word_as_function_in_term_position() {
        let expr = parse("contains('a')");
        assert_eq!(
            expr,
            Expression::function("contains", vec![Expression::Literal(Literal::string("a"))])
        );
    }

    #[test]
    fn test_reserved_word_after_dot() {
        let expr = parse("Observation.value.as(Quantity)");
        assert_eq!(expr.to_string(), "Observation.value.as(Quantity)");
    }

    #[test]
    fn test_special_variables() {
        assert_eq!(parse("$this"), Expression::Invocation(Invocation::This));
        assert_eq!(parse("$index"), Expression::Invocation(Invocation::Index));
        assert_eq!(parse("$total"), Expression::Invocation(Invocation::Total));
    }
}
