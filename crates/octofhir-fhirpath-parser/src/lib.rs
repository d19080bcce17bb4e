//! FHIRPath parser using Winnow
//!
//! Recursive descent with precedence climbing over the FHIRPath N1 grammar.
//! The parser only builds the tree; names, types and literal values are
//! resolved by the evaluator.

mod combinators;
mod expression;

use combinators::ws;
use expression::expression_parser;
use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_diagnostics::{FP0001, FP0002, ParseError, Result, Span};
use winnow::combinator::eof;
use winnow::error::ContextError;
use winnow::prelude::*;

/// Parse a single FHIRPath expression
pub fn parse_expression(source: &str) -> Result<Expression> {
    let mut input: &str = source;

    let expr = expression_parser(&mut input).map_err(|e| failure(source, input, &e))?;
    ws(&mut input).ok();
    eof::<_, ContextError>
        .parse_next(&mut input)
        .map_err(|e| failure(source, input, &e))?;
    Ok(expr)
}

fn failure(source: &str, remaining: &str, error: &ContextError) -> ParseError {
    let offset = source.len() - remaining.len();
    let span = Span::point(offset);
    match remaining.chars().next() {
        Some(ch) => ParseError::at(
            FP0001,
            format!("Unexpected '{}' at offset {}: {}", ch, offset, error),
            source,
            span,
        ),
        None => ParseError::at(FP0002, "Unexpected end of input", source, span),
    }
}
