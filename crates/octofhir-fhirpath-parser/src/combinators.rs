//! Token-level parsers for FHIRPath

use octofhir_fhirpath_ast::{Identifier, Literal, LiteralKind};
use winnow::combinator::alt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{literal, take_while};

pub type Input<'a> = &'a str;
pub type PResult<T> = Result<T, ContextError>;

/// Calendar duration keywords accepted as quantity units
const CALENDAR_UNITS: &[&str] = &[
    "years",
    "year",
    "months",
    "month",
    "weeks",
    "week",
    "days",
    "day",
    "hours",
    "hour",
    "minutes",
    "minute",
    "seconds",
    "second",
    "milliseconds",
    "millisecond",
];

/// Words that act as operators and are never read as a bare member name
const RESERVED: &[&str] = &[
    "and", "or", "xor", "implies", "div", "mod", "in", "contains", "is", "as", "true", "false",
];

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Skip whitespace and comments
pub fn ws(input: &mut Input<'_>) -> PResult<()> {
    loop {
        let trimmed = input.trim_start();
        *input = trimmed;
        if let Some(rest) = input.strip_prefix("//") {
            *input = rest.find('\n').map_or("", |idx| &rest[idx + 1..]);
        } else if let Some(rest) = input.strip_prefix("/*") {
            match rest.find("*/") {
                Some(idx) => *input = &rest[idx + 2..],
                None => return Err(ContextError::new()),
            }
        } else {
            return Ok(());
        }
    }
}

/// Match a literal token after optional whitespace
pub fn lit<'a>(token: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| -> PResult<&'a str> {
        ws(input)?;
        literal(token).parse_next(input)
    }
}

/// Match a keyword after optional whitespace, requiring a word boundary
pub fn padded_keyword<'a>(word: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| -> PResult<&'a str> {
        let checkpoint = *input;
        ws(input)?;
        let matched = keyword_text(input, word)?;
        if input.chars().next().is_some_and(is_ident_char) {
            *input = checkpoint;
            return Err(ContextError::new());
        }
        Ok(matched)
    }
}

fn keyword_text<'a>(input: &mut Input<'a>, word: &'static str) -> PResult<&'a str> {
    literal(word).parse_next(input)
}

fn digits<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn plain_identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (take_while(1, is_ident_start), take_while(0.., is_ident_char))
        .take()
        .parse_next(input)
}

fn delimited_identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    let start = *input;
    quoted_body(input, '`')?;
    Ok(&start[..start.len() - input.len()])
}

/// Parse an identifier token (plain or backtick-delimited), keeping raw text
pub fn identifier_parser(input: &mut Input<'_>) -> PResult<Identifier> {
    ws(input)?;
    let checkpoint = *input;
    let text = alt((delimited_identifier, plain_identifier)).parse_next(input)?;
    if RESERVED.contains(&text) {
        *input = checkpoint;
        return Err(ContextError::new());
    }
    Ok(Identifier::new(text))
}

/// Identifier that may be a reserved word; used after `.` and in type specifiers
pub fn any_identifier_parser(input: &mut Input<'_>) -> PResult<Identifier> {
    ws(input)?;
    let text = alt((delimited_identifier, plain_identifier)).parse_next(input)?;
    Ok(Identifier::new(text))
}

/// Consume a quoted body delimited by `quote`, returning the unescaped content
fn quoted_body(input: &mut Input<'_>, quote: char) -> PResult<String> {
    let text: &str = input;
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c == quote => {}
        _ => return Err(ContextError::new()),
    }

    let mut out = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == quote {
            *input = &text[idx + c.len_utf8()..];
            return Ok(out);
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            break;
        };
        match escaped {
            '\'' | '"' | '`' | '\\' | '/' => out.push(escaped),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let mut code = String::with_capacity(4);
                for _ in 0..4 {
                    match chars.next() {
                        Some((_, h)) if h.is_ascii_hexdigit() => code.push(h),
                        _ => return Err(ContextError::new()),
                    }
                }
                let value = u32::from_str_radix(&code, 16).map_err(|_| ContextError::new())?;
                out.push(char::from_u32(value).ok_or_else(ContextError::new)?);
            }
            _ => return Err(ContextError::new()),
        }
    }
    Err(ContextError::new())
}

/// Parse a single-quoted string, returning unescaped content and raw text
pub fn string_parser<'a>(input: &mut Input<'a>) -> PResult<(String, &'a str)> {
    ws(input)?;
    let start = *input;
    let value = quoted_body(input, '\'')?;
    Ok((value, &start[..start.len() - input.len()]))
}

fn number_text<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    let start = *input;
    digits(input)?;
    // A fraction needs a digit after the dot; `1.toString()` is an invocation
    if let Some(rest) = input.strip_prefix('.') {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            *input = rest;
            digits(input)?;
        }
    }
    Ok(&start[..start.len() - input.len()])
}

/// Parse a number, or a quantity when a unit follows
pub fn number_or_quantity_parser(input: &mut Input<'_>) -> PResult<Literal> {
    ws(input)?;
    let start = *input;
    let number = number_text(input)?;

    let before_unit = *input;
    if let Ok((unit, _)) = string_parser(input) {
        let text = &start[..start.len() - input.len()];
        return Ok(Literal::new(
            LiteralKind::Quantity {
                number: number.to_string(),
                unit,
            },
            text,
        ));
    }
    *input = before_unit;

    ws(input)?;
    if let Ok(word) = plain_identifier(input) {
        if CALENDAR_UNITS.contains(&word) {
            let text = &start[..start.len() - input.len()];
            return Ok(Literal::new(
                LiteralKind::Quantity {
                    number: number.to_string(),
                    unit: word.to_string(),
                },
                text,
            ));
        }
    }
    *input = before_unit;

    Ok(Literal::number(number))
}

fn date_text(input: &mut Input<'_>) -> PResult<()> {
    let year = digits(input)?;
    if year.len() != 4 {
        return Err(ContextError::new());
    }
    for _ in 0..2 {
        match input.strip_prefix('-') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                *input = rest;
                two_digits(input)?;
            }
            _ => break,
        }
    }
    Ok(())
}

fn two_digits(input: &mut Input<'_>) -> PResult<()> {
    let d = digits(input)?;
    if d.len() == 2 { Ok(()) } else { Err(ContextError::new()) }
}

fn time_text(input: &mut Input<'_>) -> PResult<()> {
    two_digits(input)?;
    for _ in 0..2 {
        match input.strip_prefix(':') {
            Some(rest) => {
                *input = rest;
                two_digits(input)?;
            }
            None => return Ok(()),
        }
    }
    if let Some(rest) = input.strip_prefix('.') {
        *input = rest;
        digits(input)?;
    }
    Ok(())
}

fn timezone_text(input: &mut Input<'_>) -> PResult<()> {
    if let Some(rest) = input.strip_prefix('Z') {
        *input = rest;
        return Ok(());
    }
    if let Some(rest) = input.strip_prefix(['+', '-']) {
        *input = rest;
        two_digits(input)?;
        *input = input.strip_prefix(':').ok_or_else(ContextError::new)?;
        two_digits(input)?;
    }
    Ok(())
}

/// Parse `@`-prefixed date, datetime and time literals
pub fn temporal_literal_parser(input: &mut Input<'_>) -> PResult<Literal> {
    ws(input)?;
    let start = *input;
    *input = input.strip_prefix('@').ok_or_else(ContextError::new)?;
    let body = *input;

    if let Some(rest) = input.strip_prefix('T') {
        *input = rest;
        time_text(input)?;
        let text = &start[..start.len() - input.len()];
        let value = &body[..body.len() - input.len()];
        return Ok(Literal::new(LiteralKind::Time(value.to_string()), text));
    }

    date_text(input)?;
    let kind = if let Some(rest) = input.strip_prefix('T') {
        *input = rest;
        if input.starts_with(|c: char| c.is_ascii_digit()) {
            time_text(input)?;
            timezone_text(input)?;
        }
        LiteralKind::DateTime(body[..body.len() - input.len()].to_string())
    } else {
        LiteralKind::Date(body[..body.len() - input.len()].to_string())
    };
    let text = &start[..start.len() - input.len()];
    Ok(Literal::new(kind, text))
}

/// Parse `true`, `false` and `{}`
pub fn boolean_or_null_parser(input: &mut Input<'_>) -> PResult<Literal> {
    alt((
        padded_keyword("true").map(|_| Literal::boolean(true)),
        padded_keyword("false").map(|_| Literal::boolean(false)),
        (lit("{"), lit("}")).map(|_| Literal::null()),
    ))
    .parse_next(input)
}
