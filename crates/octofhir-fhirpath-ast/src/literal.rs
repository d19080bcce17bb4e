//! Literal values

use serde::{Deserialize, Serialize};

/// A literal as written in the source
///
/// `text` is the exact source slice (e.g. `'abc'`, `@2019-01`, `5 'mg'`).
/// The evaluator converts it to a value lazily and memoizes by `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    /// The empty collection `{}`
    Null,
    Boolean(bool),
    /// Unescaped string content
    String(String),
    /// Integer or decimal digits; a `.` makes it a decimal
    Number(String),
    /// Date without the leading `@`
    Date(String),
    /// DateTime without the leading `@`
    DateTime(String),
    /// Time including the leading `T`
    Time(String),
    /// Number with a UCUM unit (quotes removed) or a calendar keyword
    Quantity { number: String, unit: String },
}

impl Literal {
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn null() -> Self {
        Self::new(LiteralKind::Null, "{}")
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(LiteralKind::Boolean(value), value.to_string())
    }

    pub fn number(digits: impl Into<String>) -> Self {
        let digits = digits.into();
        Self::new(LiteralKind::Number(digits.clone()), digits)
    }

    /// String literal from its already-unescaped content; the source text
    /// is reconstructed with single quotes.
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let text = format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"));
        Self::new(LiteralKind::String(value), text)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, LiteralKind::Null)
    }
}
