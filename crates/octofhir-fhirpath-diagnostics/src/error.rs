//! Diagnostics and parse errors

use crate::{ErrorCode, SourceLocation, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A non-fatal finding reported during evaluation
///
/// Functions that degrade gracefully (a terminology lookup without a
/// configured service, for example) append one of these to the evaluation
/// context instead of failing the whole expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    /// Path of the node the diagnostic refers to, when known
    pub expression: Option<String>,
    /// Identifier of the constraint being evaluated, when set
    pub constraint: Option<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    fn new(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            expression: None,
            constraint: None,
        }
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(expr) = &self.expression {
            write!(f, " at {}", expr)?;
        }
        if let Some(id) = &self.constraint {
            write!(f, " (constraint {})", id)?;
        }
        Ok(())
    }
}

/// Malformed expression source text
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    /// The complete source text that failed to parse
    pub expression: String,
    pub location: Option<SourceLocation>,
}

impl ParseError {
    pub fn new(code: ErrorCode, message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            expression: expression.into(),
            location: None,
        }
    }

    /// Parse error pointing at a span of the source
    pub fn at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        span: Span,
    ) -> Self {
        let expression = expression.into();
        let location = SourceLocation::from_span(span, &expression);
        Self {
            code,
            message: message.into(),
            expression,
            location: Some(location),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone()).with_expression(self.expression.clone())
    }
}
