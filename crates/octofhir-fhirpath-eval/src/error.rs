//! Evaluation errors for the FHIRPath engine

use octofhir_fhirpath_diagnostics::{
    ErrorCode, FP0003, FP0100, FP0101, FP0102, FP0103, FP0104, FP0105, FP0106, FP0200,
    ParseError,
};
use octofhir_fhirpath_model::ModelError;
use octofhir_fhirpath_types::ValueError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that abort an evaluation
///
/// Situations the language defines as empty (division by zero, unmatched
/// navigation, unknown constants) are not errors and never reach this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Function name not registered
    #[error("Function: '{name}' not found")]
    UnknownFunction { name: String },

    /// Wrong number of arguments
    #[error("Unexpected number of arguments: {actual} for function: '{name}' (expected {expected})")]
    InvalidArity {
        name: String,
        actual: usize,
        expected: String,
    },

    /// Type specifier that does not resolve
    #[error("Argument '{name}' cannot be resolved to a valid type identifier")]
    UnknownType { name: String },

    /// Operands whose types the operator is not defined for
    #[error("{message}")]
    IncompatibleOperands { message: String },

    /// More than one item where a singleton is required
    #[error("Input collection has {size} items, but only 1 is allowed")]
    SingletonExpected { size: usize },

    /// Argument with the wrong shape or value
    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// Literal whose text is not a valid value
    #[error("Invalid literal: {text}")]
    InvalidLiteral { text: String },

    /// Expression nesting deeper than the configured limit
    #[error("Maximum expression depth of {limit} exceeded")]
    RecursionLimit { limit: usize },

    /// Failure inside a registered function
    #[error("Evaluation failed: {message}")]
    Failed { message: String },
}

impl EvalError {
    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    /// Create an arity error; `min == max` renders a single count
    pub fn invalid_arity(name: impl Into<String>, actual: usize, min: usize, max: usize) -> Self {
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{}..{}", min, max)
        };
        Self::InvalidArity {
            name: name.into(),
            actual,
            expected,
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Create an incompatible type error naming both operand types
    pub fn incompatible_types(left: impl AsRef<str>, right: impl AsRef<str>) -> Self {
        Self::IncompatibleOperands {
            message: format!(
                "Type: '{}' is not compatible with type: '{}'",
                left.as_ref(),
                right.as_ref()
            ),
        }
    }

    pub fn singleton_expected(size: usize) -> Self {
        Self::SingletonExpected { size }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn invalid_literal(text: impl Into<String>) -> Self {
        Self::InvalidLiteral { text: text.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Diagnostic code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownFunction { .. } => FP0100,
            Self::InvalidArity { .. } => FP0101,
            Self::UnknownType { .. } => FP0102,
            Self::IncompatibleOperands { .. } => FP0103,
            Self::SingletonExpected { .. } => FP0104,
            Self::InvalidArgument { .. } => FP0105,
            Self::InvalidLiteral { .. } => FP0003,
            Self::RecursionLimit { .. } => FP0106,
            Self::Failed { .. } => FP0200,
        }
    }
}

impl From<ValueError> for EvalError {
    fn from(error: ValueError) -> Self {
        Self::IncompatibleOperands {
            message: error.to_string(),
        }
    }
}

/// Originating cause of a [`FhirPathError`]
#[derive(Debug, Error, Clone)]
pub enum FhirPathErrorCause {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// The single error type surfaced to callers
///
/// Wraps the expression text with whatever stopped its evaluation.
#[derive(Debug, Error, Clone)]
#[error("An error occurred while evaluating expression: {expression}")]
pub struct FhirPathError {
    pub expression: String,
    #[source]
    pub cause: FhirPathErrorCause,
}

impl FhirPathError {
    pub fn new(expression: impl Into<String>, cause: impl Into<FhirPathErrorCause>) -> Self {
        Self {
            expression: expression.into(),
            cause: cause.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match &self.cause {
            FhirPathErrorCause::Parse(e) => e.code,
            FhirPathErrorCause::Evaluation(e) => e.code(),
            FhirPathErrorCause::Model(_) => FP0200,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self.cause, FhirPathErrorCause::Parse(_))
    }
}
