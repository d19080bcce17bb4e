//! Errors raised by value operations

use thiserror::Error;

pub type ValueResult<T> = Result<T, ValueError>;

/// Operand combinations an operator is not defined for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    #[error("Operator '{op}' is not defined for {left} and {right}")]
    UnsupportedOperands {
        op: String,
        left: String,
        right: String,
    },

    #[error("Operator '{op}' is not defined for {operand}")]
    UnsupportedOperand { op: String, operand: String },
}

impl ValueError {
    pub fn incomparable(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::Incomparable {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn unsupported(op: &str, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::UnsupportedOperands {
            op: op.to_string(),
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn unsupported_unary(op: &str, operand: impl Into<String>) -> Self {
        Self::UnsupportedOperand {
            op: op.to_string(),
            operand: operand.into(),
        }
    }
}
