//! FHIRPath error codes
//!
//! Error code ranges:
//! - FP0001-FP0099: Parse errors (syntax)
//! - FP0100-FP0199: Semantic errors (unknown names, arity, incompatible types)
//! - FP0200-FP0299: Evaluation issues (terminology, degraded functions)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Short description registered for this code
    pub fn description(&self) -> &'static str {
        ERROR_DESCRIPTIONS.get(&self.0).copied().unwrap_or("Unknown error")
    }

    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_semantic_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP{:04}", self.0)
    }
}

static ERROR_DESCRIPTIONS: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Parse errors
        (1, "Unexpected token"),
        (2, "Unexpected end of input"),
        (3, "Invalid literal"),
        (4, "Invalid string escape sequence"),
        // Semantic errors
        (100, "Unknown function"),
        (101, "Invalid argument count"),
        (102, "Unknown type identifier"),
        (103, "Incompatible operand types"),
        (104, "Singleton expected"),
        (105, "Invalid argument"),
        (106, "Recursion limit exceeded"),
        // Evaluation issues
        (200, "Evaluation failed"),
        (201, "Terminology lookup unavailable"),
        (202, "Terminology lookup failed"),
    ])
});

// Parse errors
pub const FP0001: ErrorCode = ErrorCode::new(1);
pub const FP0002: ErrorCode = ErrorCode::new(2);
pub const FP0003: ErrorCode = ErrorCode::new(3);
pub const FP0004: ErrorCode = ErrorCode::new(4);

// Semantic errors
pub const FP0100: ErrorCode = ErrorCode::new(100);
pub const FP0101: ErrorCode = ErrorCode::new(101);
pub const FP0102: ErrorCode = ErrorCode::new(102);
pub const FP0103: ErrorCode = ErrorCode::new(103);
pub const FP0104: ErrorCode = ErrorCode::new(104);
pub const FP0105: ErrorCode = ErrorCode::new(105);
pub const FP0106: ErrorCode = ErrorCode::new(106);

// Evaluation issues
pub const FP0200: ErrorCode = ErrorCode::new(200);
pub const FP0201: ErrorCode = ErrorCode::new(201);
pub const FP0202: ErrorCode = ErrorCode::new(202);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(FP0001.to_string(), "FP0001");
        assert_eq!(FP0102.to_string(), "FP0102");
    }

    #[test]
    fn test_error_categories() {
        assert!(FP0001.is_parse_error());
        assert!(!FP0001.is_semantic_error());
        assert!(FP0100.is_semantic_error());
        assert!(FP0201.is_evaluation_error());
    }

    #[test]
    fn test_description() {
        assert_eq!(FP0101.description(), "Invalid argument count");
        assert_eq!(ErrorCode::new(999).description(), "Unknown error");
    }
}
