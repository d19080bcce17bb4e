//! FHIRPath operators with precedence information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Precedence 1 (lowest) - right-associative
    Implies,

    // Precedence 2
    Or,
    Xor,

    // Precedence 3
    And,

    // Precedence 4
    /// Membership test (element in collection)
    In,
    /// Containment test (collection contains element)
    Contains,

    // Precedence 5
    Equal,
    NotEqual,
    Equivalent,
    NotEquivalent,

    // Precedence 6
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,

    // Precedence 7
    /// Union of collections (`|`)
    Union,

    // Precedence 9 (8 is the `is`/`as` type expression)
    Add,
    Subtract,
    /// String concatenation (`&`)
    Concatenate,

    // Precedence 10
    Multiply,
    Divide,
    /// Truncated integer division (`div`)
    Div,
    Mod,
}

/// Operator families the evaluator dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Implies,
    OrXor,
    And,
    Membership,
    Equality,
    Inequality,
    Union,
    Additive,
    Multiplicative,
}

impl BinaryOp {
    /// Precedence level, higher binds tighter
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Implies => 1,
            Self::Or | Self::Xor => 2,
            Self::And => 3,
            Self::In | Self::Contains => 4,
            Self::Equal | Self::NotEqual | Self::Equivalent | Self::NotEquivalent => 5,
            Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual => 6,
            Self::Union => 7,
            Self::Add | Self::Subtract | Self::Concatenate => 9,
            Self::Multiply | Self::Divide | Self::Div | Self::Mod => 10,
        }
    }

    pub const fn is_right_associative(&self) -> bool {
        matches!(self, Self::Implies)
    }

    pub const fn category(&self) -> OperatorCategory {
        match self {
            Self::Implies => OperatorCategory::Implies,
            Self::Or | Self::Xor => OperatorCategory::OrXor,
            Self::And => OperatorCategory::And,
            Self::In | Self::Contains => OperatorCategory::Membership,
            Self::Equal | Self::NotEqual | Self::Equivalent | Self::NotEquivalent => {
                OperatorCategory::Equality
            }
            Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual => {
                OperatorCategory::Inequality
            }
            Self::Union => OperatorCategory::Union,
            Self::Add | Self::Subtract | Self::Concatenate => OperatorCategory::Additive,
            Self::Multiply | Self::Divide | Self::Div | Self::Mod => {
                OperatorCategory::Multiplicative
            }
        }
    }

    /// Source symbol of the operator
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Implies => "implies",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::And => "and",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Equivalent => "~",
            Self::NotEquivalent => "!~",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Union => "|",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Concatenate => "&",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix sign operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolarityOp {
    Plus,
    Minus,
}

impl PolarityOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

/// Type operators (`is`, `as`), precedence 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeOp {
    Is,
    As,
}

impl TypeOp {
    pub const PRECEDENCE: u8 = 8;

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::As => "as",
        }
    }
}
