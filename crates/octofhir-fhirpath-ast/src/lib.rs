//! FHIRPath abstract syntax tree
//!
//! A tagged-union expression tree. Each variant carries only what its
//! evaluation needs; literal and identifier nodes keep their exact source
//! text so the evaluator can memoize them by text.

mod expression;
mod literal;
mod operator;

pub use expression::*;
pub use literal::*;
pub use operator::*;

/// Type alias for boxed expressions
pub type BoxExpr = Box<Expression>;
