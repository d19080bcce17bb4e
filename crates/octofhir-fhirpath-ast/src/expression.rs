//! Expression nodes

use crate::{BinaryOp, BoxExpr, Literal, PolarityOp, TypeOp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A FHIRPath expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    /// `%name`; the name is stored without the `%` and without delimiters
    ExternalConstant(String),
    /// An invocation in term position, evaluated against the current context
    Invocation(Invocation),
    /// `target.invocation`
    Path {
        target: BoxExpr,
        invocation: Invocation,
    },
    /// `collection[index]`
    Indexer { collection: BoxExpr, index: BoxExpr },
    /// `+operand` / `-operand`
    Polarity { op: PolarityOp, operand: BoxExpr },
    Binary {
        left: BoxExpr,
        op: BinaryOp,
        right: BoxExpr,
    },
    /// `operand is Type` / `operand as Type`
    Type {
        operand: BoxExpr,
        op: TypeOp,
        type_specifier: QualifiedIdentifier,
    },
}

/// Member access, function call or one of the special variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Invocation {
    Member(Identifier),
    Function(FunctionCall),
    /// `$this`
    This,
    /// `$index`
    Index,
    /// `$total`
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: Identifier,
    pub args: Vec<Expression>,
}

/// An identifier token, plain or backtick-delimited
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Raw token text, delimiters included
    pub text: String,
}

impl Identifier {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_delimited(&self) -> bool {
        self.text.len() >= 2 && self.text.starts_with('`') && self.text.ends_with('`')
    }

    /// Identifier name with backtick delimiters removed
    pub fn unquoted(&self) -> &str {
        if self.is_delimited() {
            &self.text[1..self.text.len() - 1]
        } else {
            &self.text
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A possibly namespace-qualified type name (`System.String`, `Patient`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedIdentifier {
    pub parts: Vec<Identifier>,
}

impl QualifiedIdentifier {
    pub fn new(parts: Vec<Identifier>) -> Self {
        Self { parts }
    }

    /// Dotted form with delimiters removed, e.g. `FHIR.Patient`
    pub fn unquoted(&self) -> String {
        self.parts
            .iter()
            .map(Identifier::unquoted)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<&str> for QualifiedIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s.split('.').map(Identifier::new).collect())
    }
}

impl Expression {
    pub fn literal(literal: Literal) -> Self {
        Self::Literal(literal)
    }

    pub fn member(name: impl Into<String>) -> Self {
        Self::Invocation(Invocation::Member(Identifier::new(name)))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Invocation(Invocation::Function(FunctionCall {
            name: Identifier::new(name),
            args,
        }))
    }

    pub fn path(target: Expression, invocation: Invocation) -> Self {
        Self::Path {
            target: Box::new(target),
            invocation,
        }
    }

    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Short label of the node kind, used in trace logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "Literal",
            Self::ExternalConstant(_) => "ExternalConstant",
            Self::Invocation(_) => "Invocation",
            Self::Path { .. } => "Path",
            Self::Indexer { .. } => "Indexer",
            Self::Polarity { .. } => "Polarity",
            Self::Binary { .. } => "Binary",
            Self::Type { .. } => "Type",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for QualifiedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(id) => write!(f, "{}", id),
            Self::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Self::This => f.write_str("$this"),
            Self::Index => f.write_str("$index"),
            Self::Total => f.write_str("$total"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => f.write_str(&lit.text),
            Self::ExternalConstant(name) => write!(f, "%{}", name),
            Self::Invocation(inv) => write!(f, "{}", inv),
            Self::Path { target, invocation } => write!(f, "{}.{}", target, invocation),
            Self::Indexer { collection, index } => write!(f, "{}[{}]", collection, index),
            Self::Polarity { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Self::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Self::Type {
                operand,
                op,
                type_specifier,
            } => write!(f, "({} {} {})", operand, op.symbol(), type_specifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier_unquoted() {
        assert_eq!(Identifier::new("given").unquoted(), "given");
        assert_eq!(Identifier::new("`div`").unquoted(), "div");
        assert!(!Identifier::new("`").is_delimited());
    }

    #[test]
    fn test_qualified_identifier() {
        let q = QualifiedIdentifier::from("FHIR.`Patient`");
        assert_eq!(q.unquoted(), "FHIR.Patient");
        assert_eq!(q.to_string(), "FHIR.`Patient`");
    }

    #[test]
    fn test_display_roundtrip_shape() {
        let expr = Expression::path(
            Expression::member("Patient"),
            Invocation::Function(FunctionCall {
                name: Identifier::new("where"),
                args: vec![Expression::binary(
                    Expression::member("active"),
                    BinaryOp::Equal,
                    Expression::Literal(Literal::boolean(true)),
                )],
            }),
        );
        assert_eq!(expr.to_string(), "Patient.where((active = true))");
    }
}
