//! Runtime values of the System namespace

use crate::error::{ValueError, ValueResult};
use crate::quantity::Quantity;
use crate::registry::FhirPathType;
use crate::temporal::{FhirPathDate, FhirPathDateTime, FhirPathTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A primitive value carried by a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SystemValue {
    Boolean(bool),
    Integer(i32),
    Decimal(Decimal),
    String(String),
    Date(FhirPathDate),
    DateTime(FhirPathDateTime),
    Time(FhirPathTime),
    Quantity(Quantity),
}

impl SystemValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Simple System type name (`Integer`, `DateTime`, ...)
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Date(_) => "Date",
            Self::DateTime(_) => "DateTime",
            Self::Time(_) => "Time",
            Self::Quantity(_) => "Quantity",
        }
    }

    pub fn system_type(&self) -> FhirPathType {
        FhirPathType::system(self.type_name())
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Decimal view; integers are promoted
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Self::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::DateTime(_) | Self::Time(_))
    }

    /// Whether ordering comparisons between the two values are defined
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        use SystemValue as V;
        matches!(
            (self, other),
            (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_))
                | (V::String(_), V::String(_))
                | (V::Boolean(_), V::Boolean(_))
                | (V::Date(_) | V::DateTime(_), V::Date(_) | V::DateTime(_))
                | (V::Time(_), V::Time(_))
                | (V::Quantity(_), V::Quantity(_))
        )
    }

    /// Ordering between compatible values
    ///
    /// `Ok(None)` means the values are compatible but not comparable
    /// (differing temporal precision, incommensurable units).
    pub fn compare(&self, other: &Self) -> ValueResult<Option<Ordering>> {
        use SystemValue as V;
        let ordering = match (self, other) {
            (V::Integer(a), V::Integer(b)) => Some(a.cmp(b)),
            (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => Some(a.cmp(&b)),
                    _ => None,
                }
            }
            (V::String(a), V::String(b)) => Some(a.cmp(b)),
            (V::Boolean(a), V::Boolean(b)) => Some(a.cmp(b)),
            (V::Date(a), V::Date(b)) => a.compare(b),
            (V::DateTime(a), V::DateTime(b)) => a.compare(b),
            (V::Date(a), V::DateTime(b)) => FhirPathDateTime::from_date(a).compare(b),
            (V::DateTime(a), V::Date(b)) => a.compare(&FhirPathDateTime::from_date(b)),
            (V::Time(a), V::Time(b)) => a.compare(b),
            (V::Quantity(a), V::Quantity(b)) => a.compare(b),
            _ => {
                return Err(ValueError::incomparable(
                    self.type_name(),
                    other.type_name(),
                ));
            }
        };
        Ok(ordering)
    }

    /// Equality; `None` when the answer is unknown (partial temporal precision)
    pub fn equals(&self, other: &Self) -> Option<bool> {
        if !self.is_compatible_with(other) {
            return Some(false);
        }
        match self.compare(other) {
            Ok(Some(ordering)) => Some(ordering == Ordering::Equal),
            Ok(None) => match (self, other) {
                // Incommensurable units are simply unequal
                (Self::Quantity(_), Self::Quantity(_)) => Some(false),
                _ => None,
            },
            Err(_) => Some(false),
        }
    }

    /// Equivalence: never unknown, strings ignore case and whitespace runs,
    /// decimals compare at the precision of the less precise operand
    pub fn equivalent(&self, other: &Self) -> bool {
        use SystemValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => normalize_string(a) == normalize_string(b),
            (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => {
                        let scale = a.scale().min(b.scale());
                        a.round_dp(scale) == b.round_dp(scale)
                    }
                    _ => false,
                }
            }
            (V::Quantity(a), V::Quantity(b)) => match b.convert_to(&a.unit) {
                Some(b) => {
                    let scale = a.value.scale().min(b.value.scale());
                    a.value.round_dp(scale) == b.value.round_dp(scale)
                }
                None => false,
            },
            _ => self.equals(other).unwrap_or(false),
        }
    }

    /// Parse a FHIRPath number literal: digits with a `.` are decimals
    pub fn parse_number(text: &str) -> Option<Self> {
        if text.contains('.') {
            Decimal::from_str(text).ok().map(Self::Decimal)
        } else {
            match text.parse::<i32>() {
                Ok(i) => Some(Self::Integer(i)),
                Err(_) => Decimal::from_str(text).ok().map(Self::Decimal),
            }
        }
    }
}

fn normalize_string(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl fmt::Display for SystemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::Time(t) => write!(f, "{}", t),
            Self::Quantity(q) => write!(f, "{}", q),
        }
    }
}

impl From<bool> for SystemValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for SystemValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for SystemValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for SystemValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SystemValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Quantity> for SystemValue {
    fn from(value: Quantity) -> Self {
        Self::Quantity(value)
    }
}
