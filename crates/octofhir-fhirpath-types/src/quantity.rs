//! Quantities with UCUM units and calendar durations

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Calendar duration units usable in date/time arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl CalendarUnit {
    /// Parse a calendar keyword or the equivalent UCUM code
    pub fn from_unit(s: &str) -> Option<Self> {
        match s {
            "year" | "years" | "a" => Some(Self::Year),
            "month" | "months" | "mo" => Some(Self::Month),
            "week" | "weeks" | "wk" => Some(Self::Week),
            "day" | "days" | "d" => Some(Self::Day),
            "hour" | "hours" | "h" => Some(Self::Hour),
            "minute" | "minutes" | "min" => Some(Self::Minute),
            "second" | "seconds" | "s" => Some(Self::Second),
            "millisecond" | "milliseconds" | "ms" => Some(Self::Millisecond),
            _ => None,
        }
    }

    pub const fn ucum_code(&self) -> &'static str {
        match self {
            Self::Year => "a",
            Self::Month => "mo",
            Self::Week => "wk",
            Self::Day => "d",
            Self::Hour => "h",
            Self::Minute => "min",
            Self::Second => "s",
            Self::Millisecond => "ms",
        }
    }
}

/// A decimal value with a unit; `1` is the unitless unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity {
    pub value: Decimal,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        Self {
            value,
            unit: if unit.is_empty() { "1".to_string() } else { unit },
        }
    }

    pub fn unitless(value: Decimal) -> Self {
        Self::new(value, "1")
    }

    pub fn is_unitless(&self) -> bool {
        self.unit == "1"
    }

    pub fn calendar_unit(&self) -> Option<CalendarUnit> {
        CalendarUnit::from_unit(&self.unit)
    }

    /// Unit code with calendar keywords mapped to UCUM
    pub fn ucum_unit(&self) -> &str {
        match self.calendar_unit() {
            Some(unit) => unit.ucum_code(),
            None => &self.unit,
        }
    }

    /// Express this quantity in `unit`, when the units are commensurable
    pub fn convert_to(&self, unit: &str) -> Option<Quantity> {
        if self.unit == unit {
            return Some(self.clone());
        }
        let from = self.ucum_unit();
        let target = CalendarUnit::from_unit(unit).map_or(unit, |u| u.ucum_code());
        if from == target {
            return Some(Quantity::new(self.value, unit));
        }
        if !matches!(octofhir_ucum::is_comparable(from, target), Ok(true)) {
            return None;
        }
        let from_factor = octofhir_ucum::get_canonical_units(from).ok()?.factor;
        let to_factor = octofhir_ucum::get_canonical_units(target).ok()?.factor;
        if to_factor == 0.0 {
            return None;
        }
        let scaled = self.value.to_f64()? * from_factor / to_factor;
        let value = Decimal::from_f64(scaled)?.normalize();
        Some(Quantity::new(value, unit))
    }

    /// Ordering after unit conversion; `None` for incommensurable units
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.unit == other.unit || self.ucum_unit() == other.ucum_unit() {
            return Some(self.value.cmp(&other.value));
        }
        let converted = other.convert_to(&self.unit)?;
        Some(self.value.cmp(&converted.value))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.calendar_unit() {
            // Calendar keywords are written bare, UCUM codes quoted
            Some(unit) if unit.ucum_code() != self.unit => write!(f, "{} {}", self.value, self.unit),
            _ => write!(f, "{} '{}'", self.value, self.unit),
        }
    }
}
