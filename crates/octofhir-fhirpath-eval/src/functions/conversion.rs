//! Conversion functions

use super::singleton_value;
use crate::error::EvalResult;
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_types::SystemValue;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static INTEGER_TEXT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").ok());
static DECIMAL_TEXT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").ok());

type Converter = fn(&SystemValue) -> Option<SystemValue>;

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    let conversions: [(&str, &str, Converter); 4] = [
        ("toString", "convertsToString", to_string),
        ("toInteger", "convertsToInteger", to_integer),
        ("toDecimal", "convertsToDecimal", to_decimal),
        ("toBoolean", "convertsToBoolean", to_boolean),
    ];
    conversions
        .into_iter()
        .fold(builder, |builder, (to, converts_to, convert)| {
            builder
                .function(to, 0, 0, move |_, input, _| {
                    Ok(converted(input, convert)?
                        .map(Collection::from_value)
                        .unwrap_or_default())
                })
                .function(converts_to, 0, 0, move |_, input, _| {
                    if input.is_empty() {
                        return Ok(Collection::empty());
                    }
                    Ok(Collection::boolean(converted(input, convert)?.is_some()))
                })
        })
}

fn converted(input: &Collection, convert: Converter) -> EvalResult<Option<SystemValue>> {
    Ok(singleton_value(input)?.and_then(convert))
}

fn to_string(value: &SystemValue) -> Option<SystemValue> {
    Some(SystemValue::String(value.to_string()))
}

fn to_integer(value: &SystemValue) -> Option<SystemValue> {
    match value {
        SystemValue::Integer(_) => Some(value.clone()),
        SystemValue::Boolean(b) => Some(SystemValue::Integer(i32::from(*b))),
        SystemValue::String(s) if matches_text(&INTEGER_TEXT, s) => {
            s.parse::<i32>().ok().map(SystemValue::Integer)
        }
        _ => None,
    }
}

fn to_decimal(value: &SystemValue) -> Option<SystemValue> {
    match value {
        SystemValue::Integer(_) | SystemValue::Decimal(_) => {
            value.as_decimal().map(SystemValue::Decimal)
        }
        SystemValue::Boolean(b) => Some(SystemValue::Decimal(if *b {
            Decimal::ONE
        } else {
            Decimal::ZERO
        })),
        SystemValue::String(s) if matches_text(&DECIMAL_TEXT, s) => {
            Decimal::from_str(s).ok().map(SystemValue::Decimal)
        }
        _ => None,
    }
}

fn to_boolean(value: &SystemValue) -> Option<SystemValue> {
    let b = match value {
        SystemValue::Boolean(b) => Some(*b),
        SystemValue::Integer(1) => Some(true),
        SystemValue::Integer(0) => Some(false),
        SystemValue::Decimal(d) if *d == Decimal::ONE => Some(true),
        SystemValue::Decimal(d) if d.is_zero() => Some(false),
        SystemValue::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    b.map(SystemValue::Boolean)
}

fn matches_text(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}
