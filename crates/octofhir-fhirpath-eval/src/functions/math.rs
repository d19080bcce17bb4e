//! Math functions

use super::{integer_arg, singleton_value};
use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_types::{Quantity, SystemValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("abs", 0, 0, |_, input, _| {
            numeric("abs", input, |value| match value {
                SystemValue::Integer(i) => i.checked_abs().map(SystemValue::Integer),
                SystemValue::Decimal(d) => Some(SystemValue::Decimal(d.abs())),
                SystemValue::Quantity(q) => {
                    Some(SystemValue::Quantity(Quantity::new(q.value.abs(), q.unit.clone())))
                }
                _ => None,
            })
        })
        .function("ceiling", 0, 0, |_, input, _| {
            decimal_to_integer("ceiling", input, Decimal::ceil)
        })
        .function("floor", 0, 0, |_, input, _| {
            decimal_to_integer("floor", input, Decimal::floor)
        })
        .function("truncate", 0, 0, |_, input, _| {
            decimal_to_integer("truncate", input, Decimal::trunc)
        })
        .function("round", 0, 1, |_, input, args| {
            let precision = integer_arg("round", args, 0)?.unwrap_or(0);
            let Ok(precision) = u32::try_from(precision) else {
                return Err(EvalError::invalid_argument(
                    "round",
                    "precision must not be negative",
                ));
            };
            numeric("round", input, |value| {
                value
                    .as_decimal()
                    .map(|d| SystemValue::Decimal(d.round_dp(precision)))
            })
        })
        .function("sqrt", 0, 0, |_, input, _| {
            numeric("sqrt", input, |value| {
                let f = value.as_decimal()?.to_f64()?;
                if f < 0.0 {
                    return None;
                }
                Decimal::from_f64(f.sqrt()).map(SystemValue::Decimal)
            })
        })
}

/// Apply `f` to a numeric singleton; empty input or a numeric failure is empty
fn numeric(
    function: &str,
    input: &Collection,
    f: impl FnOnce(&SystemValue) -> Option<SystemValue>,
) -> EvalResult<Collection> {
    match singleton_value(input)? {
        None => Ok(Collection::empty()),
        Some(value @ (SystemValue::Integer(_) | SystemValue::Decimal(_) | SystemValue::Quantity(_))) => {
            Ok(f(value).map(Collection::from_value).unwrap_or_default())
        }
        Some(other) => Err(EvalError::invalid_argument(
            function,
            format!("expected a number, found {}", other.type_name()),
        )),
    }
}

fn decimal_to_integer(
    function: &str,
    input: &Collection,
    f: fn(&Decimal) -> Decimal,
) -> EvalResult<Collection> {
    numeric(function, input, |value| {
        let d = value.as_decimal()?;
        f(&d).to_i32().map(SystemValue::Integer)
    })
}
