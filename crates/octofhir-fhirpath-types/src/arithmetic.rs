//! Arithmetic over System values
//!
//! Every operation returns `Err` when the operator is not defined for the
//! operand types, and `Ok(None)` for numeric failures (overflow, division
//! by zero, out-of-range dates) which evaluate to empty.

use crate::error::{ValueError, ValueResult};
use crate::quantity::{CalendarUnit, Quantity};
use crate::temporal::{FhirPathDate, FhirPathDateTime, FhirPathTime, days_in_month};
use crate::value::SystemValue;
use chrono::{Datelike, NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

type Arith = ValueResult<Option<SystemValue>>;

fn unsupported(op: &str, left: &SystemValue, right: &SystemValue) -> ValueError {
    ValueError::unsupported(op, left.type_name(), right.type_name())
}

/// `+`: numbers, string concatenation, quantities, temporal + duration
pub fn add(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(a), V::Integer(b)) => Ok(a.checked_add(*b).map(V::Integer)),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Ok(decimal_op(left, right, Decimal::checked_add))
        }
        (V::String(a), V::String(b)) => Ok(Some(V::String(format!("{}{}", a, b)))),
        (V::Quantity(a), V::Quantity(b)) => Ok(add_quantities(a, b, false)),
        (V::Date(d), V::Quantity(q)) => shift_date(d, q, 1, "+"),
        (V::DateTime(dt), V::Quantity(q)) => shift_datetime(dt, q, 1, "+"),
        (V::Time(t), V::Quantity(q)) => shift_time(t, q, 1, "+"),
        (V::Quantity(_), V::Date(_) | V::DateTime(_) | V::Time(_)) => add(right, left),
        _ => Err(unsupported("+", left, right)),
    }
}

/// `-`: numbers, quantities, temporal - duration
pub fn subtract(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(a), V::Integer(b)) => Ok(a.checked_sub(*b).map(V::Integer)),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Ok(decimal_op(left, right, Decimal::checked_sub))
        }
        (V::Quantity(a), V::Quantity(b)) => Ok(add_quantities(a, b, true)),
        (V::Date(d), V::Quantity(q)) => shift_date(d, q, -1, "-"),
        (V::DateTime(dt), V::Quantity(q)) => shift_datetime(dt, q, -1, "-"),
        (V::Time(t), V::Quantity(q)) => shift_time(t, q, -1, "-"),
        _ => Err(unsupported("-", left, right)),
    }
}

pub fn multiply(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(a), V::Integer(b)) => Ok(a.checked_mul(*b).map(V::Integer)),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Ok(decimal_op(left, right, Decimal::checked_mul))
        }
        (V::Quantity(q), n @ (V::Integer(_) | V::Decimal(_)))
        | (n @ (V::Integer(_) | V::Decimal(_)), V::Quantity(q)) => Ok(n
            .as_decimal()
            .and_then(|n| q.value.checked_mul(n))
            .map(|value| V::Quantity(Quantity::new(value, q.unit.clone())))),
        (V::Quantity(a), V::Quantity(b)) => {
            let unit = match (a.is_unitless(), b.is_unitless()) {
                (true, _) => b.ucum_unit().to_string(),
                (_, true) => a.ucum_unit().to_string(),
                _ => format!("{}.{}", a.ucum_unit(), b.ucum_unit()),
            };
            Ok(a
                .value
                .checked_mul(b.value)
                .map(|value| V::Quantity(Quantity::new(value, unit))))
        }
        _ => Err(unsupported("*", left, right)),
    }
}

/// `/`: always decimal for numbers; division by zero is empty
pub fn divide(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Ok(decimal_op(left, right, Decimal::checked_div))
        }
        (V::Quantity(q), n @ (V::Integer(_) | V::Decimal(_))) => Ok(n
            .as_decimal()
            .and_then(|n| q.value.checked_div(n))
            .map(|value| V::Quantity(Quantity::new(value, q.unit.clone())))),
        (V::Quantity(a), V::Quantity(b)) => {
            let (value, unit) = match b.convert_to(&a.unit) {
                Some(b) => (a.value.checked_div(b.value), "1".to_string()),
                None => (
                    a.value.checked_div(b.value),
                    format!("{}/{}", a.ucum_unit(), b.ucum_unit()),
                ),
            };
            Ok(value.map(|value| V::Quantity(Quantity::new(value, unit))))
        }
        _ => Err(unsupported("/", left, right)),
    }
}

/// `div`: truncated division, yielding an Integer
pub fn truncated_divide(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(a), V::Integer(b)) => Ok(a.checked_div(*b).map(V::Integer)),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            let quotient = decimal_op(left, right, Decimal::checked_div);
            Ok(quotient
                .and_then(|q| q.as_decimal())
                .and_then(|q| q.trunc().to_i32())
                .map(V::Integer))
        }
        _ => Err(unsupported("div", left, right)),
    }
}

/// `mod`: remainder after truncated division
pub fn modulo(left: &SystemValue, right: &SystemValue) -> Arith {
    use SystemValue as V;
    match (left, right) {
        (V::Integer(a), V::Integer(b)) => Ok(a.checked_rem(*b).map(V::Integer)),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Ok(decimal_op(left, right, Decimal::checked_rem))
        }
        _ => Err(unsupported("mod", left, right)),
    }
}

/// Unary minus
pub fn negate(value: &SystemValue) -> Arith {
    use SystemValue as V;
    match value {
        V::Integer(i) => Ok(i.checked_neg().map(V::Integer)),
        V::Decimal(d) => Ok(Some(V::Decimal(-*d))),
        V::Quantity(q) => Ok(Some(V::Quantity(Quantity::new(-q.value, q.unit.clone())))),
        _ => Err(ValueError::unsupported_unary("-", value.type_name())),
    }
}

fn decimal_op(
    left: &SystemValue,
    right: &SystemValue,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> Option<SystemValue> {
    let (a, b) = (left.as_decimal()?, right.as_decimal()?);
    op(a, b).map(SystemValue::Decimal)
}

/// Sum or difference in the left operand's unit; incommensurable units are empty
fn add_quantities(a: &Quantity, b: &Quantity, subtract: bool) -> Option<SystemValue> {
    let b = b.convert_to(&a.unit)?;
    let value = if subtract {
        a.value.checked_sub(b.value)?
    } else {
        a.value.checked_add(b.value)?
    };
    Some(SystemValue::Quantity(Quantity::new(value, a.unit.clone())))
}

// ============================================================================
// Temporal arithmetic
// ============================================================================

/// Calendar unit and signed whole amount; `None` when the amount does not fit an i64
fn duration_parts(
    q: &Quantity,
    sign: i64,
    op: &str,
    target: &str,
) -> ValueResult<Option<(CalendarUnit, i64)>> {
    let unit = q.calendar_unit().ok_or_else(|| {
        ValueError::unsupported(op, target, format!("Quantity '{}'", q.unit))
    })?;
    let value = if sign < 0 { -q.value } else { q.value };
    // Fractional amounts are truncated
    Ok(value.trunc().to_i64().map(|amount| (unit, amount)))
}

fn valid_year(year: i32) -> bool {
    (1..=9999).contains(&year)
}

/// Shift a year/month pair by whole months
fn shift_months(year: i32, month: u8, months: i64) -> Option<(i32, u8)> {
    let total = (year as i64 * 12 + month as i64 - 1).checked_add(months)?;
    let new_year = i32::try_from(total.div_euclid(12)).ok()?;
    let new_month = (total.rem_euclid(12) + 1) as u8;
    Some((new_year, new_month))
}

fn shift_date(date: &FhirPathDate, q: &Quantity, sign: i64, op: &str) -> Arith {
    let Some((unit, amount)) = duration_parts(q, sign, op, "Date")? else {
        return Ok(None);
    };
    let result = match unit {
        CalendarUnit::Year => {
            let year = (date.year as i64)
                .checked_add(amount)
                .and_then(|year| i32::try_from(year).ok());
            year.map(|year| {
                let day = match (date.month, date.day) {
                    (Some(m), Some(d)) => Some(d.min(days_in_month(year, m))),
                    _ => date.day,
                };
                FhirPathDate {
                    year,
                    month: date.month,
                    day,
                }
            })
        }
        CalendarUnit::Month => match date.month {
            Some(month) => shift_months(date.year, month, amount).map(|(year, month)| FhirPathDate {
                year,
                month: Some(month),
                day: date.day.map(|d| d.min(days_in_month(year, month))),
            }),
            None => i32::try_from(date.year as i64 + amount / 12)
                .ok()
                .map(FhirPathDate::year_only),
        },
        CalendarUnit::Week | CalendarUnit::Day => {
            let days = if unit == CalendarUnit::Week {
                amount.checked_mul(7)
            } else {
                Some(amount)
            };
            let Some(days) = days else {
                return Ok(None);
            };
            match date.to_naive_date() {
                Some(naive) => TimeDelta::try_days(days)
                    .and_then(|delta| naive.checked_add_signed(delta))
                    .map(FhirPathDate::from_naive),
                None => match date.month {
                    Some(month) => shift_months(date.year, month, days / 30)
                        .map(|(year, month)| FhirPathDate::year_month(year, month)),
                    None => i32::try_from(date.year as i64 + days / 365)
                        .ok()
                        .map(FhirPathDate::year_only),
                },
            }
        }
        CalendarUnit::Hour => match date.to_naive_date() {
            Some(naive) => TimeDelta::try_days(amount / 24)
                .and_then(|delta| naive.checked_add_signed(delta))
                .map(FhirPathDate::from_naive),
            None => Some(date.clone()),
        },
        CalendarUnit::Minute | CalendarUnit::Second | CalendarUnit::Millisecond => {
            Some(date.clone())
        }
    };
    Ok(result
        .filter(|d| valid_year(d.year))
        .map(SystemValue::Date))
}

fn shift_datetime(dt: &FhirPathDateTime, q: &Quantity, sign: i64, op: &str) -> Arith {
    let Some((unit, amount)) = duration_parts(q, sign, op, "DateTime")? else {
        return Ok(None);
    };
    let Some(naive) = dt.to_naive_low() else {
        return Ok(None);
    };

    let shifted = match unit {
        CalendarUnit::Year | CalendarUnit::Month => {
            let months = if unit == CalendarUnit::Year {
                amount.checked_mul(12)
            } else {
                Some(amount)
            };
            // Without month precision only whole years apply
            let months = months.map(|m| if dt.month.is_none() { (m / 12) * 12 } else { m });
            months
                .and_then(|months| add_months(naive.date(), months))
                .map(|date| date.and_time(naive.time()))
        }
        CalendarUnit::Week => TimeDelta::try_weeks(amount).and_then(|d| naive.checked_add_signed(d)),
        CalendarUnit::Day => TimeDelta::try_days(amount).and_then(|d| naive.checked_add_signed(d)),
        CalendarUnit::Hour => TimeDelta::try_hours(amount).and_then(|d| naive.checked_add_signed(d)),
        CalendarUnit::Minute => {
            TimeDelta::try_minutes(amount).and_then(|d| naive.checked_add_signed(d))
        }
        CalendarUnit::Second => {
            TimeDelta::try_seconds(amount).and_then(|d| naive.checked_add_signed(d))
        }
        CalendarUnit::Millisecond => {
            TimeDelta::try_milliseconds(amount).and_then(|d| naive.checked_add_signed(d))
        }
    };

    Ok(shifted
        .filter(|ts| valid_year(ts.year()))
        .map(|ts| SystemValue::DateTime(dt.with_naive(ts))))
}

/// Add whole months, clamping the day to the end of the target month
fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let (year, month) = shift_months(date.year(), date.month() as u8, months)?;
    let day = (date.day() as u8).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn shift_time(time: &FhirPathTime, q: &Quantity, sign: i64, op: &str) -> Arith {
    let Some((unit, amount)) = duration_parts(q, sign, op, "Time")? else {
        return Ok(None);
    };
    // Reduced modulo one day first, so the shift never overflows
    let delta_ms = match unit {
        CalendarUnit::Hour => amount.rem_euclid(24) * 3_600_000,
        CalendarUnit::Minute => amount.rem_euclid(1440) * 60_000,
        CalendarUnit::Second => amount.rem_euclid(86_400) * 1000,
        CalendarUnit::Millisecond => amount.rem_euclid(86_400_000),
        _ => return Err(ValueError::unsupported(op, "Time", format!("Quantity '{}'", q.unit))),
    };

    // Wraps around midnight
    let ms = (time.to_milliseconds() + delta_ms).rem_euclid(86_400_000);
    Ok(Some(SystemValue::Time(FhirPathTime {
        hour: (ms / 3_600_000) as u8,
        minute: time.minute.map(|_| ((ms / 60_000) % 60) as u8),
        second: time.second.map(|_| ((ms / 1000) % 60) as u8),
        millisecond: time.millisecond.map(|_| (ms % 1000) as u16),
    })))
}
