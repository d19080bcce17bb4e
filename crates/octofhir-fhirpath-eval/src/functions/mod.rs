//! Standard function library
//!
//! Functions that only need their input and already-evaluated arguments.
//! Each submodule registers one family:
//!
//! - `existence`: empty, not, count, distinct, allTrue, subsetOf, ...
//! - `subsetting`: first, last, tail, skip, take, single, intersect, exclude, union, combine
//! - `conversion`: toString, toInteger, toDecimal, toBoolean and their convertsTo forms
//! - `strings`: startsWith, substring, matches, replaceMatches, ...
//! - `math`: abs, ceiling, floor, round, truncate, sqrt
//! - `tree`: children, descendants
//! - `utility`: now, today, timeOfDay
//! - `terminology`: memberOf

mod conversion;
mod existence;
mod math;
mod strings;
mod subsetting;
mod terminology;
mod tree;
mod utility;

use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_types::SystemValue;

pub fn register_standard_library(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    let builder = existence::register(builder);
    let builder = subsetting::register(builder);
    let builder = conversion::register(builder);
    let builder = strings::register(builder);
    let builder = math::register(builder);
    let builder = tree::register(builder);
    let builder = utility::register(builder);
    terminology::register(builder)
}

// =============================================================================
// Argument helpers
// =============================================================================

/// Value of a collection that must hold at most one item
///
/// Empty collections and valueless nodes give `None`.
pub fn singleton_value(collection: &Collection) -> EvalResult<Option<&SystemValue>> {
    match collection.len() {
        0 => Ok(None),
        1 => Ok(collection.first().and_then(|node| node.value())),
        n => Err(EvalError::singleton_expected(n)),
    }
}

/// String input of a string function; non-string values are rejected
pub fn string_input<'a>(function: &str, input: &'a Collection) -> EvalResult<Option<&'a str>> {
    match singleton_value(input)? {
        None => Ok(None),
        Some(SystemValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(EvalError::invalid_argument(
            function,
            format!("expected a String input, found {}", other.type_name()),
        )),
    }
}

/// String argument at `index`; `None` when absent or empty
pub fn string_arg<'a>(
    function: &str,
    args: &'a [Collection],
    index: usize,
) -> EvalResult<Option<&'a str>> {
    let Some(arg) = args.get(index) else {
        return Ok(None);
    };
    match singleton_value(arg)? {
        None => Ok(None),
        Some(SystemValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(EvalError::invalid_argument(
            function,
            format!("expected a String argument, found {}", other.type_name()),
        )),
    }
}

/// Integer argument at `index`; `None` when absent or empty
pub fn integer_arg(function: &str, args: &[Collection], index: usize) -> EvalResult<Option<i32>> {
    let Some(arg) = args.get(index) else {
        return Ok(None);
    };
    match singleton_value(arg)? {
        None => Ok(None),
        Some(SystemValue::Integer(i)) => Ok(Some(*i)),
        Some(other) => Err(EvalError::invalid_argument(
            function,
            format!("expected an Integer argument, found {}", other.type_name()),
        )),
    }
}

/// Argument at `index`, or the empty collection
pub fn arg(args: &[Collection], index: usize) -> Collection {
    args.get(index).cloned().unwrap_or_default()
}

pub fn boolean(value: bool) -> Collection {
    Collection::boolean(value)
}
