//! String functions
//!
//! All of them take a singleton String input; an empty input or an empty
//! argument gives an empty result. Indices count characters, not bytes.

use super::{integer_arg, string_arg, string_input};
use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::{Collection, Node};
use regex::Regex;

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("startsWith", 1, 1, |_, input, args| {
            with_string_arg("startsWith", input, args, |s, prefix| {
                Collection::boolean(s.starts_with(prefix))
            })
        })
        .function("endsWith", 1, 1, |_, input, args| {
            with_string_arg("endsWith", input, args, |s, suffix| {
                Collection::boolean(s.ends_with(suffix))
            })
        })
        .function("contains", 1, 1, |_, input, args| {
            with_string_arg("contains", input, args, |s, part| {
                Collection::boolean(s.contains(part))
            })
        })
        .function("indexOf", 1, 1, |_, input, args| {
            with_string_arg("indexOf", input, args, |s, part| {
                let index = s
                    .find(part)
                    .map(|byte| char_count(&s[..byte]))
                    .unwrap_or(-1);
                Collection::from_value(index)
            })
        })
        .function("substring", 1, 2, |_, input, args| {
            let Some(s) = string_input("substring", input)? else {
                return Ok(Collection::empty());
            };
            let Some(start) = integer_arg("substring", args, 0)? else {
                return Ok(Collection::empty());
            };
            let len = s.chars().count();
            let Ok(start) = usize::try_from(start) else {
                return Ok(Collection::empty());
            };
            if start >= len {
                return Ok(Collection::empty());
            }
            let take = match integer_arg("substring", args, 1)? {
                Some(n) => usize::try_from(n).unwrap_or(0),
                None => len,
            };
            let out: String = s.chars().skip(start).take(take).collect();
            Ok(Collection::from_value(out))
        })
        .function("upper", 0, 0, |_, input, _| {
            map_string("upper", input, |s| Collection::from_value(s.to_uppercase()))
        })
        .function("lower", 0, 0, |_, input, _| {
            map_string("lower", input, |s| Collection::from_value(s.to_lowercase()))
        })
        .function("length", 0, 0, |_, input, _| {
            map_string("length", input, |s| Collection::from_value(char_count(s)))
        })
        .function("toChars", 0, 0, |_, input, _| {
            map_string("toChars", input, |s| {
                s.chars().map(|c| Node::from_value(c.to_string())).collect()
            })
        })
        .function("replace", 2, 2, |_, input, args| {
            let Some(s) = string_input("replace", input)? else {
                return Ok(Collection::empty());
            };
            let (Some(pattern), Some(substitution)) =
                (string_arg("replace", args, 0)?, string_arg("replace", args, 1)?)
            else {
                return Ok(Collection::empty());
            };
            Ok(Collection::from_value(s.replace(pattern, substitution)))
        })
        .function("matches", 1, 1, |_, input, args| {
            let Some(s) = string_input("matches", input)? else {
                return Ok(Collection::empty());
            };
            let Some(pattern) = string_arg("matches", args, 0)? else {
                return Ok(Collection::empty());
            };
            Ok(Collection::boolean(compile("matches", pattern)?.is_match(s)))
        })
        .function("replaceMatches", 2, 2, |_, input, args| {
            let Some(s) = string_input("replaceMatches", input)? else {
                return Ok(Collection::empty());
            };
            let (Some(pattern), Some(substitution)) = (
                string_arg("replaceMatches", args, 0)?,
                string_arg("replaceMatches", args, 1)?,
            ) else {
                return Ok(Collection::empty());
            };
            let re = compile("replaceMatches", pattern)?;
            Ok(Collection::from_value(
                re.replace_all(s, substitution).into_owned(),
            ))
        })
}

fn map_string(
    function: &str,
    input: &Collection,
    f: impl FnOnce(&str) -> Collection,
) -> EvalResult<Collection> {
    Ok(string_input(function, input)?.map(f).unwrap_or_default())
}

fn with_string_arg(
    function: &str,
    input: &Collection,
    args: &[Collection],
    f: impl FnOnce(&str, &str) -> Collection,
) -> EvalResult<Collection> {
    match (string_input(function, input)?, string_arg(function, args, 0)?) {
        (Some(s), Some(a)) => Ok(f(s, a)),
        _ => Ok(Collection::empty()),
    }
}

fn compile(function: &str, pattern: &str) -> EvalResult<Regex> {
    Regex::new(pattern).map_err(|e| EvalError::invalid_argument(function, e.to_string()))
}

fn char_count(s: &str) -> i32 {
    i32::try_from(s.chars().count()).unwrap_or(i32::MAX)
}
