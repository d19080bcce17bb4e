//! Subsetting and combining functions

use super::{arg, integer_arg};
use crate::error::EvalError;
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::Collection;

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("first", 0, 0, |_, input, _| {
            Ok(input.first().cloned().map(Collection::singleton).unwrap_or_default())
        })
        .function("last", 0, 0, |_, input, _| {
            Ok(input.last().cloned().map(Collection::singleton).unwrap_or_default())
        })
        .function("tail", 0, 0, |_, input, _| Ok(input.iter().skip(1).cloned().collect()))
        .function("skip", 1, 1, |_, input, args| {
            let Some(n) = integer_arg("skip", args, 0)? else {
                return Ok(Collection::empty());
            };
            let n = usize::try_from(n).unwrap_or(0);
            Ok(input.iter().skip(n).cloned().collect())
        })
        .function("take", 1, 1, |_, input, args| {
            let Some(n) = integer_arg("take", args, 0)? else {
                return Ok(Collection::empty());
            };
            let n = usize::try_from(n).unwrap_or(0);
            Ok(input.iter().take(n).cloned().collect())
        })
        .function("single", 0, 0, |_, input, _| match input.len() {
            0 | 1 => Ok(input.clone()),
            n => Err(EvalError::singleton_expected(n)),
        })
        .function("intersect", 1, 1, |_, input, args| {
            let other = arg(args, 0);
            let mut out = Collection::empty();
            for node in input.iter() {
                if other.contains(node) && !out.contains(node) {
                    out.push(node.clone());
                }
            }
            Ok(out)
        })
        .function("exclude", 1, 1, |_, input, args| {
            let other = arg(args, 0);
            Ok(input.iter().filter(|n| !other.contains(n)).cloned().collect())
        })
        .function("union", 1, 1, |_, input, args| Ok(input.union(&arg(args, 0))))
        .function("combine", 1, 1, |_, input, args| Ok(input.combine(&arg(args, 0))))
}
