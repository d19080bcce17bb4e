//! Existence functions

use super::{arg, boolean};
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::{Collection, Node};

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("empty", 0, 0, |_, input, _| Ok(boolean(input.is_empty())))
        .function("not", 0, 0, |_, input, _| {
            Ok(match input.as_boolean() {
                Some(b) => boolean(!b),
                None => Collection::empty(),
            })
        })
        .function("count", 0, 0, |_, input, _| {
            let count = i32::try_from(input.len()).unwrap_or(i32::MAX);
            Ok(Collection::from_value(count))
        })
        .function("distinct", 0, 0, |_, input, _| Ok(input.distinct()))
        .function("isDistinct", 0, 0, |_, input, _| {
            Ok(boolean(input.distinct().len() == input.len()))
        })
        .function("allTrue", 0, 0, |_, input, _| {
            Ok(boolean(input.iter().all(|n| is_boolean(n, true))))
        })
        .function("anyTrue", 0, 0, |_, input, _| {
            Ok(boolean(input.iter().any(|n| is_boolean(n, true))))
        })
        .function("allFalse", 0, 0, |_, input, _| {
            Ok(boolean(input.iter().all(|n| is_boolean(n, false))))
        })
        .function("anyFalse", 0, 0, |_, input, _| {
            Ok(boolean(input.iter().any(|n| is_boolean(n, false))))
        })
        .function("hasValue", 0, 0, |_, input, _| {
            Ok(boolean(input.singleton_node().is_some_and(Node::has_value)))
        })
        .function("subsetOf", 1, 1, |_, input, args| {
            Ok(boolean(arg(args, 0).contains_all(input)))
        })
        .function("supersetOf", 1, 1, |_, input, args| {
            Ok(boolean(input.contains_all(&arg(args, 0))))
        })
}

fn is_boolean(node: &Node, expected: bool) -> bool {
    node.value().and_then(|v| v.as_boolean()) == Some(expected)
}
