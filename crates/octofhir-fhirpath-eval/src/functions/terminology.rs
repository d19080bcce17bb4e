//! `memberOf(valueSet)`

use super::string_arg;
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_diagnostics::{Diagnostic, FP0201, FP0202};
use octofhir_fhirpath_model::{Collection, Node};
use octofhir_fhirpath_types::SystemValue;

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder.function("memberOf", 1, 1, member_of)
}

fn member_of(
    ctx: &mut EvaluationContext,
    input: &Collection,
    args: &[Collection],
) -> EvalResult<Collection> {
    let node = match input.len() {
        0 => return Ok(Collection::empty()),
        1 => input.first().cloned(),
        n => return Err(EvalError::singleton_expected(n)),
    };
    let Some(value_set) = string_arg("memberOf", args, 0)? else {
        return Ok(Collection::empty());
    };
    let codes = node.as_ref().map(codes_of).unwrap_or_default();
    if codes.is_empty() {
        return Ok(Collection::empty());
    }

    let Some(service) = ctx.terminology().cloned() else {
        log::warn!("memberOf({}) called without a terminology service", value_set);
        ctx.add_issue(
            Diagnostic::warning(FP0201, "No terminology service is configured")
                .with_expression(format!("memberOf('{}')", value_set)),
        );
        return Ok(Collection::empty());
    };

    for (system, code) in &codes {
        match service.validate_code(system.as_deref(), code, value_set) {
            Ok(true) => return Ok(Collection::boolean(true)),
            Ok(false) => {}
            Err(e) => {
                log::warn!("memberOf({}) failed: {}", value_set, e);
                ctx.add_issue(
                    Diagnostic::warning(FP0202, e.to_string())
                        .with_expression(format!("memberOf('{}')", value_set)),
                );
                return Ok(Collection::empty());
            }
        }
    }
    Ok(Collection::boolean(false))
}

/// `(system, code)` pairs carried by a code, Coding or CodeableConcept node
fn codes_of(node: &Node) -> Vec<(Option<String>, String)> {
    match node.node_type().name() {
        "Coding" => coding(node).into_iter().collect(),
        "CodeableConcept" => node.children_named("coding").filter_map(coding).collect(),
        _ => match node.value() {
            Some(SystemValue::String(code)) => vec![(None, code.clone())],
            _ => Vec::new(),
        },
    }
}

fn coding(node: &Node) -> Option<(Option<String>, String)> {
    let text = |name: &str| {
        node.children_named(name)
            .next()
            .and_then(Node::value)
            .and_then(SystemValue::as_str)
            .map(str::to_string)
    };
    let code = text("code")?;
    Some((text("system"), code))
}
