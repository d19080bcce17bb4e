//! Tree navigation functions

use crate::registry::FunctionRegistryBuilder;
use octofhir_fhirpath_model::Collection;

pub(super) fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function("children", 0, 0, |_, input, _| {
            Ok(input
                .iter()
                .flat_map(|node| node.children().iter().cloned())
                .collect::<Collection>())
        })
        .function("descendants", 0, 0, |_, input, _| {
            Ok(input
                .iter()
                .flat_map(|node| node.descendants())
                .collect::<Collection>())
        })
}
